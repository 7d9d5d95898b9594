//! ace-check
//!
//! Checks the accessibility of an EPUB with Ace by DAISY and lists the
//! findings with the source line each one points at.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ace_check::ace::{self, AceRunner};
use ace_check::config::Config;
use ace_check::dom::{self, AnnotatedDocument};
use ace_check::epub::EpubArchive;
use ace_check::locate::attach_lines;
use ace_check::navigate::{jump_to_location, EditorNavigator};
use ace_check::output::{LocateView, OutputFormat, OutputWriter, ReportView};
use ace_check::report::{self, AceReport, Impact, ReportRow};
use ace_check::AppError;

/// Run Ace by DAISY and map its findings back to source lines.
#[derive(Parser, Debug)]
#[command(name = "ace-check", version, about, long_about = None)]
struct Cli {
    /// Override log filter (e.g. `debug`, `ace_check=trace`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run Ace against an EPUB and list its findings.
    Check(CheckArgs),

    /// List the findings of an existing report.json.
    Show(ShowArgs),

    /// Resolve a CFI to a line in an XHTML file.
    Locate(LocateArgs),
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Hide findings below this impact (critical, serious, moderate, minor).
    #[arg(long)]
    min_impact: Option<Impact>,

    /// Most severe findings first.
    #[arg(long)]
    sort: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// EPUB file to check.
    epub: PathBuf,

    /// Folder the `report/` directory is written into.
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Don't open the HTML report in the browser.
    #[arg(long)]
    no_open: bool,

    /// Save the full Ace log next to the report.
    #[arg(long)]
    debug: bool,

    /// How many times a failed Ace run is retried.
    #[arg(long)]
    reruns: Option<u32>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Path to report.json.
    report: PathBuf,

    /// EPUB the report was made from, used to look up source lines.
    #[arg(long)]
    epub: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct LocateArgs {
    /// XHTML content document.
    file: PathBuf,

    /// CFI path, e.g. `/4/2[intro]/6` or `epubcfi(/6/4!/4/2)`.
    cfi: String,

    /// Open the configured editor at the line.
    #[arg(long)]
    open: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = cli
        .log_level
        .as_deref()
        .map(tracing_subscriber::EnvFilter::new)
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| "ace_check=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::Check(args) => check(config, args, &writer),
        Commands::Show(args) => show(args, &writer),
        Commands::Locate(args) => locate(config, args, &writer),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            let code = e
                .downcast_ref::<AppError>()
                .map(AppError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn check(mut config: Config, args: CheckArgs, writer: &OutputWriter) -> anyhow::Result<()> {
    if let Some(dir) = args.report_dir {
        config.report_dir = dir;
    }
    if let Some(reruns) = args.reruns {
        config.reruns = reruns;
    }
    config.open_report &= !args.no_open;
    config.debug_mode |= args.debug;
    config.validate()?;

    let runner = AceRunner::from_config(&config);
    let run = runner.run(&args.epub, &config.report_folder())?;

    let report = AceReport::from_path(run.report_json())
        .with_context(|| format!("reading {}", run.report_json().display()))?;
    let rows = collect_rows(&report, Some(&args.epub), &args.filter);

    let mut view = ReportView::new(report.title().map(str::to_string), report.outcome(), rows);

    if config.open_report {
        tracing::info!("The report will open in your default browser");
        if let Err(e) = ace::open_report(&run) {
            tracing::warn!(error = %e, url = %run.report_url(), "Could not open the report");
            view = view.with_report_folder(run.report_folder.display().to_string());
        }
    } else {
        view = view.with_report_folder(run.report_folder.display().to_string());
    }

    writer.render(&view)?;
    Ok(())
}

fn show(args: ShowArgs, writer: &OutputWriter) -> anyhow::Result<()> {
    let report = AceReport::from_path(&args.report)
        .with_context(|| format!("reading {}", args.report.display()))?;
    let rows = collect_rows(&report, args.epub.as_deref(), &args.filter);

    let view = ReportView::new(report.title().map(str::to_string), report.outcome(), rows);
    writer.render(&view)?;
    Ok(())
}

fn collect_rows(report: &AceReport, epub: Option<&Path>, filter: &FilterArgs) -> Vec<ReportRow> {
    let mut rows = report::flatten(report);

    if let Some(epub) = epub {
        match EpubArchive::open(epub) {
            Ok(mut archive) => {
                attach_lines(&mut archive, &mut rows);
            }
            Err(e) => {
                tracing::warn!(epub = %epub.display(), error = %e, "Source lines unavailable");
            }
        }
    }

    if let Some(min) = filter.min_impact {
        report::retain_min_impact(&mut rows, min);
    }
    if filter.sort {
        report::sort_by_severity(&mut rows);
    }
    rows
}

fn locate(config: Config, args: LocateArgs, writer: &OutputWriter) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let text = dom::numeric_entities(&text);
    let doc = AnnotatedDocument::parse(&text).map_err(AppError::from)?;
    let file = args.file.display().to_string();

    if args.open {
        let editor = config
            .editor
            .ok_or_else(|| AppError::Config("set ACE_EDITOR or EDITOR to use --open".to_string()))?;
        let mut navigator = EditorNavigator::new(editor);
        if !jump_to_location(&mut navigator, &doc, &file, &args.cfi)? {
            tracing::warn!(cfi = %args.cfi, "Location unavailable");
        }
        return Ok(());
    }

    let view = LocateView {
        line: doc.line_for_cfi(&args.cfi),
        cfi: args.cfi,
        file,
    };
    writer.render(&view)?;
    Ok(())
}

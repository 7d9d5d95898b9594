//! Running Ace by DAISY
//!
//! Ace is an external command (`ace -f -o <dir> <epub>`). It writes
//! `report.json`, `report.html` and a `data/` folder into `<dir>` and exits
//! with code 1 when it could not check the book. Those failures are often
//! transient, so a failed run is retried a configurable number of times.
//!
//! Any other non-zero exit code is reported as [`AppError::AceFailed`]
//! without a retry, even when Ace left a report behind. Only a zero exit
//! means the report in `<dir>` belongs to this run.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Config;
use crate::epub::ensure_epub;
use crate::error::{AppError, Result};

/// Exit code Ace uses for "could not check this book"
const ACE_ERROR_EXIT: i32 = 1;

/// Captured output of one Ace invocation
#[derive(Debug, Clone)]
pub struct AceOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl AceOutput {
    /// stdout followed by stderr
    pub fn combined_log(&self) -> String {
        let mut log = self.stdout.clone();
        if !log.is_empty() && !log.ends_with('\n') {
            log.push('\n');
        }
        log.push_str(&self.stderr);
        log
    }
}

/// A successful Ace run
#[derive(Debug, Clone)]
pub struct AceRun {
    pub report_folder: PathBuf,
    /// Number of invocations it took (1 when the first one succeeded)
    pub attempts: u32,
    pub output: AceOutput,
}

impl AceRun {
    pub fn report_json(&self) -> PathBuf {
        self.report_folder.join("report.json")
    }

    pub fn report_html(&self) -> PathBuf {
        self.report_folder.join("report.html")
    }

    /// `file://` URL of the HTML report
    pub fn report_url(&self) -> String {
        let html = self.report_html();
        let absolute = fs::canonicalize(&html).unwrap_or(html);
        format!("file://{}", absolute.display())
    }
}

#[derive(Debug, Clone)]
pub struct AceRunner {
    program: String,
    leading_args: Vec<String>,
    reruns: u32,
    debug_mode: bool,
}

impl AceRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            reruns: 1,
            debug_mode: false,
        }
    }

    /// `ace_command` may carry leading arguments, e.g. `node /opt/ace/cli.js`.
    pub fn from_config(config: &Config) -> Self {
        let mut parts = config.ace_command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "ace".to_string());

        Self::new(program)
            .with_leading_args(parts.collect())
            .with_reruns(config.reruns)
            .with_debug_mode(config.debug_mode)
    }

    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    pub fn with_reruns(mut self, reruns: u32) -> Self {
        self.reruns = reruns;
        self
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Arguments passed after the program name
    pub fn args(&self, epub: &Path, report_folder: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.push("-f".into());
        args.push("-o".into());
        args.push(report_folder.as_os_str().to_owned());
        args.push(epub.as_os_str().to_owned());
        args
    }

    fn command(&self, epub: &Path, report_folder: &Path) -> Command {
        // npm installs Ace as a `.cmd` shim on Windows, which only the shell resolves
        #[cfg(windows)]
        let command = {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(&self.program);
            command
        };

        #[cfg(not(windows))]
        let command = Command::new(&self.program);

        let mut command = command;
        command.args(self.args(epub, report_folder));
        command
    }

    fn invoke(&self, epub: &Path, report_folder: &Path) -> Result<AceOutput> {
        let output = self
            .command(epub, report_folder)
            .output()
            .map_err(|source| AppError::AceNotFound {
                command: self.program.clone(),
                source,
            })?;

        Ok(AceOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }

    /// Check `epub`, writing the report into `report_folder`.
    pub fn run(&self, epub: &Path, report_folder: &Path) -> Result<AceRun> {
        ensure_epub(epub)?;
        if !epub.is_file() {
            return Err(AppError::ResourceNotFound(epub.display().to_string()));
        }

        // Stale data from a previous run would end up in the new report
        let data = report_folder.join("data");
        if data.exists() {
            fs::remove_dir_all(&data)?;
        }
        fs::create_dir_all(report_folder)?;

        let max_attempts = self.reruns.saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::info!(
                epub = %epub.display(),
                attempt,
                max_attempts,
                "Running {}",
                self.program
            );

            let output = self.invoke(epub, report_folder)?;

            if self.debug_mode {
                let log_path = report_folder.join("ace.log");
                fs::write(&log_path, output.combined_log())?;
                tracing::debug!(path = %log_path.display(), "Saved Ace log");
            }

            match output.code {
                Some(0) => {
                    tracing::info!(report = %report_folder.display(), "Ace check finished");
                    return Ok(AceRun {
                        report_folder: report_folder.to_path_buf(),
                        attempts: attempt,
                        output,
                    });
                }
                Some(ACE_ERROR_EXIT) if attempt < max_attempts => {
                    tracing::warn!(
                        stderr = %output.stderr.trim(),
                        "Ace found an error during execution, rerunning"
                    );
                }
                code => {
                    return Err(AppError::AceFailed {
                        code: code.unwrap_or(-1),
                        stderr: output.stderr.trim().to_string(),
                    });
                }
            }
        }
    }
}

/// Open the HTML report in the default browser.
pub fn open_report(run: &AceRun) -> Result<()> {
    let html = run.report_html();
    if !html.is_file() {
        return Err(AppError::ResourceNotFound(html.display().to_string()));
    }
    tracing::debug!(url = %run.report_url(), "Opening report");
    open::that(&html)?;
    Ok(())
}

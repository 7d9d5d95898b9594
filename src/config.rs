//! Configuration management for ace-check
//!
//! Settings come from the environment (a `.env` file is loaded by the
//! binary); command-line flags override them.

use std::env;
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Executable used to run Ace
    pub ace_command: String,
    /// Folder the `report/` directory is written into
    pub report_dir: PathBuf,
    /// Open `report.html` in the browser once Ace finishes
    pub open_report: bool,
    /// Save the full Ace log next to the report
    pub debug_mode: bool,
    /// How many times a failed Ace run is retried
    pub reruns: u32,
    /// Editor command used to jump to a location (`$EDITOR` style)
    pub editor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ace_command: "ace".to_string(),
            report_dir: default_report_dir(),
            open_report: true,
            debug_mode: false,
            reruns: 1,
            editor: None,
        }
    }
}

fn default_report_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let flag = |key: &str, default: bool| -> Result<bool> {
            match lookup(key) {
                Some(value) => parse_flag(&value)
                    .ok_or_else(|| AppError::Config(format!("{} must be a boolean, got '{}'", key, value))),
                None => Ok(default),
            }
        };

        let reruns = match lookup("ACE_RERUNS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("ACE_RERUNS must be a number, got '{}'", value)))?,
            None => defaults.reruns,
        };

        Ok(Config {
            ace_command: lookup("ACE_COMMAND")
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(defaults.ace_command),
            report_dir: lookup("ACE_REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_dir),
            open_report: flag("ACE_OPEN_REPORT", defaults.open_report)?,
            debug_mode: flag("ACE_DEBUG_MODE", defaults.debug_mode)?,
            reruns,
            editor: lookup("ACE_EDITOR")
                .or_else(|| lookup("EDITOR"))
                .filter(|e| !e.trim().is_empty()),
        })
    }

    /// Reject a report folder that does not exist.
    pub fn validate(&self) -> Result<()> {
        if !self.report_dir.is_dir() {
            return Err(AppError::Config(format!(
                "report folder '{}' does not exist",
                self.report_dir.display()
            )));
        }
        Ok(())
    }

    /// Directory Ace writes `report.json`, `report.html` and `data/` into.
    pub fn report_folder(&self) -> PathBuf {
        self.report_dir.join("report")
    }
}

use anyhow::{Context, Result as AnyResult};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::debug;
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::error::{ReportError, Result};
use crate::output::ReportAssets;
use crate::parser::LogFraming;

pub const DEFAULT_ENV_FILE: &str = "build.env";
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com";
pub const DEFAULT_OUTPUT: &str = "deployment_report.pdf";
pub const DEFAULT_TARGET: &str = "gitlabci.cs50p";
pub const DEFAULT_LOGO_LINK: &str = "https://cs50.harvard.edu/python/2022/";

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M %Z (UTC%z)";

/// Everything one report run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub gitlab: GitLabConfig,
    pub report: ReportSettings,
}

#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// GitLab instance base URL
    pub base_url: String,
    /// Numeric project id or `group/project` path
    pub project_id: String,
    /// Personal or project access token
    pub token: Option<Token>,
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Label printed on the `Target:` line
    pub target: String,
    /// Where the PDF is written
    pub output: PathBuf,
    /// Zone the report time is printed in
    pub timezone: Tz,
    pub framing: LogFraming,
    pub assets: ReportAssets,
}

impl ReportSettings {
    pub fn new(target: String, timezone: Tz) -> Self {
        Self {
            target,
            output: PathBuf::from(DEFAULT_OUTPUT),
            timezone,
            framing: LogFraming::default(),
            assets: ReportAssets::default(),
        }
    }

    /// Current time in the configured zone, formatted for the report header.
    pub fn timestamp(&self) -> String {
        format_timestamp(self.timezone, Utc::now())
    }
}

/// Loads `KEY=value` pairs from an env file into the process environment.
///
/// Values in the file win over variables already set, so a checked-in
/// `build.env` behaves the same on every machine. A missing file is not an
/// error; returns whether a file was loaded.
pub fn load_env_file(path: &Path) -> AnyResult<bool> {
    if !path.exists() {
        debug!("No env file at {}", path.display());
        return Ok(false);
    }

    dotenvy::from_path_override(path)
        .with_context(|| format!("Failed to load env file: {}", path.display()))?;
    debug!("Loaded env file {}", path.display());

    Ok(true)
}

/// Looks up an IANA time zone name such as `Europe/Warsaw`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| ReportError::Config(format!("Unknown time zone '{name}': {e}")))
}

pub fn format_timestamp(timezone: Tz, now: DateTime<Utc>) -> String {
    now.with_timezone(&timezone)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::config::{
    parse_timezone, Config, GitLabConfig, ReportSettings, DEFAULT_BASE_URL, DEFAULT_LOGO_LINK,
    DEFAULT_OUTPUT, DEFAULT_TARGET,
};
use crate::error::ReportError;
use crate::output::{self, ReportAssets, ReportContent};
use crate::parser::{parse_with_framing, LogFraming, DEFAULT_HEAD_LINES, DEFAULT_TAIL_LINES};
use crate::reporter::{generate_report, write_report, DeploymentReporter, ReportOutcome};

const NOT_READY_MESSAGE: &str = "Please check your latest deployment!";

#[derive(Parser)]
#[command(name = "deploy-report")]
#[command(author, version, about = "GitLab deployment report generator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest pipeline's job log and render the deployment report
    Report {
        #[command(flatten)]
        gitlab: GitLabArgs,

        #[command(flatten)]
        report: ReportArgs,

        /// Hide the phase spinners
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
    },
    /// Parse a local job log and print the deployment table
    Parse {
        log: PathBuf,

        #[command(flatten)]
        framing: FramingArgs,

        /// Print the table as JSON instead of a terminal table
        #[arg(long, default_value_t = false)]
        json: bool,

        #[arg(short, long, default_value_t = false)]
        pretty: bool,
    },
    /// Render a local job log into a PDF report
    Render {
        log: PathBuf,

        /// Label for the `Source:` line
        #[arg(short, long, default_value = "local")]
        source: String,

        /// Render the log as free text instead of parsing the table
        #[arg(long, default_value_t = false)]
        raw: bool,

        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(Args)]
struct GitLabArgs {
    #[arg(short, long, env = "ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(short, long, env = "CI_SERVER_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    #[arg(short = 'P', long, env = "CI_PROJECT_ID")]
    project: String,
}

#[derive(Args)]
struct ReportArgs {
    /// IANA time zone for the report time, e.g. Europe/Warsaw
    #[arg(long, env = "TIME_ZONE")]
    timezone: String,

    /// Label for the `Target:` line
    #[arg(long, default_value = DEFAULT_TARGET)]
    target: String,

    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Image placed in the report header
    #[arg(long)]
    logo: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_LOGO_LINK)]
    logo_link: String,

    /// TrueType font for regular text (built-in Helvetica when omitted)
    #[arg(long)]
    font: Option<PathBuf>,

    /// TrueType font for the table header
    #[arg(long)]
    bold_font: Option<PathBuf>,

    #[command(flatten)]
    framing: FramingArgs,
}

#[derive(Args)]
struct FramingArgs {
    /// How the table body is located in the log
    #[arg(long, value_enum, default_value_t = FramingKind::Fixed)]
    framing: FramingKind,

    /// Banner lines dropped from the top of the log (fixed framing)
    #[arg(long, default_value_t = DEFAULT_HEAD_LINES)]
    skip_head: usize,

    /// Summary lines dropped from the bottom of the log (fixed framing)
    #[arg(long, default_value_t = DEFAULT_TAIL_LINES)]
    skip_tail: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FramingKind {
    Fixed,
    Markers,
}

impl FramingArgs {
    fn framing(&self) -> LogFraming {
        match self.framing {
            FramingKind::Fixed => LogFraming::Fixed {
                head: self.skip_head,
                tail: self.skip_tail,
            },
            FramingKind::Markers => LogFraming::Markers,
        }
    }
}

impl GitLabArgs {
    fn config(&self) -> GitLabConfig {
        GitLabConfig {
            base_url: self.url.clone(),
            project_id: self.project.clone(),
            token: self.token.as_deref().map(Token::from),
        }
    }
}

impl ReportArgs {
    fn settings(&self) -> Result<ReportSettings> {
        let timezone = parse_timezone(&self.timezone)?;

        Ok(ReportSettings {
            output: self.output.clone(),
            framing: self.framing.framing(),
            assets: ReportAssets {
                logo: self.logo.clone(),
                logo_link: self.logo_link.clone(),
                font: self.font.clone(),
                bold_font: self.bold_font.clone(),
            },
            ..ReportSettings::new(self.target.clone(), timezone)
        })
    }
}

impl Cli {
    async fn execute_report(gitlab: &GitLabArgs, report: &ReportArgs, quiet: bool) -> Result<()> {
        let config = Config {
            gitlab: gitlab.config(),
            report: report.settings()?,
        };
        info!(
            "Generating deployment report for project: {}",
            config.gitlab.project_id
        );

        let reporter = DeploymentReporter::new(config)?.with_progress(!quiet);

        match reporter.run().await? {
            ReportOutcome::Generated { path, rows } => {
                info!("Rendered {rows} rows into {}", path.display());
            }
            ReportOutcome::PipelineNotReady(pipeline) => {
                info!(
                    "Pipeline {} on {} is not successful",
                    pipeline.pipeline_id, pipeline.source_ref
                );
                println!("{}", output::notice(NOT_READY_MESSAGE));
            }
        }

        Ok(())
    }

    fn execute_parse(log: &Path, framing: &FramingArgs, json: bool, pretty: bool) -> Result<()> {
        let raw = read_log(log)?;
        let table = parse_with_framing(&raw, framing.framing())?;

        if json {
            let rendered = if pretty {
                serde_json::to_string_pretty(&table)?
            } else {
                serde_json::to_string(&table)?
            };
            println!("{rendered}");
        } else {
            output::print_summary(&log.display().to_string(), &table);
        }

        Ok(())
    }

    fn execute_render(log: &Path, source: &str, raw: bool, report: &ReportArgs) -> Result<()> {
        let settings = report.settings()?;
        let text = read_log(log)?;

        if raw {
            write_report(&settings, source, ReportContent::Text(&text))?;
        } else {
            let (path, rows) = generate_report(&settings, source, &text)
                .map_err(|e| ReportError::Generation(Box::new(e)))?;
            info!("Rendered {rows} rows into {}", path.display());
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Report {
                gitlab,
                report,
                quiet,
            } => Self::execute_report(gitlab, report, *quiet).await,
            Commands::Parse {
                log,
                framing,
                json,
                pretty,
            } => Self::execute_parse(log, framing, *json, *pretty),
            Commands::Render {
                log,
                source,
                raw,
                report,
            } => Self::execute_render(log, source, *raw, report),
        }
    }
}

fn read_log(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read log: {}", path.display()))
}

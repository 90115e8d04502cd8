mod client;
mod compare;
mod config;
mod error;
mod filter;
mod pipeline;
mod record;
mod render;
mod sort;

use crate::client::ApiClient;
use crate::config::{DEFAULT_SERVER, Session};
use crate::pipeline::PipelineOptions;
use crate::render::{OutputFormat, RenderSpec};
use crate::sort::SortSpec;
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "podmanager-cli",
    version,
    about = "CLI for the podmanager management API"
)]
struct Cli {
    #[arg(long, short = 'v', global = true, help = "Log requests and pipeline stages to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login to the management API and save the access token
    Login {
        #[arg(long, value_name = "URL", default_value = DEFAULT_SERVER)]
        url: String,
        #[arg(long, default_value = "admin")]
        account: String,
        #[arg(long, help = "Password (prompted for when omitted)")]
        password: Option<String>,
    },
    /// Logout and clear the stored token
    Logout,
    /// Infrastructure management commands
    #[command(subcommand)]
    Infra(InfraCommand),
    /// Provision management commands
    #[command(subcommand)]
    Provision(ProvisionCommand),
    /// Show the stored session (token masked)
    ConfigShow,
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
enum InfraCommand {
    /// List all infrastructure resources
    List {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Subcommand)]
enum ProvisionCommand {
    /// List all OS images
    OsimgList {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Delete an OS image by ID
    OsimgDelete {
        #[arg(long, help = "OS image ID")]
        id: String,
    },
    /// Upload an OS image
    OsimgUpload {
        #[arg(long, value_name = "FILE", help = "OS image file")]
        osimage: PathBuf,
        #[arg(long, help = "Title for the OS image")]
        title: String,
        #[arg(long, help = "Name of the OS image")]
        name: String,
        #[arg(long, help = "Architecture the OS image supports")]
        architecture: String,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Args, Clone, Debug)]
struct PipelineArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Raw, help = "Output format")]
    format: OutputFormat,

    #[arg(
        long,
        value_name = "CONDITION",
        help = "Keep rows matching a condition like 'key>=value' or 'a.b!=value' (repeatable, ANDed)"
    )]
    filter: Vec<String>,

    #[arg(long, value_name = "PATH", help = "Sort rows by a (dotted) field")]
    sort_key: Option<String>,

    #[arg(long, value_enum, default_value_t = SortOrder::Asc, help = "Sort direction")]
    sort_order: SortOrder,

    #[arg(
        long,
        value_name = "COL1,COL2",
        help = "Columns for csv/table output (comma-separated, dotted paths allowed)"
    )]
    columns: Option<String>,
}

impl PipelineArgs {
    fn options(&self, title: &str) -> PipelineOptions {
        PipelineOptions {
            filters: self.filter.clone(),
            sort: SortSpec::new(self.sort_key.as_deref(), self.sort_order == SortOrder::Desc),
            render: RenderSpec::new(self.format, self.columns.as_deref(), title),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{} {err:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "podmanager_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login {
            url,
            account,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => rpassword::prompt_password("Password: ").context("reading password")?,
            };
            match client::login(&url, &account, &password).and_then(|token| Session::new(&url, &token)) {
                Ok(session) => {
                    let path = config::save(&session)?;
                    debug!("saved credentials to {}", path.display());
                    println!("{}", "Login successful.".green());
                }
                Err(err) => println!("{}", format!("Login failed: {err:#}").red()),
            }
        }
        Commands::Logout => {
            config::clear()?;
            println!("{}", "Logout successful.".green());
        }
        Commands::Infra(InfraCommand::List { pipeline }) => list(
            "infra.list",
            "/api/gsm/gsm/common/getNodeList",
            &[("type", "BMC".into())],
            &pipeline,
        )?,
        Commands::Provision(command) => match command {
            ProvisionCommand::OsimgList { pipeline } => list(
                "provision.osimg-list",
                "/api/v1/provision/osimg",
                &[],
                &pipeline,
            )?,
            ProvisionCommand::OsimgDelete { id } => {
                let session = match config::load() {
                    Ok(session) => session,
                    Err(err) => return pipeline::intercept_auth(err, &mut io::stdout().lock()),
                };
                let response = ApiClient::new(&session)?
                    .delete(&format!("/api/v1/provision/osimg/{id}"))
                    .context("deleting OS image")?;
                debug!(status = response.status, body = %response.body, "delete response");
                println!("Delete OS image {id} success");
            }
            ProvisionCommand::OsimgUpload {
                osimage,
                title,
                name,
                architecture,
                pipeline,
            } => {
                let query = [
                    ("architecture", architecture),
                    ("name", name),
                    ("title", title),
                ];
                shape(
                    "provision.osimg-upload",
                    || {
                        let session = config::load()?;
                        let response = ApiClient::new(&session)?
                            .upload("/api/v1/provision/osimg", &query, "content", &osimage)
                            .context("uploading OS image")?;
                        Ok(response.into_records())
                    },
                    &pipeline,
                )?
            }
        },
        Commands::ConfigShow => match config::read()? {
            Some(session) => println!("{}", serde_json::to_string_pretty(&session.masked())?),
            None => println!("{}", "Not logged in.".yellow()),
        },
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            match shell {
                CompletionShell::Bash => generate(shells::Bash, &mut cmd, bin, &mut io::stdout()),
                CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin, &mut io::stdout()),
                CompletionShell::Fish => generate(shells::Fish, &mut cmd, bin, &mut io::stdout()),
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut io::stdout())
                }
            }
        }
    }

    Ok(())
}

fn list(title: &str, path: &str, query: &[(&str, String)], args: &PipelineArgs) -> Result<()> {
    shape(
        title,
        || {
            let session = config::load()?;
            let response = ApiClient::new(&session)?.get(path, query)?;
            Ok(response.into_records())
        },
        args,
    )
}

fn shape<F>(title: &str, fetch: F, args: &PipelineArgs) -> Result<()>
where
    F: FnOnce() -> Result<Vec<Value>>,
{
    let options = args.options(&format!("{title} Output"));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    pipeline::run(fetch, &options, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_flags_build_options() {
        let cli = Cli::try_parse_from([
            "podmanager-cli",
            "provision",
            "osimg-list",
            "--format",
            "table",
            "--filter",
            "arch=x86_64",
            "--filter",
            "size>=10",
            "--sort-key",
            "meta.ver",
            "--sort-order",
            "desc",
            "--columns",
            "name,meta.ver",
        ])
        .unwrap();

        let Commands::Provision(ProvisionCommand::OsimgList { pipeline }) = cli.command else {
            panic!("expected osimg-list");
        };
        let options = pipeline.options("provision.osimg-list Output");
        assert_eq!(options.filters, vec!["arch=x86_64", "size>=10"]);
        assert_eq!(options.sort, SortSpec::new(Some("meta.ver"), true));
        assert_eq!(options.render.format, OutputFormat::Table);
        assert_eq!(
            options.render.columns,
            Some(vec!["name".to_string(), "meta.ver".to_string()])
        );
        assert_eq!(options.render.title, "provision.osimg-list Output");
    }

    #[test]
    fn pipeline_flags_default_to_raw_ascending() {
        let cli = Cli::try_parse_from(["podmanager-cli", "infra", "list"]).unwrap();
        let Commands::Infra(InfraCommand::List { pipeline }) = cli.command else {
            panic!("expected infra list");
        };
        let options = pipeline.options("t");
        assert!(options.filters.is_empty());
        assert_eq!(options.sort, SortSpec::default());
        assert_eq!(options.render.format, OutputFormat::Raw);
        assert_eq!(options.render.columns, None);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(
            Cli::try_parse_from(["podmanager-cli", "infra", "list", "--format", "yaml"]).is_err()
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}

//! fnship - Deploy serverless functions and manage their runtime config
//!
#![doc = "fnship - Deploy serverless functions and manage their runtime config"]
#![doc = "Main entry point for the fnship command-line tool."]

use anyhow::Result;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fnship::cli::{Cli, Commands, ConfigCommand, FunctionsCommand};
use fnship::commands;
use fnship::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("fnship.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Deploy {
            only,
            except,
            manifest,
            out,
            source_archive_url,
            dry_run,
        } => {
            tracing::info!("Starting deploy");
            let args = commands::deploy::DeployArgs {
                only,
                except,
                manifest,
                out,
                source_archive_url,
                dry_run,
            };
            commands::deploy::run_deploy(&config, args).await?;
            Ok(())
        }
        Commands::Functions { command } => match command {
            FunctionsCommand::List => {
                commands::functions::list_functions(&config).await?;
                Ok(())
            }
            FunctionsCommand::Delete {
                filters,
                region,
                force,
            } => {
                tracing::info!("Starting functions delete");
                commands::functions::run_delete(&config, &filters, region.as_deref(), force)
                    .await?;
                Ok(())
            }
        },
        Commands::Config { command } => {
            let project = config.project_id()?;
            let store = commands::config_store(&config)?;
            match command {
                ConfigCommand::Get { path } => {
                    commands::config::get(&store, project, path.as_deref()).await?
                }
                ConfigCommand::Set { values } => {
                    commands::config::set(&store, project, &values).await?
                }
                ConfigCommand::Unset { keys } => {
                    commands::config::unset(&store, project, &keys).await?
                }
                ConfigCommand::Clone { from, only, except } => {
                    commands::config::clone(&store, &from, project, &only, &except).await?
                }
                ConfigCommand::Legacy => commands::config::legacy(&store, project).await?,
            }
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise fnship logs at info, or debug with
/// `--verbose`. Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_level = if verbose { "fnship=debug" } else { "fnship=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

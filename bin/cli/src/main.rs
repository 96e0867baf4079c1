mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use trading_maven_client::{
    ApiClient, BrokerStatusMonitor, Session, WorkflowApi, WorkflowPersistence, load_catalog,
};
use trading_maven_core::WorkflowId;
use trading_maven_workflow::ExecutionConsole;

use crate::config::CliConfig;

/// Build, save and run Trading Maven workflows
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the node types available to workflows
    Catalog,
    /// Print a saved workflow
    Show {
        /// Backend id of the workflow
        id: WorkflowId,
    },
    /// Save a workflow file (JSON request body)
    Save {
        /// Path to the workflow JSON file
        path: PathBuf,
        /// Update this saved workflow instead of creating a new one
        #[arg(long)]
        id: Option<WorkflowId>,
    },
    /// Save a workflow file, then run it
    Execute {
        /// Path to the workflow JSON file
        path: PathBuf,
        /// Update this saved workflow instead of creating a new one
        #[arg(long)]
        id: Option<WorkflowId>,
        /// Run without placing real orders
        #[arg(long)]
        test_mode: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,trading_maven=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let session = Session::new(config.auth_token.clone());
    let api = match ApiClient::new(
        config.api_base_url.clone(),
        session,
        config.request_timeout(),
    ) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            tracing::error!(error = %e, "failed to create API client");
            return ExitCode::FAILURE;
        }
    };

    let catalog = load_catalog(api.as_ref()).await;
    let persistence = WorkflowPersistence::new(api.clone());
    let mut console = ExecutionConsole::new();

    let result = match cli.command {
        Command::Catalog => {
            print!("{}", commands::render_palette(&catalog));
            Ok(())
        }
        Command::Show { id } => commands::show(&persistence, &catalog, id)
            .await
            .map(|text| print!("{text}")),
        Command::Save { path, id } => {
            commands::save(&persistence, &catalog, &path, id, &mut console)
                .await
                .map(|id| println!("{id}"))
        }
        Command::Execute {
            path,
            id,
            test_mode,
        } => {
            let monitor = BrokerStatusMonitor::spawn(
                api.clone() as Arc<dyn WorkflowApi>,
                config.status_poll_interval(),
            );
            monitor.refresh().await;
            let result = commands::execute(
                &persistence,
                &catalog,
                &path,
                id,
                &monitor.status(),
                test_mode,
                &mut console,
            )
            .await
            .map(|execution| println!("{execution}"));
            monitor.shutdown();
            result
        }
    };

    for entry in console.entries() {
        eprintln!("{entry}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.current_context());
            ExitCode::FAILURE
        }
    }
}

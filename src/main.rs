//! tlc-athena - NYC TLC Athena query tools for agent hosts.

use std::sync::Arc;

use tlc_athena::athena::{AthenaConnector, ServiceConnector};
use tlc_athena::catalog::Catalog;
use tlc_athena::cli::{Cli, Command};
use tlc_athena::config::{env_lookup, AthenaSettings, Config};
use tlc_athena::diagnostics::diagnose_config;
use tlc_athena::error::{Result, TlcError};
use tlc_athena::logging;
use tlc_athena::query::QueryExecutor;
use tlc_athena::server::TlcMcpServer;
use tlc_athena::tools::ToolAdapter;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Before logging: a missing .env is normal, so it is only reported later.
    let env_loaded = match &cli.env_file {
        Some(path) => dotenvy::from_path(path).map(|_| path.display().to_string()),
        None => dotenvy::dotenv().map(|path| path.display().to_string()),
    };

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    match env_loaded {
        Ok(path) => info!("Loaded environment from {}", path),
        Err(e) if cli.env_file.is_some() => {
            error!("config: failed to load env file: {}", e);
            std::process::exit(1);
        }
        Err(_) => {}
    }

    match run(&cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<i32> {
    // The env file is loaded by now, so TLC_ATHENA_CONFIG from it applies.
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let loaded = Config::load(&config_path, env_lookup);

    match cli.command() {
        Command::Schema => {
            print!("{}", loaded?.catalog()?.format_for_llm());
            Ok(0)
        }
        Command::Diagnose => {
            let report = diagnose_config(loaded, env_lookup, &AthenaConnector).await;
            println!("{report}");
            Ok(report.exit_code())
        }
        Command::Serve => {
            let config = loaded?;
            let catalog = config.catalog()?;
            serve(&config, catalog).await?;
            Ok(0)
        }
    }
}

async fn serve(config: &Config, catalog: Catalog) -> Result<()> {
    let settings = AthenaSettings::from_env(&config.athena).map_err(|e| {
        if let TlcError::ConfigMissing(vars) = &e {
            warn!("Set {} in the environment or .env file", vars.join(", "));
        }
        e
    })?;
    info!("Athena: {}", settings.display_string());

    let service = AthenaConnector.connect(&settings).await?;
    let executor = QueryExecutor::from_config(service, &config.query);
    let adapter = ToolAdapter::new(Arc::new(catalog), executor, config.query.max_rows);

    TlcMcpServer::new(adapter).serve_stdio().await
}

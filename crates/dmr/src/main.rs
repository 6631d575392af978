use std::process::ExitCode;
use std::sync::Arc;

use dmr_core::config::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dmr_core::logging::init("dmr") {
        eprintln!("{}", e.diagnostic());
        return ExitCode::FAILURE;
    }

    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("{}", e.diagnostic());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = dmr_telegram::router::run(cfg).await {
        error!(error = %e, "relay stopped");
        match e.downcast_ref::<dmr_core::Error>() {
            Some(core) => eprintln!("{}", core.diagnostic()),
            None => eprintln!("Fatal error: {e:#}"),
        }
        return ExitCode::FAILURE;
    }

    info!("relay stopped cleanly");
    ExitCode::SUCCESS
}

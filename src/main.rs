use std::{
    path::Path,
    process,
    sync::{Arc, OnceLock},
};

use thermopost::{
    config::Config,
    core::{measurement::RandomMeasurementSource, runner::Runner},
    logger::LoggerManager,
    print_error,
};
use thermopost_https::{ClientIdentity, HttpsTransport};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::new().unwrap_or_else(|e| {
            print_error!("{}", e);
            process::exit(1);
        })
    })
}

#[tokio::main]
async fn main() {
    let cfg = config();
    let mut logger_manager = LoggerManager::new(cfg.logger.clone()).unwrap_or_else(|e| {
        print_error!("Failed to setup Log Manager: {}", e);
        process::exit(1);
    });
    logger_manager.init().unwrap_or_else(|e| {
        print_error!("Failed to init Log Manager: {}", e);
        process::exit(1);
    });
    info!("Starting thermopost version {}...", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", cfg.logger.level);
    debug!("{:#?}", cfg.transport);

    // Credential loading is fatal: a missing container or wrong
    // passphrase will not become valid by retrying.
    let identity = ClientIdentity::load(
        Path::new(&cfg.transport.identity.container_path),
        &cfg.transport.identity.passphrase,
    )
    .unwrap_or_else(|e| {
        error!("Failed to load client identity: {}", e);
        process::exit(1);
    });
    info!(
        "Client identity loaded ({} certificate(s) in chain)",
        identity.cert_chain().len()
    );

    let transport = HttpsTransport::new(identity, &cfg.transport).unwrap_or_else(|e| {
        error!("Failed to build HTTPS client: {}", e);
        process::exit(1);
    });
    info!("Publishing to {}", transport.endpoint());
    info!(
        "Publish interval: {} ms, keep-alive: {}",
        cfg.publisher.interval_ms, cfg.transport.keep_alive
    );

    let cancel = CancellationToken::new();
    let runner = Runner::new(
        Arc::new(transport),
        Box::new(RandomMeasurementSource::new()),
        Arc::new(cfg.publisher.clone()),
        cancel.clone(),
    );

    tokio::select! {
        _ = runner.run() => {
            error!("Publish loop unexpectedly finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
        }
    }

    info!("Shutdown complete");
}

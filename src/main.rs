use std::sync::Arc;
use std::sync::atomic::Ordering;

use weather_mailbot::config::Config;
use weather_mailbot::forecast::{ForecastOrchestrator, OpenWeatherGenerator};
use weather_mailbot::notify::SmtpNotifier;
use weather_mailbot::pipeline::Dispatcher;
use weather_mailbot::poller::spawn_poller;
use weather_mailbot::store::{LibSqlStore, RateLimitStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("weather-mailbot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   IMAP: {}:{}", config.imap_host, config.imap_port);
    eprintln!("   SMTP: {}:{}", config.smtp_host, config.smtp_port);
    eprintln!("   Poll interval: {}s", config.poll_interval_secs);
    eprintln!("   Cooldown: {}s", config.cooldown_secs);
    eprintln!(
        "   Allowed domains: {}",
        if config.allowed_domains.iter().any(|d| d == "*") {
            "all".to_string()
        } else {
            config.allowed_domains.join(", ")
        }
    );
    eprintln!("   Database: {}\n", config.db_path);

    let store: Arc<dyn RateLimitStore> = Arc::new(
        LibSqlStore::new_local(std::path::Path::new(&config.db_path))
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {e}", config.db_path);
                std::process::exit(1);
            }),
    );

    let orchestrator = ForecastOrchestrator::new(Arc::new(OpenWeatherGenerator::new(&config)));
    let notifier = Arc::new(SmtpNotifier::new(&config));

    let dispatcher = Arc::new(Dispatcher::new(
        config.allowed_domains.clone(),
        config.cooldown_secs,
        store,
        orchestrator,
        notifier,
    ));

    let (poller, shutdown) = spawn_poller(Arc::clone(&config), dispatcher);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested, stopping at the next cycle boundary");
    shutdown.store(true, Ordering::Relaxed);
    let _ = poller.await;

    Ok(())
}

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pdu_snmp_monitor::collector::DevicePoller;
use pdu_snmp_monitor::config::AppConfig;
use pdu_snmp_monitor::formatter::JsonFormatter;
use pdu_snmp_monitor::handlers::AppState;
use pdu_snmp_monitor::registry::Registry;
use pdu_snmp_monitor::routes::create_router;
use pdu_snmp_monitor::snmp::SnmpFetcher;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Логи в stderr, stdout остаётся под JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match env::var("PDU_PROFILE") {
        Ok(path) => AppConfig::load(&path)?,
        Err(_) => AppConfig::builtin()?,
    };
    config.debug_config();

    // Реестр собирается один раз и дальше только читается
    let registry = Arc::new(Registry::from_profile(&config.profile)?);

    if let Some(addr) = config.get_listen_addr() {
        serve(config, registry, &addr).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let target = config.get_target();
    let fetcher = Arc::new(SnmpFetcher::from_config(&config, &target, config.get_community()));
    let poller = DevicePoller::new(registry, fetcher, target);

    let interval = config.get_poll_interval();
    if interval == 0 {
        let report = poller.poll().await;
        println!("{}", JsonFormatter::to_json_string(&report)?);
        return Ok(ExitCode::from(report.overall_severity().exit_code()));
    }

    info!(interval_secs = interval, "периодический опрос запущен");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = poller.poll().await;
                match JsonFormatter::to_json_compact(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => error!(error = %e, "ошибка JSON сериализации"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("остановка опроса");
                break;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// HTTP режим: /health и /poll
async fn serve(config: AppConfig, registry: Arc<Registry>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Не удалось слушать {}", addr))?;
    info!(addr, "HTTP сервер запущен");

    let app = create_router(Arc::new(AppState { config, registry }));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP сервер завершился с ошибкой")?;

    Ok(())
}

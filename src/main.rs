use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod collector;
mod config;
mod emitter;
mod error;
mod formatter;
mod handlers;
mod ldap;
mod routes;

use collector::Ds389Collector;
use emitter::WriterSink;
use handlers::AppState;

/// Сборщик метрик 389 Directory Server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Путь к YAML конфигурации
    #[arg(long, env = "DS389_CONFIG", default_value = "./profiles/ds389.yaml")]
    config: PathBuf,

    /// Интервал опроса в секундах
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,

    /// Один цикл опроса и выход
    #[arg(long)]
    once: bool,

    /// Отдавать метрики по HTTP вместо вывода в stdout
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout занят метриками, логи идут в stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = config::AppConfig::load(&args.config)?;
    let collector = Ds389Collector::from_config(&config)?;
    info!("конфигурация загружена из {}", args.config.display());

    if let Some(addr) = args.listen {
        return serve(collector, addr).await;
    }

    let mut sink = WriterSink::stdout(config.settings.output.format);

    if args.once {
        return collector.gather(&mut sink).await;
    }

    let period = Duration::from_secs(args.poll_interval.max(1));
    collector
        .run_until(&mut sink, period, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    Ok(())
}

async fn serve(collector: Ds389Collector, addr: SocketAddr) -> Result<()> {
    let router = routes::create_router(AppState::new(collector));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Не удалось занять {}", addr))?;

    info!("HTTP сервер слушает {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP сервер упал")
}

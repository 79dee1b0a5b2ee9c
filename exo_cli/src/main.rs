//! Process entry: configuration load, logging setup, backend selection.
//!
//! The motor backend is chosen exactly once here and injected into the
//! runner; nothing below this file branches on simulation vs. hardware.

mod cli;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use exo_core::error::StartupError;

fn init_tracing(args: &Cli, logging: &exo_config::Logging) {
    let level = logging.level.as_deref().unwrap_or(&args.log_level);
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or_else(|| "exo.log".as_ref());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = cli::FILE_GUARD.set(guard);
        // File logs are always JSON lines.
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .json()
            .init();
    } else if args.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(path: &Path) -> eyre::Result<exo_config::Config> {
    let raw = fs::read_to_string(path).map_err(|e| {
        StartupError::Config(format!("reading safety configuration {}: {e}", path.display()))
    })?;
    let cfg = exo_config::load_toml(&raw)
        .map_err(|e| StartupError::Config(format!("parsing safety configuration: {e}")))?;
    cfg.validate().wrap_err("invalid safety configuration")?;
    Ok(cfg)
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let cfg = load_config(&args.config)?;
    init_tracing(&args, &cfg.logging);

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    })
    .wrap_err("installing signal handler")?;

    tracing::info!(
        config = %args.config.display(),
        period_s = cfg.control.period_s,
        "wrist exoskeleton controller starting"
    );

    #[cfg(feature = "hardware")]
    if !args.sim {
        let driver = exo_hardware::md80::Md80Driver::open(
            &args.serial_port,
            1_000_000,
            std::time::Duration::from_millis(100),
        )
        .wrap_err("opening motor bus")?;
        return exo_core::runner::run(driver, &cfg, shutdown);
    }

    #[cfg(not(feature = "hardware"))]
    if !args.sim {
        tracing::warn!("built without the hardware feature, using the simulation backend");
    }
    exo_core::runner::run(exo_hardware::SimulatedDriver::new(), &cfg, shutdown)
}

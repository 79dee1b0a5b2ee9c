//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Keeps the non-blocking file appender alive for the process lifetime.
pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "exo-controller",
    version,
    about = "EMG-driven wrist exoskeleton controller"
)]
pub struct Cli {
    /// Path to the safety configuration TOML
    #[arg(long, value_name = "FILE", default_value = "etc/exo_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Use the simulation backend instead of the motor bus
    #[arg(long, action = ArgAction::SetTrue)]
    pub sim: bool,

    /// Motor bus serial device (hardware builds only)
    #[arg(long, value_name = "DEV", default_value = "/dev/ttyACM0")]
    pub serial_port: String,
}

//! Process wiring: socket binding, listener spawn, control loop drive.
//!
//! `run` owns the whole live topology: four channel listeners feeding the
//! shared state and prediction slot, and the control loop on the calling
//! thread. It returns when the shutdown flag rises; startup failures
//! (zero motors, bad indices, bind errors) are the only fatal paths.

use std::net::UdpSocket;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exo_traits::{MonotonicClock, MotorDriver, MotorMode};

use crate::SharedState;
use crate::channels::{Acknowledger, ChannelListener, PredictionSlot};
use crate::classifier;
use crate::control::{ControlLoop, map_driver_error};
use crate::error::{Result as CoreResult, StartupError};
use crate::runtime::RuntimeConfig;

fn bind(role: &'static str, port: u16) -> Result<UdpSocket, StartupError> {
    UdpSocket::bind(("0.0.0.0", port)).map_err(|e| StartupError::Bind {
        role,
        port,
        source: e,
    })
}

/// Run the controller until the shutdown flag rises.
pub fn run<D>(mut driver: D, cfg: &exo_config::Config, shutdown: Arc<AtomicBool>) -> CoreResult<()>
where
    D: MotorDriver + Send + 'static,
{
    let motor_count = driver.motor_count();
    if motor_count == 0 {
        return Err(eyre::Report::new(StartupError::NoMotors));
    }
    let extend = cfg.motors.extend_motor;
    let flex = cfg.motors.flex_motor;
    if extend >= motor_count || flex >= motor_count {
        return Err(eyre::Report::new(StartupError::Config(format!(
            "motor indices ({extend}, {flex}) out of range for {motor_count} detected motors"
        ))));
    }
    tracing::info!(motor_count, extend, flex, "motors detected");

    let runtime = RuntimeConfig::seeded_from(&cfg.params);

    // Put both motors in impedance mode with the seeded gains before any
    // movement can be commanded. Mode/gain failures are per-call hardware
    // errors, not fatal.
    for motor in [extend, flex] {
        if let Err(e) = driver.set_only_motor_mode(motor, MotorMode::Impedance) {
            tracing::warn!(motor, error = %map_driver_error(&*e), "set_only_motor_mode failed");
        }
        if let Err(e) =
            driver.set_impedance_controller_params(motor, runtime.position_kp, runtime.position_kd)
        {
            tracing::warn!(motor, error = %map_driver_error(&*e), "initial impedance gains failed");
        }
    }

    let shared = Arc::new(SharedState::new(runtime));
    let driver = Arc::new(Mutex::new(driver));
    let slot = PredictionSlot::new();
    let ack = Acknowledger::new(cfg.network.confirmation_port);

    let settings_socket = bind("settings", cfg.network.settings_port)?;
    let start_socket = bind("start", cfg.network.start_port)?;
    let disconnect_socket = bind("disconnect", cfg.network.disconnect_port)?;
    let prediction_socket = bind("prediction", cfg.network.prediction_port)?;
    tracing::info!(
        settings = cfg.network.settings_port,
        start = cfg.network.start_port,
        disconnect = cfg.network.disconnect_port,
        prediction = cfg.network.prediction_port,
        "listening"
    );

    let settings_listener = {
        let state = shared.clone();
        ChannelListener::spawn("settings", settings_socket, move |payload, addr| {
            match crate::channels::apply_settings_payload(payload, &state.config) {
                Ok(report) => {
                    let first = state
                        .session
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .settings_applied();
                    if first {
                        tracing::info!(
                            applied = report.applied,
                            skipped = report.skipped,
                            "initial motor settings applied"
                        );
                    } else {
                        tracing::info!(
                            applied = report.applied,
                            skipped = report.skipped,
                            "motor settings updated during operation"
                        );
                    }
                    if let Err(e) = ack.send(addr.ip(), true, "Motor settings applied") {
                        tracing::warn!(error = %e, "settings acknowledgment failed");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "dropping settings datagram"),
            }
        })
        .map_err(|e| StartupError::Config(format!("settings listener: {e}")))?
    };

    let start_listener = {
        let state = shared.clone();
        ChannelListener::spawn("start", start_socket, move |payload, addr| {
            match crate::channels::parse_command(payload) {
                Ok(Some(cmd)) if cmd == "start" => {
                    let accepted = state
                        .session
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .start();
                    if accepted {
                        tracing::info!("system started");
                        if let Err(e) = ack.send(addr.ip(), true, "System started") {
                            tracing::warn!(error = %e, "start acknowledgment failed");
                        }
                    } else {
                        tracing::warn!("start refused: no settings accepted yet");
                        if let Err(e) = ack.send(addr.ip(), false, "Settings required before start")
                        {
                            tracing::warn!(error = %e, "start refusal acknowledgment failed");
                        }
                    }
                }
                Ok(cmd) => tracing::debug!(?cmd, "ignoring command on start channel"),
                Err(e) => tracing::warn!(error = %e, "dropping start datagram"),
            }
        })
        .map_err(|e| StartupError::Config(format!("start listener: {e}")))?
    };

    let disconnect_listener = {
        let state = shared.clone();
        let driver = driver.clone();
        ChannelListener::spawn("disconnect", disconnect_socket, move |payload, addr| {
            match crate::channels::parse_command(payload) {
                Ok(Some(cmd)) if cmd == "disconnect" => {
                    tracing::info!("disconnect command received, stopping motors");
                    state
                        .session
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .disconnect();
                    let mut drv = driver.lock().unwrap_or_else(|e| e.into_inner());
                    for motor in [extend, flex] {
                        if let Err(e) = drv.set_target_position(motor, 0.0) {
                            tracing::warn!(motor, error = %map_driver_error(&*e), "zeroing motor failed");
                        }
                    }
                    drop(drv);
                    // Best-effort acknowledgment; delivery failure is not
                    // an error on this channel.
                    if let Err(e) = ack.send(addr.ip(), true, "Motors disconnected") {
                        tracing::debug!(error = %e, "disconnect acknowledgment not delivered");
                    }
                }
                Ok(cmd) => tracing::debug!(?cmd, "ignoring command on disconnect channel"),
                Err(e) => tracing::warn!(error = %e, "dropping disconnect datagram"),
            }
        })
        .map_err(|e| StartupError::Config(format!("disconnect listener: {e}")))?
    };

    let prediction_listener = {
        let slot = slot.clone();
        ChannelListener::spawn("prediction", prediction_socket, move |payload, _addr| {
            match crate::channels::decode_prediction(payload) {
                Ok(values) => {
                    let c = classifier::classify(&values);
                    tracing::debug!(
                        movement = c.movement.as_str(),
                        strength = c.strength,
                        "prediction"
                    );
                    slot.publish(c);
                }
                Err(e) => tracing::warn!(error = %e, "dropping prediction datagram"),
            }
        })
        .map_err(|e| StartupError::Config(format!("prediction listener: {e}")))?
    };

    let mut control = ControlLoop::new(
        driver.clone(),
        shared,
        slot,
        Arc::new(MonotonicClock::new()),
        Duration::from_secs_f64(cfg.control.period_s),
        (extend, flex),
    );
    control.run(&shutdown);

    // Park the motors before tearing the listeners down.
    {
        let mut drv = driver.lock().unwrap_or_else(|e| e.into_inner());
        for motor in [extend, flex] {
            if let Err(e) = drv.set_target_position(motor, 0.0) {
                tracing::warn!(motor, error = %map_driver_error(&*e), "parking motor failed");
            }
        }
    }
    drop(settings_listener);
    drop(start_listener);
    drop(disconnect_listener);
    drop(prediction_listener);
    tracing::info!("controller shut down cleanly");
    Ok(())
}

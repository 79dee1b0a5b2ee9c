//! Fixed-period control loop.
//!
//! Each tick consumes the newest classification, runs the motion mapper
//! against a snapshot of the runtime configuration, and dispatches one
//! position command per motor. While the session is not Running the loop
//! touches no hardware at all and keeps its smoother and classification
//! zeroed, so a disconnect is effective by the very next cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exo_traits::{Clock, MotorDriver};

use crate::SharedState;
use crate::channels::PredictionSlot;
use crate::classifier::{Classification, Movement};
use crate::error::ControlError;
use crate::motion::{MotionMapper, effective_strength};
use crate::runtime::RuntimeConfig;

/// Map a boxed driver error to a typed kind, with precise handling for
/// known hardware errors when the `hardware-errors` feature is enabled.
pub(crate) fn map_driver_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<exo_hardware::error::HwError>() {
        return match hw {
            exo_hardware::error::HwError::Timeout => ControlError::Timeout,
            other => ControlError::Hardware(other.to_string()),
        };
    }
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ControlError::Timeout
    } else {
        ControlError::Hardware(s)
    }
}

pub struct ControlLoop<D: MotorDriver> {
    driver: Arc<Mutex<D>>,
    shared: Arc<SharedState>,
    predictions: PredictionSlot,
    clock: Arc<dyn Clock + Send + Sync>,
    period: Duration,
    extend_motor: usize,
    flex_motor: usize,
    mapper: MotionMapper,
    current: Classification,
    last_movement: Option<Movement>,
    // Impedance gains last pushed to the motors; re-pushed when a settings
    // batch changes position_kp/position_kd.
    applied_gains: Option<(f64, f64)>,
    // Whether the previous tick observed a Running session; a falling edge
    // forces both targets to rest exactly once.
    was_running: bool,
}

impl<D: MotorDriver> ControlLoop<D> {
    pub fn new(
        driver: Arc<Mutex<D>>,
        shared: Arc<SharedState>,
        predictions: PredictionSlot,
        clock: Arc<dyn Clock + Send + Sync>,
        period: Duration,
        motors: (usize, usize),
    ) -> Self {
        Self {
            driver,
            shared,
            predictions,
            clock,
            period,
            extend_motor: motors.0,
            flex_motor: motors.1,
            mapper: MotionMapper::new(),
            current: Classification::default(),
            last_movement: None,
            applied_gains: None,
            was_running: false,
        }
    }

    /// Drive ticks at the configured period until the shutdown flag rises.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        tracing::info!(period_ms = self.period.as_millis() as u64, "control loop started");
        while !shutdown.load(Ordering::Relaxed) {
            self.tick();
            self.clock.sleep(self.period);
        }
        tracing::info!("control loop stopped");
    }

    /// One control cycle. Public so tests can step deterministically.
    pub fn tick(&mut self) {
        if let Some(c) = self.predictions.latest() {
            self.current = c;
        }

        let running = self
            .shared
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_running();
        if !running {
            if self.was_running {
                // Falling edge: the disconnect handler already zeroed the
                // motors, but a dispatch racing the handler may have left a
                // stale target standing. Re-assert rest once, then idle.
                self.dispatch(self.extend_motor, 0.0);
                self.dispatch(self.flex_motor, 0.0);
                self.was_running = false;
            }
            // Safe idle: discard smoother state and the cached
            // classification so nothing stale survives into the next
            // Running period. No further hardware calls until Running.
            self.mapper.reset();
            self.current = Classification::default();
            self.last_movement = None;
            return;
        }
        self.was_running = true;

        let cfg = *self
            .shared
            .config
            .read()
            .unwrap_or_else(|e| e.into_inner());

        self.apply_impedance_gains(&cfg);

        let target = self.mapper.update(&self.current, &cfg);
        self.dispatch(self.extend_motor, target.extend);
        self.dispatch(self.flex_motor, target.flex);

        let effective = effective_strength(self.current.strength, cfg.min_movement_threshold);
        if self.last_movement != Some(self.current.movement) || effective > 0.0 {
            tracing::info!(
                movement = self.current.movement.as_str(),
                strength = effective,
                extend = target.extend,
                flex = target.flex,
                "dispatch"
            );
            self.last_movement = Some(self.current.movement);
        }
    }

    fn apply_impedance_gains(&mut self, cfg: &RuntimeConfig) {
        let gains = (cfg.position_kp, cfg.position_kd);
        if self.applied_gains == Some(gains) {
            return;
        }
        let mut driver = self.driver.lock().unwrap_or_else(|e| e.into_inner());
        for motor in [self.extend_motor, self.flex_motor] {
            if let Err(e) = driver.set_impedance_controller_params(motor, gains.0, gains.1) {
                tracing::warn!(
                    motor,
                    error = %map_driver_error(&*e),
                    "set_impedance_controller_params failed"
                );
            }
        }
        self.applied_gains = Some(gains);
    }

    /// Command one motor; a failure is logged and must not affect the
    /// other motor nor the loop.
    fn dispatch(&mut self, motor: usize, radians: f64) {
        let mut driver = self.driver.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = driver.set_target_position(motor, radians) {
            tracing::warn!(
                motor,
                error = %map_driver_error(&*e),
                "set_target_position failed"
            );
        }
    }
}

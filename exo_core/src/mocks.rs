//! Test and helper mocks for exo_core

use exo_traits::{DriverError, MotorDriver, MotorMode, MotorStatus};

/// A driver that accepts every command and reports a fixed motor count;
/// useful for wiring tests that exercise the runner without hardware.
pub struct NullDriver {
    motors: usize,
}

impl NullDriver {
    pub fn new(motors: usize) -> Self {
        Self { motors }
    }
}

impl MotorDriver for NullDriver {
    fn motor_count(&self) -> usize {
        self.motors
    }

    fn set_target_position(&mut self, _motor: usize, _radians: f64) -> Result<(), DriverError> {
        Ok(())
    }

    fn set_impedance_controller_params(
        &mut self,
        _motor: usize,
        _kp: f64,
        _kd: f64,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    fn set_only_motor_mode(&mut self, _motor: usize, _mode: MotorMode) -> Result<(), DriverError> {
        Ok(())
    }

    fn get_motor_status(&mut self, _motor: usize) -> Result<MotorStatus, DriverError> {
        Ok(MotorStatus::default())
    }
}

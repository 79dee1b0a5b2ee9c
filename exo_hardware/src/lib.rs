pub mod error;
#[cfg(feature = "hardware")]
pub mod md80;

use exo_traits::{DriverError, MotorDriver, MotorMode, MotorStatus};

use crate::error::HwError;

/// One simulated motor. Position relaxes toward the commanded target a
/// little on every status read, which is enough for tests to observe
/// motion without a physics model.
#[derive(Debug, Clone, Copy)]
struct SimMotor {
    target: f64,
    position: f64,
    velocity: f64,
    mode: MotorMode,
    kp: f64,
    kd: f64,
}

impl Default for SimMotor {
    fn default() -> Self {
        Self {
            target: 0.0,
            position: 0.0,
            velocity: 0.0,
            mode: MotorMode::Impedance,
            kp: 0.0,
            kd: 0.0,
        }
    }
}

/// Simulation backend for development without the exoskeleton attached.
pub struct SimulatedDriver {
    motors: Vec<SimMotor>,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriver {
    /// Two motors, matching the antagonist pair on the real device.
    pub fn new() -> Self {
        Self::with_motors(2)
    }

    pub fn with_motors(count: usize) -> Self {
        tracing::info!(count, "initializing simulated motor driver");
        Self {
            motors: vec![SimMotor::default(); count],
        }
    }

    /// Hold a motor's shaft at a position, as if an external force parked
    /// it there; lets tests stage limit violations and disturbances.
    pub fn force_position(&mut self, motor: usize, position: f64) -> Result<(), HwError> {
        let m = self.motor_mut(motor)?;
        m.position = position;
        m.target = position;
        Ok(())
    }

    /// Last commanded control mode of a motor.
    pub fn motor_mode(&self, motor: usize) -> Result<MotorMode, HwError> {
        self.motors
            .get(motor)
            .map(|m| m.mode)
            .ok_or(HwError::UnknownMotor(motor))
    }

    fn motor_mut(&mut self, motor: usize) -> Result<&mut SimMotor, HwError> {
        self.motors
            .get_mut(motor)
            .ok_or(HwError::UnknownMotor(motor))
    }
}

impl MotorDriver for SimulatedDriver {
    fn motor_count(&self) -> usize {
        self.motors.len()
    }

    fn set_target_position(&mut self, motor: usize, radians: f64) -> Result<(), DriverError> {
        let m = self.motor_mut(motor)?;
        m.target = radians;
        tracing::trace!(motor, radians, "sim: target position");
        Ok(())
    }

    fn set_impedance_controller_params(
        &mut self,
        motor: usize,
        kp: f64,
        kd: f64,
    ) -> Result<(), DriverError> {
        let m = self.motor_mut(motor)?;
        m.kp = kp;
        m.kd = kd;
        tracing::debug!(motor, kp, kd, "sim: impedance params");
        Ok(())
    }

    fn set_only_motor_mode(&mut self, motor: usize, mode: MotorMode) -> Result<(), DriverError> {
        let m = self.motor_mut(motor)?;
        m.mode = mode;
        tracing::debug!(motor, ?mode, "sim: motor mode");
        Ok(())
    }

    fn get_motor_status(&mut self, motor: usize) -> Result<MotorStatus, DriverError> {
        let m = self.motor_mut(motor)?;
        // First-order response: close half the gap per read.
        let gap = m.target - m.position;
        m.velocity = gap * 0.5;
        m.position += m.velocity;
        let torque = m.kp * (m.target - m.position) - m.kd * m.velocity;
        Ok(MotorStatus {
            position: m.position,
            velocity: m.velocity,
            torque,
        })
    }
}

/// Pull a motor back inside its position envelope.
///
/// Checks the measured position against `[lower, upper]`; on violation the
/// motor is re-targeted at the violated bound with soft recovery gains and
/// `true` is returned. Within the envelope nothing is commanded.
pub fn check_position_limits<D: MotorDriver + ?Sized>(
    driver: &mut D,
    motor: usize,
    lower: f64,
    upper: f64,
) -> Result<bool, DriverError> {
    const RECOVERY_KP: f64 = 5.0;
    const RECOVERY_KD: f64 = 0.0;

    let status = driver.get_motor_status(motor)?;
    if status.position >= upper {
        tracing::warn!(motor, position = status.position, upper, "position limit exceeded");
        driver.set_target_position(motor, upper)?;
        driver.set_impedance_controller_params(motor, RECOVERY_KP, RECOVERY_KD)?;
        return Ok(true);
    }
    if status.position <= lower {
        tracing::warn!(motor, position = status.position, lower, "position limit exceeded");
        driver.set_target_position(motor, lower)?;
        driver.set_impedance_controller_params(motor, RECOVERY_KP, RECOVERY_KD)?;
        return Ok(true);
    }
    Ok(false)
}

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error type used at the hardware boundary.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Control mode of a single motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorMode {
    /// Position tracking via programmable stiffness (kp) and damping (kd).
    Impedance,
    PositionPid,
    VelocityPid,
    RawTorque,
}

/// Snapshot of one motor's measured state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotorStatus {
    /// Shaft position in radians.
    pub position: f64,
    /// Shaft velocity in radians per second.
    pub velocity: f64,
    /// Output torque in newton-metres.
    pub torque: f64,
}

/// Capability contract for the two-motor drive.
///
/// Motors are addressed by index. Two implementations exist behind this
/// trait: a hardware-backed bus driver and a simulation driver; callers
/// must be indifferent to which is bound.
pub trait MotorDriver {
    /// Number of motors detected on the bus. Zero at startup is fatal for
    /// the caller; the driver itself just reports it.
    fn motor_count(&self) -> usize;

    fn set_target_position(&mut self, motor: usize, radians: f64) -> Result<(), DriverError>;

    fn set_impedance_controller_params(
        &mut self,
        motor: usize,
        kp: f64,
        kd: f64,
    ) -> Result<(), DriverError>;

    fn set_only_motor_mode(&mut self, motor: usize, mode: MotorMode) -> Result<(), DriverError>;

    fn get_motor_status(&mut self, motor: usize) -> Result<MotorStatus, DriverError>;
}

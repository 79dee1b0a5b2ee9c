use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exo_core::channels::PredictionSlot;
use exo_core::classifier::{Classification, Movement};
use exo_core::control::ControlLoop;
use exo_core::{RuntimeConfig, SharedState};
use exo_traits::{DriverError, MonotonicClock, MotorDriver, MotorMode, MotorStatus};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Call {
    Target(usize, f64),
    Impedance(usize, f64, f64),
}

/// Driver spy: records every command, optionally failing chosen motors.
#[derive(Default)]
struct SpyDriver {
    calls: Vec<Call>,
    failing: HashSet<usize>,
}

impl SpyDriver {
    fn targets(&self) -> Vec<(usize, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Target(m, p) => Some((*m, *p)),
                Call::Impedance(..) => None,
            })
            .collect()
    }
}

impl MotorDriver for SpyDriver {
    fn motor_count(&self) -> usize {
        2
    }

    fn set_target_position(&mut self, motor: usize, radians: f64) -> Result<(), DriverError> {
        if self.failing.contains(&motor) {
            return Err("bus fault".into());
        }
        self.calls.push(Call::Target(motor, radians));
        Ok(())
    }

    fn set_impedance_controller_params(
        &mut self,
        motor: usize,
        kp: f64,
        kd: f64,
    ) -> Result<(), DriverError> {
        if self.failing.contains(&motor) {
            return Err("bus fault".into());
        }
        self.calls.push(Call::Impedance(motor, kp, kd));
        Ok(())
    }

    fn set_only_motor_mode(&mut self, _motor: usize, _mode: MotorMode) -> Result<(), DriverError> {
        Ok(())
    }

    fn get_motor_status(&mut self, _motor: usize) -> Result<MotorStatus, DriverError> {
        Ok(MotorStatus::default())
    }
}

struct Rig {
    driver: Arc<Mutex<SpyDriver>>,
    shared: Arc<SharedState>,
    slot: PredictionSlot,
    control: ControlLoop<SpyDriver>,
}

fn rig() -> Rig {
    let driver = Arc::new(Mutex::new(SpyDriver::default()));
    let shared = Arc::new(SharedState::new(RuntimeConfig::default()));
    let slot = PredictionSlot::new();
    let control = ControlLoop::new(
        driver.clone(),
        shared.clone(),
        slot.clone(),
        Arc::new(MonotonicClock::new()),
        Duration::from_millis(20),
        (0, 1),
    );
    Rig {
        driver,
        shared,
        slot,
        control,
    }
}

fn make_running(rig: &Rig) {
    let mut session = rig.shared.session.lock().unwrap();
    session.settings_applied();
    assert!(session.start());
}

fn flexion(strength: f64) -> Classification {
    Classification {
        movement: Movement::Flexion,
        strength,
    }
}

#[test]
fn no_hardware_calls_while_not_running() {
    let mut r = rig();
    r.slot.publish(flexion(0.9));
    for _ in 0..5 {
        r.control.tick();
    }
    assert!(r.driver.lock().unwrap().calls.is_empty());

    // Settings alone do not unlock the hardware either.
    r.shared.session.lock().unwrap().settings_applied();
    r.control.tick();
    assert!(r.driver.lock().unwrap().calls.is_empty());
}

#[test]
fn running_dispatches_gains_then_both_targets() {
    let mut r = rig();
    make_running(&r);
    r.slot.publish(flexion(0.9));
    r.control.tick();

    let calls = r.driver.lock().unwrap().calls.clone();
    let cfg = RuntimeConfig::default();
    // First running tick pushes the seeded impedance gains once per motor.
    assert!(calls.contains(&Call::Impedance(0, cfg.position_kp, cfg.position_kd)));
    assert!(calls.contains(&Call::Impedance(1, cfg.position_kp, cfg.position_kd)));

    let targets = r.driver.lock().unwrap().targets();
    assert_eq!(targets.len(), 2);
    let (ext_motor, ext) = targets[0];
    let (flex_motor, flex) = targets[1];
    assert_eq!((ext_motor, flex_motor), (0, 1));
    assert!(ext > 0.0, "flexion drives extend motor positive");
    assert_eq!(flex, -ext);
}

#[test]
fn classification_persists_between_datagrams() {
    let mut r = rig();
    make_running(&r);
    r.slot.publish(flexion(0.9));
    r.control.tick();
    // No new datagram: the loop keeps mapping the last classification.
    r.control.tick();
    let targets = r.driver.lock().unwrap().targets();
    assert_eq!(targets.len(), 4);
    assert!(targets[2].1 > targets[0].1, "smoother keeps tracking the target");
}

#[test]
fn one_motor_failing_does_not_block_the_other() {
    let mut r = rig();
    make_running(&r);
    r.driver.lock().unwrap().failing.insert(0);
    r.slot.publish(flexion(0.9));
    r.control.tick();

    let targets = r.driver.lock().unwrap().targets();
    assert_eq!(targets.len(), 1, "only the healthy motor is recorded");
    assert_eq!(targets[0].0, 1);

    // Recovery: once the bus heals, both motors are commanded again.
    r.driver.lock().unwrap().failing.clear();
    r.control.tick();
    let targets = r.driver.lock().unwrap().targets();
    assert_eq!(targets.len(), 3);
}

#[test]
fn disconnect_zeroes_on_the_next_cycle_then_goes_silent() {
    let mut r = rig();
    make_running(&r);
    r.slot.publish(flexion(1.0));
    for _ in 0..10 {
        r.control.tick();
    }
    let last_ext = r
        .driver
        .lock()
        .unwrap()
        .targets()
        .iter()
        .rev()
        .find(|(m, _)| *m == 0)
        .unwrap()
        .1;
    assert!(last_ext > 0.0);

    r.shared.session.lock().unwrap().disconnect();
    r.control.tick();
    let targets = r.driver.lock().unwrap().targets();
    let n = targets.len();
    // The falling edge re-asserts rest on both motors exactly once.
    assert_eq!(targets[n - 2], (0, 0.0));
    assert_eq!(targets[n - 1], (1, 0.0));

    // After that, not a single hardware call until a new start.
    let before = r.driver.lock().unwrap().calls.len();
    for _ in 0..5 {
        r.control.tick();
    }
    assert_eq!(r.driver.lock().unwrap().calls.len(), before);
}

#[test]
fn restart_begins_from_a_reset_smoother() {
    let mut r = rig();
    make_running(&r);
    r.slot.publish(flexion(1.0));
    for _ in 0..10 {
        r.control.tick();
    }
    r.shared.session.lock().unwrap().disconnect();
    r.control.tick();

    assert!(r.shared.session.lock().unwrap().start());
    r.slot.publish(flexion(1.0));
    r.control.tick();

    // First post-restart target equals the first-ever smoother step: the
    // accumulator was zeroed, not resumed.
    let cfg = RuntimeConfig::default();
    let raw = cfg.upper_position_limit * 1.0 * cfg.flexion_strength_scale * cfg.movement_speed;
    let expected = cfg.smoothing_factor * raw;
    let t = *r.driver.lock().unwrap().targets().last().unwrap();
    assert!((t.1 - -expected).abs() < 1e-12, "flex target {} vs {}", t.1, -expected);
}

#[test]
fn impedance_gains_reapply_when_settings_change() {
    let mut r = rig();
    make_running(&r);
    r.control.tick();
    {
        let mut cfg = r.shared.config.write().unwrap();
        cfg.position_kp = 12.0;
        cfg.position_kd = 1.5;
    }
    r.control.tick();
    let calls = r.driver.lock().unwrap().calls.clone();
    assert!(calls.contains(&Call::Impedance(0, 12.0, 1.5)));
    assert!(calls.contains(&Call::Impedance(1, 12.0, 1.5)));
}

//! MD80 motor bus backend over a USB-serial CAN adapter.
//!
//! Frame layout (both directions):
//! `[0xAA, command, id_lo, id_hi, len, payload.., checksum]` where the
//! checksum is the wrapping byte sum of everything before it. The adapter
//! forwards frames onto the CAN bus and answers with the same framing.
//! Motor indices map to bus ids through the ping-discovered id table.

use std::io::{Read, Write};
use std::time::Duration;

use exo_traits::{DriverError, MotorDriver, MotorMode, MotorStatus};

use crate::error::HwError;

const HEADER: u8 = 0xAA;

const CMD_PING: u8 = 0x01;
const CMD_ENABLE: u8 = 0x02;
const CMD_SET_MODE: u8 = 0x03;
const CMD_SET_POSITION: u8 = 0x10;
const CMD_SET_IMPEDANCE: u8 = 0x11;
const CMD_GET_STATUS: u8 = 0x20;
const CMD_ZERO_ENCODER: u8 = 0x21;

/// Maximum motors a single ping response can report.
const MAX_MOTORS: usize = 16;

fn mode_code(mode: MotorMode) -> u8 {
    match mode {
        MotorMode::Impedance => 0,
        MotorMode::PositionPid => 1,
        MotorMode::VelocityPid => 2,
        MotorMode::RawTorque => 3,
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

fn map_io(e: std::io::Error) -> HwError {
    if e.kind() == std::io::ErrorKind::TimedOut {
        HwError::Timeout
    } else {
        HwError::Io(e)
    }
}

pub struct Md80Driver {
    port: Box<dyn serialport::SerialPort>,
    ids: Vec<u16>,
}

impl Md80Driver {
    /// Open the adapter, discover motors and enable each of them.
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self, HwError> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .map_err(|e| HwError::Bus(format!("open {path}: {e}")))?;
        let mut driver = Self {
            port,
            ids: Vec::new(),
        };
        driver.ids = driver.ping()?;
        tracing::info!(ids = ?driver.ids, "motors discovered on bus");
        for i in 0..driver.ids.len() {
            let id = driver.ids[i];
            driver.send_frame(CMD_ZERO_ENCODER, id, &[])?;
            driver.send_frame(CMD_ENABLE, id, &[1])?;
        }
        Ok(driver)
    }

    fn bus_id(&self, motor: usize) -> Result<u16, HwError> {
        self.ids
            .get(motor)
            .copied()
            .ok_or(HwError::UnknownMotor(motor))
    }

    fn send_frame(&mut self, command: u8, id: u16, payload: &[u8]) -> Result<(), HwError> {
        let mut frame = Vec::with_capacity(6 + payload.len());
        frame.push(HEADER);
        frame.push(command);
        frame.extend_from_slice(&id.to_le_bytes());
        frame.push(payload.len() as u8);
        frame.extend_from_slice(payload);
        frame.push(checksum(&frame));
        self.port.write_all(&frame).map_err(map_io)?;
        Ok(())
    }

    /// Read one response frame for `command`, returning its payload.
    fn read_frame(&mut self, command: u8) -> Result<Vec<u8>, HwError> {
        let mut head = [0u8; 5];
        self.port.read_exact(&mut head).map_err(map_io)?;
        if head[0] != HEADER || head[1] != command {
            return Err(HwError::Bus(format!(
                "unexpected frame header {:#04x}/{:#04x}",
                head[0], head[1]
            )));
        }
        let len = head[4] as usize;
        let mut rest = vec![0u8; len + 1];
        self.port.read_exact(&mut rest).map_err(map_io)?;
        let expected = checksum(&head).wrapping_add(checksum(&rest[..len]));
        if rest[len] != expected {
            return Err(HwError::Bus("frame checksum mismatch".into()));
        }
        rest.truncate(len);
        Ok(rest)
    }

    /// Broadcast a ping and collect the id table the adapter answers with.
    fn ping(&mut self) -> Result<Vec<u16>, HwError> {
        self.send_frame(CMD_PING, 0, &[])?;
        let payload = self.read_frame(CMD_PING)?;
        if payload.len() % 2 != 0 || payload.len() / 2 > MAX_MOTORS {
            return Err(HwError::Bus(format!(
                "malformed ping response of {} bytes",
                payload.len()
            )));
        }
        Ok(payload
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect())
    }
}

impl MotorDriver for Md80Driver {
    fn motor_count(&self) -> usize {
        self.ids.len()
    }

    fn set_target_position(&mut self, motor: usize, radians: f64) -> Result<(), DriverError> {
        let id = self.bus_id(motor)?;
        self.send_frame(CMD_SET_POSITION, id, &(radians as f32).to_le_bytes())?;
        Ok(())
    }

    fn set_impedance_controller_params(
        &mut self,
        motor: usize,
        kp: f64,
        kd: f64,
    ) -> Result<(), DriverError> {
        let id = self.bus_id(motor)?;
        let mut payload = [0u8; 8];
        payload[..4].copy_from_slice(&(kp as f32).to_le_bytes());
        payload[4..].copy_from_slice(&(kd as f32).to_le_bytes());
        self.send_frame(CMD_SET_IMPEDANCE, id, &payload)?;
        Ok(())
    }

    fn set_only_motor_mode(&mut self, motor: usize, mode: MotorMode) -> Result<(), DriverError> {
        let id = self.bus_id(motor)?;
        self.send_frame(CMD_SET_MODE, id, &[mode_code(mode)])?;
        self.send_frame(CMD_ENABLE, id, &[1])?;
        Ok(())
    }

    fn get_motor_status(&mut self, motor: usize) -> Result<MotorStatus, DriverError> {
        let id = self.bus_id(motor)?;
        self.send_frame(CMD_GET_STATUS, id, &[])?;
        let payload = self.read_frame(CMD_GET_STATUS)?;
        if payload.len() != 12 {
            return Err(Box::new(HwError::Bus(format!(
                "status payload of {} bytes, expected 12",
                payload.len()
            ))));
        }
        let word = |i: usize| {
            f32::from_le_bytes([payload[i], payload[i + 1], payload[i + 2], payload[i + 3]])
        };
        Ok(MotorStatus {
            position: f64::from(word(0)),
            velocity: f64::from(word(4)),
            torque: f64::from(word(8)),
        })
    }
}

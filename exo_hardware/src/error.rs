use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("bus error: {0}")]
    Bus(String),
    #[error("motor bus timeout")]
    Timeout,
    #[error("unknown motor index {0}")]
    UnknownMotor(usize),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;

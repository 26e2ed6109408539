use std::io;
use thiserror::Error;

/// Conditions that leave the machine in a state it cannot continue from.
/// The driver stops the session when it sees one of these.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum MachineError {
    #[error("stack overflow: CALL at {address:#06X} with all 16 stack slots in use")]
    StackOverflow { address: u16 },

    #[error("stack underflow: RET at {address:#06X} with an empty call stack")]
    StackUnderflow { address: u16 },

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("audio device error: {0}")]
    Device(String),
}

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error(transparent)]
    Machine(#[from] MachineError),

    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Sound(#[from] SoundError),
}

//! Error types.

use std::io;

use thiserror::Error;

use crate::protocol::FRAME_SIZE;

/// Errors reported by the lighting driver.
///
/// Most of these are only surfaced in strict mode, see [`Config::strict`].
///
/// [`Config::strict`]: crate::Config::strict
#[derive(Error, Debug)]
pub enum Error {
    #[error("color must have 2 (hue, saturation) or 3 (RGB) components, got {len}")]
    InvalidColorFormat { len: usize },

    #[error("no device connected")]
    NotConnected,

    #[error("true white reference has a zero {channel} channel")]
    InvalidCorrectionReference { channel: char },

    #[error("command of {len} bytes exceeds the {max} byte frame", max = FRAME_SIZE)]
    FrameOverflow { len: usize },

    #[error("invalid device identity: {0}")]
    InvalidIdentity(String),

    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("unable to start device discovery: {0}")]
    Spawn(#[source] io::Error),
}

/// Result type with the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

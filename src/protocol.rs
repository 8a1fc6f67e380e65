//! VIA lighting command encoding.
//!
//! VIA addresses configurable firmware features through a channel selecting the
//! subsystem and an entry selecting the parameter inside it. Every command is
//! written as a single zero-padded output report.

use bytes::{BufMut, Bytes, BytesMut};

use crate::color::Hsv;
use crate::error::{Error, Result};

/// Length of every output report.
pub const FRAME_SIZE: usize = 32;

/// Set a channel entry to a value.
pub const CMD_SET_VALUE: u8 = 0x07;

/// Persist the active channel state to EEPROM.
pub const CMD_SAVE: u8 = 0x09;

/// Lighting subsystem addressed by a command.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum Channel {
    Backlight,
    RgbLight,
    #[default]
    RgbMatrix,
    Audio,
}

impl Channel {
    /// Channel ID on the wire.
    pub fn id(self) -> u8 {
        match self {
            Self::Backlight => 0x01,
            Self::RgbLight => 0x02,
            Self::RgbMatrix => 0x03,
            Self::Audio => 0x04,
        }
    }
}

/// Lighting parameter within a channel.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Entry {
    Brightness,
    Effect,
    EffectSpeed,
    Color,
}

impl Entry {
    /// Entry ID on the wire.
    pub fn id(self) -> u8 {
        match self {
            Self::Brightness => 0x01,
            Self::Effect => 0x02,
            Self::EffectSpeed => 0x03,
            Self::Color => 0x04,
        }
    }
}

/// Lighting command.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Command {
    Brightness(u8),
    Effect(u8),
    EffectSpeed(u8),
    Color { hue: u8, saturation: u8 },
    Save,
}

impl Command {
    /// Color command from the hue and saturation of an HSV value.
    pub fn color(hsv: Hsv) -> Self {
        Command::Color { hue: hsv.h, saturation: hsv.s }
    }

    /// Encode the command for a channel as a full output report.
    pub fn encode(&self, channel: Channel) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(FRAME_SIZE);

        match *self {
            Command::Brightness(value) => {
                put_value(&mut buf, channel, Entry::Brightness, &[value])
            },
            Command::Effect(value) => put_value(&mut buf, channel, Entry::Effect, &[value]),
            Command::EffectSpeed(value) => {
                put_value(&mut buf, channel, Entry::EffectSpeed, &[value])
            },
            Command::Color { hue, saturation } => {
                put_value(&mut buf, channel, Entry::Color, &[hue, saturation])
            },
            // Save carries no entry, the device persists whatever is active.
            Command::Save => buf.put_slice(&[CMD_SAVE, channel.id()]),
        }

        frame(&buf)
    }
}

/// Write a set value command header followed by its payload.
fn put_value(buf: &mut BytesMut, channel: Channel, entry: Entry, payload: &[u8]) {
    buf.put_u8(CMD_SET_VALUE);
    buf.put_u8(channel.id());
    buf.put_u8(entry.id());
    buf.put_slice(payload);
}

/// Zero-pad a command to the report size.
pub fn frame(command: &[u8]) -> Result<Bytes> {
    if command.len() > FRAME_SIZE {
        return Err(Error::FrameOverflow { len: command.len() });
    }

    let mut buf = BytesMut::with_capacity(FRAME_SIZE);
    buf.put_slice(command);
    buf.resize(FRAME_SIZE, 0);

    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(command: &[u8]) -> Vec<u8> {
        let mut bytes = command.to_vec();
        bytes.resize(FRAME_SIZE, 0);
        bytes
    }

    #[test]
    fn set_value_commands() {
        let channel = Channel::RgbMatrix;
        assert_eq!(Command::Brightness(200).encode(channel).unwrap(), padded(&[7, 3, 1, 200]));
        assert_eq!(Command::Effect(5).encode(channel).unwrap(), padded(&[7, 3, 2, 5]));
        assert_eq!(Command::EffectSpeed(128).encode(channel).unwrap(), padded(&[7, 3, 3, 128]));

        let color = Command::Color { hue: 42, saturation: 255 };
        assert_eq!(color.encode(channel).unwrap(), padded(&[7, 3, 4, 42, 255]));
    }

    #[test]
    fn save_has_no_entry() {
        let bytes = Command::Save.encode(Channel::RgbMatrix).unwrap();
        assert_eq!(bytes.len(), FRAME_SIZE);
        assert_eq!(&bytes[..], &padded(&[9, 3])[..]);
    }

    #[test]
    fn channel_is_encoded() {
        let bytes = Command::Effect(1).encode(Channel::RgbLight).unwrap();
        assert_eq!(&bytes[..4], &[7, 2, 2, 1]);

        let bytes = Command::Save.encode(Channel::Backlight).unwrap();
        assert_eq!(&bytes[..2], &[9, 1]);
    }

    #[test]
    fn color_from_hsv_drops_value() {
        let command = Command::color(Hsv { h: 10, s: 20, v: 30 });
        assert_eq!(command, Command::Color { hue: 10, saturation: 20 });
    }

    #[test]
    fn frame_size_limit() {
        assert_eq!(frame(&[0xff; FRAME_SIZE]).unwrap().len(), FRAME_SIZE);
        assert!(matches!(
            frame(&[0; FRAME_SIZE + 1]),
            Err(Error::FrameOverflow { len }) if len == FRAME_SIZE + 1
        ));
    }
}

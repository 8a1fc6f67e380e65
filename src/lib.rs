//! VIA RGB matrix lighting driver.
//!
//! Controls the lighting of keyboards running VIA enabled firmware through
//! the custom value commands of the VIA raw HID protocol. The VIA protocol is
//! documented at https://www.caniusevia.com/docs/specification.
//!
//! ```no_run
//! use via_rgb::{Config, DeviceIdentity, HidTransport, ViaLighting};
//!
//! let config = Config::new(DeviceIdentity::via(0x3434, 0x0361));
//! let listener = (|name: &str| println!("Connected to {name}"), || println!("Disconnected"));
//! let lighting = ViaLighting::new(HidTransport::new(), config, listener)?;
//!
//! lighting.set_color_absolute([0xff, 0x80, 0x00])?;
//! lighting.save()?;
//! # Ok::<(), via_rgb::Error>(())
//! ```

pub mod color;
pub mod error;
pub mod hid;
pub mod lighting;
pub mod protocol;
pub mod transport;

pub use crate::color::{rgb_to_hsv, ColorCorrection, Hsv, Rgb};
pub use crate::error::{Error, Result};
pub use crate::hid::{HidHandle, HidTransport};
pub use crate::lighting::{ConnectionListener, ViaLighting};
pub use crate::protocol::{Channel, Command};
pub use crate::transport::{DeviceEvents, DeviceIdentity, Transport};

/// Driver configuration.
#[derive(Default, Debug, Copy, Clone)]
pub struct Config {
    /// HID interface to connect to.
    pub identity: DeviceIdentity,

    /// Lighting channel receiving all commands.
    pub channel: Channel,

    /// Return errors instead of silently dropping commands.
    ///
    /// This covers invalid color formats, missing devices, failed writes and
    /// color correction references with a zero channel.
    pub strict: bool,
}

impl Config {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self { identity, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::new("feed:6060".parse().unwrap());
        assert_eq!(config.identity, DeviceIdentity::via(0xfeed, 0x6060));
        assert_eq!(config.channel, Channel::RgbMatrix);
        assert!(!config.strict);
    }
}

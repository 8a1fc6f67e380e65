//! HID transport abstraction.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Weak;

use crate::error::{Error, Result};

/// Usage of the VIA raw HID interface.
pub const VIA_USAGE: u16 = 0x61;

/// Usage page of the VIA raw HID interface.
pub const VIA_USAGE_PAGE: u16 = 0xff60;

/// HID interface the driver connects to.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage: u16,
    pub usage_page: u16,
}

impl DeviceIdentity {
    pub const fn new(vendor_id: u16, product_id: u16, usage: u16, usage_page: u16) -> Self {
        Self { vendor_id, product_id, usage, usage_page }
    }

    /// Identity of a device's VIA raw HID interface.
    pub const fn via(vendor_id: u16, product_id: u16) -> Self {
        Self::new(vendor_id, product_id, VIA_USAGE, VIA_USAGE_PAGE)
    }

    /// Check if an enumerated HID interface belongs to this identity.
    pub fn matches(&self, vendor_id: u16, product_id: u16, usage: u16, usage_page: u16) -> bool {
        self.vendor_id == vendor_id
            && self.product_id == product_id
            && self.usage == usage
            && self.usage_page == usage_page
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self::via(0, 0)
    }
}

/// Parse `VID:PID[:USAGE:USAGE_PAGE]` with hexadecimal fields.
impl FromStr for DeviceIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields = s
            .split(':')
            .map(|field| {
                let field = field.trim();
                let digits = field
                    .strip_prefix("0x")
                    .or_else(|| field.strip_prefix("0X"))
                    .unwrap_or(field);
                u16::from_str_radix(digits, 16)
                    .map_err(|err| Error::InvalidIdentity(format!("'{field}': {err}")))
            })
            .collect::<Result<Vec<u16>>>()?;

        match fields[..] {
            [vendor_id, product_id] => Ok(Self::via(vendor_id, product_id)),
            [vendor_id, product_id, usage, usage_page] => {
                Ok(Self::new(vendor_id, product_id, usage, usage_page))
            },
            _ => Err(Error::InvalidIdentity(format!(
                "expected VID:PID[:USAGE:USAGE_PAGE], got '{s}'"
            ))),
        }
    }
}

impl Display for DeviceIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x}:{:02x}:{:04x}",
            self.vendor_id, self.product_id, self.usage, self.usage_page
        )
    }
}

/// Receiver for device lifecycle notifications.
pub trait DeviceEvents<H>: Send + Sync {
    /// A matching device was opened.
    fn connected(&self, handle: H);

    /// The open device went away.
    fn removed(&self);
}

/// HID backend delivering output reports to a device.
pub trait Transport: Send + Sync + 'static {
    /// Open device.
    type Handle: Clone + Send + Sync + 'static;

    /// Start looking for devices matching `identity`.
    ///
    /// Discovery runs in the background; this returns without waiting for a
    /// device. The transport must only hold on to the weak `events` reference
    /// and stop once it can no longer be upgraded.
    fn watch(
        &self,
        identity: DeviceIdentity,
        events: Weak<dyn DeviceEvents<Self::Handle>>,
    ) -> Result<()>;

    /// Product name advertised by the device.
    fn product_name(&self, handle: &Self::Handle) -> String;

    /// Write an output report.
    ///
    /// `report_id` is the command ID in the first byte of `report`. The device
    /// must receive `report` unchanged, starting with that byte.
    fn send_report(&self, handle: &Self::Handle, report_id: u8, report: &[u8]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_vid_pid() {
        let identity = DeviceIdentity::from_str("0x3434:0361").unwrap();
        assert_eq!(identity, DeviceIdentity::new(0x3434, 0x0361, VIA_USAGE, VIA_USAGE_PAGE));
    }

    #[test]
    fn parse_full_identity() {
        let identity: DeviceIdentity = "feed:6060:0x06:0x01".parse().unwrap();
        assert_eq!(identity, DeviceIdentity::new(0xfeed, 0x6060, 0x06, 0x01));
        assert_eq!(identity.to_string(), "feed:6060:06:0001");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(matches!("feed".parse::<DeviceIdentity>(), Err(Error::InvalidIdentity(_))));
        assert!(matches!("feed:6060:61".parse::<DeviceIdentity>(), Err(Error::InvalidIdentity(_))));
        assert!(matches!("feed:zz".parse::<DeviceIdentity>(), Err(Error::InvalidIdentity(_))));
    }

    #[test]
    fn matches_all_fields() {
        let identity = DeviceIdentity::via(0xfeed, 0x6060);
        assert!(identity.matches(0xfeed, 0x6060, VIA_USAGE, VIA_USAGE_PAGE));
        assert!(!identity.matches(0xfeed, 0x6060, 0x06, 0x01));
        assert!(!identity.matches(0xfeed, 0x6061, VIA_USAGE, VIA_USAGE_PAGE));
    }
}

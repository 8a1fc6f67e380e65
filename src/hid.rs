//! hidapi backed transport.

use std::ffi::{CStr, CString};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use hidapi::{DeviceInfo, HidApi, HidDevice};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::protocol::FRAME_SIZE;
use crate::transport::{DeviceEvents, DeviceIdentity, Transport};

/// Default delay between device list scans.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Transport polling the system's HID devices.
#[derive(Debug, Copy, Clone)]
pub struct HidTransport {
    poll_interval: Duration,
}

impl HidTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change how often the device list is scanned for connects and removals.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl Default for HidTransport {
    fn default() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }
}

/// Open HID interface.
#[derive(Clone)]
pub struct HidHandle {
    device: Arc<Mutex<HidDevice>>,
    product_name: String,
}

impl HidHandle {
    fn new(device: HidDevice, info: &DeviceInfo) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            product_name: info.product_string().unwrap_or_default().to_owned(),
        }
    }
}

impl Transport for HidTransport {
    type Handle = HidHandle;

    fn watch(
        &self,
        identity: DeviceIdentity,
        events: Weak<dyn DeviceEvents<HidHandle>>,
    ) -> Result<()> {
        let poll_interval = self.poll_interval;

        thread::Builder::new()
            .name("via-discovery".into())
            .spawn(move || watch_devices(identity, poll_interval, events))
            .map_err(Error::Spawn)?;

        Ok(())
    }

    fn product_name(&self, handle: &HidHandle) -> String {
        handle.product_name.clone()
    }

    /// Write a frame to the VIA interface.
    ///
    /// VIA raw HID interfaces do not use numbered reports, the command ID in
    /// `report_id` is already the first byte of the frame.
    fn send_report(&self, handle: &HidHandle, report_id: u8, report: &[u8]) -> Result<()> {
        debug_assert_eq!(report.first(), Some(&report_id));

        handle.device.lock().write(&output_report(report))?;

        Ok(())
    }
}

/// Prefix a frame with hidapi's report ID for unnumbered reports.
fn output_report(frame: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(FRAME_SIZE + 1);

    // Report ID.
    buf.put_u8(0x00);

    // Frame, starting with the command ID.
    buf.put_slice(frame);

    buf
}

/// Track the first interface matching `identity` until `events` is dropped.
fn watch_devices(
    identity: DeviceIdentity,
    poll_interval: Duration,
    events: Weak<dyn DeviceEvents<HidHandle>>,
) {
    let mut api = match HidApi::new() {
        Ok(api) => api,
        Err(err) => {
            error!("Unable to access HID: {}", err);
            return;
        },
    };

    info!("Watching for HID device {}", identity);

    // Path of the currently open interface.
    let mut current: Option<CString> = None;

    loop {
        let events = match events.upgrade() {
            Some(events) => events,
            None => break,
        };

        if let Err(err) = api.refresh_devices() {
            warn!("Unable to refresh HID devices: {}", err);
        }

        let matching: Vec<DeviceInfo> = api
            .device_list()
            .filter(|info| {
                let (vid, pid) = (info.vendor_id(), info.product_id());
                identity.matches(vid, pid, info.usage(), info.usage_page())
            })
            .cloned()
            .collect();

        let still_present = match &current {
            Some(path) => contains_path(matching.iter().map(DeviceInfo::path), path),
            None => false,
        };

        if current.is_some() && !still_present {
            debug!("HID device {} removed", identity);
            current = None;
            events.removed();
        }

        match matching.into_iter().next() {
            Some(info) if current.is_none() => match info.open_device(&api) {
                Ok(device) => {
                    debug!("Opened HID device {} at {:?}", identity, info.path());
                    current = Some(info.path().to_owned());
                    events.connected(HidHandle::new(device, &info));
                },
                Err(err) => debug!("Unable to open HID device {}: {}", identity, err),
            },
            _ => (),
        }

        drop(events);
        thread::sleep(poll_interval);
    }

    debug!("Stopped watching for HID device {}", identity);
}

/// Check if any of the matching interface paths is `path`.
fn contains_path<'a>(mut paths: impl Iterator<Item = &'a CStr>, path: &CStr) -> bool {
    paths.any(|candidate| candidate == path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Channel, Command};

    struct Ignore;

    impl DeviceEvents<HidHandle> for Ignore {
        fn connected(&self, _handle: HidHandle) {}

        fn removed(&self) {}
    }

    #[test]
    fn output_report_is_unnumbered() {
        for command in [Command::Brightness(100), Command::Save].iter() {
            let frame = command.encode(Channel::RgbMatrix).unwrap();
            let report = output_report(&frame);

            assert_eq!(report.len(), FRAME_SIZE + 1);
            assert_eq!(report[0], 0x00);
            assert_eq!(&report[1..], &frame[..]);
        }
    }

    #[test]
    fn output_report_keeps_command_first() {
        let frame = Command::Brightness(100).encode(Channel::RgbMatrix).unwrap();
        assert_eq!(&output_report(&frame)[..5], &[0, 7, 3, 1, 100]);

        let frame = Command::Save.encode(Channel::RgbMatrix).unwrap();
        assert_eq!(&output_report(&frame)[..3], &[0, 9, 3]);
    }

    #[test]
    fn open_device_found_anywhere_in_list() {
        let first = CString::new("/dev/hidraw3").unwrap();
        let second = CString::new("/dev/hidraw5").unwrap();
        let paths = [first.as_c_str(), second.as_c_str()];

        // Enumeration order changing must not look like a removal.
        assert!(contains_path(paths.iter().copied(), &second));
        assert!(contains_path(paths.iter().rev().copied(), &second));

        let gone = CString::new("/dev/hidraw7").unwrap();
        assert!(!contains_path(paths.iter().copied(), &gone));
        assert!(!contains_path(std::iter::empty(), &first));
    }

    #[test]
    fn default_poll_interval() {
        assert_eq!(HidTransport::new().poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn watcher_exits_without_listener() {
        let events: Arc<dyn DeviceEvents<HidHandle>> = Arc::new(Ignore);
        let weak = Arc::downgrade(&events);
        drop(events);

        // Returns immediately, either without HID access or on the dead listener.
        watch_devices(DeviceIdentity::via(0xfeed, 0x6060), Duration::from_secs(60), weak);
    }
}

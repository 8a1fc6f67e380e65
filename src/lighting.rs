//! Lighting control for a single VIA keyboard.

use std::sync::{Arc, Weak};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::color::{self, rgb_to_hsv, ColorCorrection, Rgb};
use crate::error::{Error, Result};
use crate::protocol::Command;
use crate::transport::{DeviceEvents, Transport};
use crate::Config;

/// Callbacks for device connection changes.
pub trait ConnectionListener: Send + Sync {
    /// A device was connected.
    fn on_connected(&self, _device_name: &str) {}

    /// The connected device was removed.
    fn on_disconnected(&self) {}
}

impl ConnectionListener for () {}

/// Listener from an `(on_connected, on_disconnected)` closure pair.
impl<C, D> ConnectionListener for (C, D)
where
    C: Fn(&str) + Send + Sync,
    D: Fn() + Send + Sync,
{
    fn on_connected(&self, device_name: &str) {
        (self.0)(device_name)
    }

    fn on_disconnected(&self) {
        (self.1)()
    }
}

/// Connected device.
struct Device<H> {
    handle: H,
    product_name: String,
}

/// State shared with the transport's discovery.
struct Shared<T: Transport> {
    transport: T,
    config: Config,
    device: Mutex<Option<Device<T::Handle>>>,
    correction: Mutex<Option<ColorCorrection>>,
    listener: Box<dyn ConnectionListener>,
}

impl<T: Transport> DeviceEvents<T::Handle> for Shared<T> {
    fn connected(&self, handle: T::Handle) {
        let product_name = self.transport.product_name(&handle);
        info!("Connected to {}", product_name);

        *self.device.lock() = Some(Device { handle, product_name: product_name.clone() });

        self.listener.on_connected(&product_name);
    }

    fn removed(&self) {
        let device = self.device.lock().take();

        if let Some(device) = device {
            info!("Disconnected from {}", device.product_name);
            self.listener.on_disconnected();
        }
    }
}

/// VIA RGB lighting driver.
///
/// Commands are fire and forget. Unless [`Config::strict`] is set, commands
/// which cannot be delivered are dropped and the setters return `Ok(())`.
pub struct ViaLighting<T: Transport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> ViaLighting<T> {
    /// Create the driver and start looking for the configured device.
    ///
    /// This does not wait for a device, the `listener` is notified once one is
    /// connected.
    pub fn new<L>(transport: T, config: Config, listener: L) -> Result<Self>
    where
        L: ConnectionListener + 'static,
    {
        let shared = Arc::new(Shared {
            transport,
            config,
            device: Mutex::new(None),
            correction: Mutex::new(None),
            listener: Box::new(listener),
        });

        let events: Weak<dyn DeviceEvents<T::Handle>> = Arc::<Shared<T>>::downgrade(&shared);
        shared.transport.watch(config.identity, events)?;

        Ok(Self { shared })
    }

    /// Set the LED brightness.
    pub fn set_brightness(&self, brightness: u8) -> Result<()> {
        self.submit(&[Command::Brightness(brightness)])
    }

    /// Set the active effect.
    pub fn set_effect(&self, effect: u8) -> Result<()> {
        self.submit(&[Command::Effect(effect)])
    }

    /// Set the speed of the active effect.
    pub fn set_effect_speed(&self, speed: u8) -> Result<()> {
        self.submit(&[Command::EffectSpeed(speed)])
    }

    /// Set the effect color.
    ///
    /// Accepts either an RGB triple or a raw `[hue, saturation]` pair. The
    /// brightness of RGB colors is discarded, use [`Self::set_color_absolute`]
    /// to apply it as well.
    pub fn set_color(&self, components: &[u8]) -> Result<()> {
        let command = match *components {
            [r, g, b] => Command::color(Rgb::new(r, g, b).into()),
            [hue, saturation] => Command::Color { hue, saturation },
            _ => return self.degrade(Error::InvalidColorFormat { len: components.len() }),
        };

        self.submit(&[command])
    }

    /// Set color and brightness from an RGB color.
    ///
    /// The color correction is applied first, if enabled.
    pub fn set_color_absolute(&self, rgb: impl Into<Rgb>) -> Result<()> {
        let rgb = rgb.into();

        let correction = *self.shared.correction.lock();
        let corrected = match correction {
            Some(correction) => correction.apply(rgb),
            None => rgb,
        };

        let hsv = rgb_to_hsv(corrected);
        debug!("Absolute color {} corrected to {} ({:?})", rgb, corrected, hsv);

        // Color must be sent before brightness.
        self.submit(&[Command::color(hsv), Command::Brightness(hsv.v)])
    }

    /// Persist the current lighting configuration on the device.
    pub fn save(&self) -> Result<()> {
        self.submit(&[Command::Save])
    }

    /// Enable color correction for the keyboard's actual white point.
    ///
    /// `true_white` is the RGB value which appears white on the device.
    pub fn set_color_correction(&self, true_white: impl Into<Rgb>) -> Result<()> {
        let true_white = true_white.into();

        if let Some(channel) = color::zero_channel(true_white) {
            if self.shared.config.strict {
                return Err(Error::InvalidCorrectionReference { channel });
            }

            warn!("True white {} has no {} channel, it will always be off", true_white, channel);
        }

        *self.shared.correction.lock() = Some(ColorCorrection::from_true_white(true_white));

        Ok(())
    }

    /// Send absolute colors without correction.
    pub fn disable_color_correction(&self) {
        *self.shared.correction.lock() = None;
    }

    /// Active color correction.
    pub fn color_correction(&self) -> Option<ColorCorrection> {
        *self.shared.correction.lock()
    }

    /// Check if a device is currently connected.
    pub fn is_connected(&self) -> bool {
        self.shared.device.lock().is_some()
    }

    /// Product name of the connected device.
    pub fn product_name(&self) -> Option<String> {
        self.shared.device.lock().as_ref().map(|device| device.product_name.clone())
    }

    /// Configuration the driver was created with.
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Transport delivering the reports.
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// Encode commands and write them to the connected device in order.
    fn submit(&self, commands: &[Command]) -> Result<()> {
        let channel = self.shared.config.channel;
        let frames = commands
            .iter()
            .map(|command| command.encode(channel))
            .collect::<Result<Vec<Bytes>>>()?;

        // Clone the handle so the slot is not locked during the write.
        let handle = self.shared.device.lock().as_ref().map(|device| device.handle.clone());
        let handle = match handle {
            Some(handle) => handle,
            None => return self.degrade(Error::NotConnected),
        };

        for frame in frames {
            trace!("Writing report {:02x?}", &frame[..]);

            if let Err(err) = self.shared.transport.send_report(&handle, frame[0], &frame) {
                return self.degrade(err);
            }
        }

        Ok(())
    }

    /// Surface an error in strict mode, otherwise drop the command.
    fn degrade(&self, err: Error) -> Result<()> {
        if self.shared.config.strict {
            return Err(err);
        }

        match err {
            Error::NotConnected => debug!("Dropping command: {}", err),
            err => warn!("Dropping command: {}", err),
        }

        Ok(())
    }
}

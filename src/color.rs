//! Color model conversions.

use std::fmt::{self, Display, Formatter};

/// RGB color.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self { r: 0xff, g: 0xff, b: 0xff };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels in R, G, B order.
    fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// HSV color with every component scaled to a full byte.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl From<Rgb> for Hsv {
    fn from(rgb: Rgb) -> Self {
        rgb_to_hsv(rgb)
    }
}

/// Convert RGB to byte scaled HSV.
///
/// Achromatic colors are detected through exact float equality, so the sector
/// is picked by whichever channel compares equal to the maximum first.
pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let r = f64::from(rgb.r) / 255.;
    let g = f64::from(rgb.g) / 255.;
    let b = f64::from(rgb.b) / 255.;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = to_byte(max);

    if delta == 0. {
        return Hsv { h: 0, s: 0, v };
    }

    let saturation = delta / max;

    let sector = if max == r {
        (g - b) / delta
    } else if max == g {
        2. + (b - r) / delta
    } else {
        4. + (r - g) / delta
    };

    let mut hue = sector * 60.;
    if hue < 0. {
        hue += 360.;
    }

    Hsv { h: to_byte(hue / 360.), s: to_byte(saturation), v }
}

/// Scale a unit interval value to a rounded byte.
fn to_byte(value: f64) -> u8 {
    (value * 255.).round() as u8
}

/// Per-channel white point correction.
///
/// Scales colors so the keyboard's actual white maps to full intensity on every
/// channel.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct ColorCorrection {
    factors: [f64; 3],
}

impl ColorCorrection {
    /// Create the correction from the RGB value which looks white on the device.
    ///
    /// A zero channel produces an infinite factor, which turns that channel off
    /// once applied.
    pub fn from_true_white(true_white: Rgb) -> Self {
        let [r, g, b] = true_white.channels();
        Self { factors: [factor(r), factor(g), factor(b)] }
    }

    /// Scale factors in R, G, B order.
    pub fn factors(&self) -> [f64; 3] {
        self.factors
    }

    /// Apply the correction to a color.
    pub fn apply(&self, color: Rgb) -> Rgb {
        let [r, g, b] = color.channels();
        let [fr, fg, fb] = self.factors;

        // Float to integer casts saturate, which also absorbs infinite factors.
        Rgb {
            r: (f64::from(r) / fr) as u8,
            g: (f64::from(g) / fg) as u8,
            b: (f64::from(b) / fb) as u8,
        }
    }
}

/// Correction factor for a single white point channel.
fn factor(white: u8) -> f64 {
    255. / f64::from(white)
}

/// First channel of a color which is zero.
pub(crate) fn zero_channel(color: Rgb) -> Option<char> {
    ['r', 'g', 'b']
        .iter()
        .zip(color.channels().iter())
        .find(|(_, value)| **value == 0)
        .map(|(name, _)| *name)
}

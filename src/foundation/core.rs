use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::{Affine, Point, Vec2};

/// Output canvas size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Validate that the canvas can be encoded as yuv420p.
    pub fn validate(self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if u16::try_from(self.width).is_err() || u16::try_from(self.height).is_err() {
            return Err(ReelError::validation("canvas width/height must fit in u16"));
        }
        Ok(())
    }
}

/// Rational frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator, must be > 0.
    pub den: u32,
}

impl Fps {
    /// Build a validated frame rate.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Wall-clock milliseconds covered by `frames` output frames, rounded to nearest.
    pub fn frames_to_ms(self, frames: u64) -> u64 {
        let num = u128::from(self.num);
        let ms = (u128::from(frames) * 1000 * u128::from(self.den) + num / 2) / num;
        u64::try_from(ms).unwrap_or(u64::MAX)
    }

    /// Number of whole output frames that fit in `ms` milliseconds.
    pub fn ms_to_frames(self, ms: u64) -> u64 {
        let frames = u128::from(ms) * u128::from(self.num) / (1000 * u128::from(self.den));
        u64::try_from(frames).unwrap_or(u64::MAX)
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(s: &str) -> ReelResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ReelError::validation(format!("color '{s}' must start with '#'")))?;
        let nibble = |c: u8| -> ReelResult<u8> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| ReelError::validation(format!("color '{s}' has non-hex digits")))
        };
        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => {
                let r = nibble(bytes[0])?;
                let g = nibble(bytes[1])?;
                let b = nibble(bytes[2])?;
                Ok(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 | 8 => {
                let mut ch = [255u8; 4];
                for (i, pair) in bytes.chunks_exact(2).enumerate() {
                    ch[i] = nibble(pair[0])? << 4 | nibble(pair[1])?;
                }
                Ok(Self {
                    r: ch[0],
                    g: ch[1],
                    b: ch[2],
                    a: ch[3],
                })
            }
            _ => Err(ReelError::validation(format!(
                "color '{s}' must have 3, 6 or 8 hex digits"
            ))),
        }
    }

    /// Channels as an array.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

//! Rig placement presets.
//!
//! Text form: `<mode>;<target>;<unit>;<x>;<y>;<width>;<height>`, where unit
//! is `px` (pixels) or `%` (fractions of the display size).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::camera::PixelRect;
use crate::error::PresetError;
use crate::follow::FollowMode;

/// Host display size in pixels.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplaySize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    Pixels,
    /// Fraction of the display size (`0.5` is half the screen).
    Fraction,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Pixels => "px",
            Unit::Fraction => "%",
        }
    }
}

impl FromStr for Unit {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "px" => Ok(Unit::Pixels),
            "%" => Ok(Unit::Fraction),
            other => Err(PresetError::UnknownUnit(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DronePreset {
    pub mode: FollowMode,
    /// Preferred target username; empty picks the first valid target.
    pub target: String,
    pub unit: Unit,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DronePreset {
    /// Resolve to a pixel rect, enforcing `min_size` on width and height.
    pub fn to_pixels(&self, display: DisplaySize, min_size: u32) -> PixelRect {
        let (sx, sy) = match self.unit {
            Unit::Pixels => (1.0, 1.0),
            Unit::Fraction => (display.width as f32, display.height as f32),
        };
        let min = min_size as f32;
        PixelRect {
            x: (self.x * sx).round() as i32,
            y: (self.y * sy).round() as i32,
            width: (self.width * sx).round().max(min) as u32,
            height: (self.height * sy).round().max(min) as u32,
        }
    }

    /// Inverse of [`to_pixels`](Self::to_pixels) for a placed rig.
    pub fn capture(
        mode: FollowMode,
        target: &str,
        rect: &PixelRect,
        unit: Unit,
        display: DisplaySize,
    ) -> Self {
        let (sx, sy) = match unit {
            Unit::Pixels => (1.0, 1.0),
            Unit::Fraction => (
                display.width.max(1) as f32,
                display.height.max(1) as f32,
            ),
        };
        Self {
            mode,
            target: target.to_string(),
            unit,
            x: rect.x as f32 / sx,
            y: rect.y as f32 / sy,
            width: rect.width as f32 / sx,
            height: rect.height as f32 / sy,
        }
    }
}

fn number(field: &'static str, raw: &str) -> Result<f32, PresetError> {
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(PresetError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

impl FromStr for DronePreset {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(';').collect();
        let [mode, target, unit, x, y, width, height] = parts[..] else {
            return Err(PresetError::FieldCount(parts.len()));
        };
        let mode = FollowMode::from_name(mode)
            .ok_or_else(|| PresetError::UnknownMode(mode.trim().to_string()))?;
        Ok(Self {
            mode,
            target: target.trim().to_string(),
            unit: unit.parse()?,
            x: number("x", x)?,
            y: number("y", y)?,
            width: number("width", width)?,
            height: number("height", height)?,
        })
    }
}

impl fmt::Display for DronePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{};{};{};{}",
            self.mode,
            self.target,
            self.unit.as_str(),
            self.x,
            self.y,
            self.width,
            self.height
        )
    }
}

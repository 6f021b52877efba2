//! Tuning and sizing configuration for rigs.
//!
//! Values are plain arrays/scalars so the config round-trips through JSON
//! without any math-type serde support. Defaults match the shipped camera
//! tuning.

use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::DroneError;
use crate::follow::FollowMode;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoDroneConfig {
    pub tuning: FollowTuning,
    pub fov: FovTuning,
    pub recovery: RecoveryCfg,
    pub surface: SurfaceCfg,
    /// Close every open rig before a preset group spawns its rigs.
    pub clear_on_preset: bool,
}

impl Default for PhotoDroneConfig {
    fn default() -> Self {
        Self {
            tuning: FollowTuning::default(),
            fov: FovTuning::default(),
            recovery: RecoveryCfg::default(),
            surface: SurfaceCfg::default(),
            clear_on_preset: true,
        }
    }
}

impl PhotoDroneConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults.
    pub fn from_json_str(s: &str) -> Result<Self, DroneError> {
        serde_json::from_str(s).map_err(|e| DroneError::Config(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, DroneError> {
        serde_json::to_string_pretty(self).map_err(|e| DroneError::Config(e.to_string()))
    }
}

/// Per-mode offsets and follow rates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowTuning {
    /// Target-local offset used by Smooth/Strict and by initial binding.
    pub follow_offset: [f32; 3],
    pub first_person_offset: [f32; 3],
    pub bumper_offset: [f32; 3],
    pub locked_offset: [f32; 3],
    /// Euler tilt (degrees) composed onto the target rotation in Locked mode.
    pub locked_tilt_degrees: [f32; 3],
    pub look_ahead_distance: f32,
    /// Easing rate for Smooth mode; multiplied by dt without clamping.
    pub smooth_follow_speed: f32,
}

impl Default for FollowTuning {
    fn default() -> Self {
        Self {
            follow_offset: [0.0, 2.0, -3.0],
            first_person_offset: [0.0, 0.2, 2.2],
            bumper_offset: [0.0, 0.5, 3.5],
            locked_offset: [0.0, 1.7, -3.0],
            locked_tilt_degrees: [6.0, 0.0, 0.0],
            look_ahead_distance: 5.0,
            smooth_follow_speed: 5.0,
        }
    }
}

impl FollowTuning {
    #[inline]
    pub fn follow_offset(&self) -> Vec3 {
        Vec3::from_array(self.follow_offset)
    }

    #[inline]
    pub fn first_person_offset(&self) -> Vec3 {
        Vec3::from_array(self.first_person_offset)
    }

    #[inline]
    pub fn bumper_offset(&self) -> Vec3 {
        Vec3::from_array(self.bumper_offset)
    }

    #[inline]
    pub fn locked_offset(&self) -> Vec3 {
        Vec3::from_array(self.locked_offset)
    }

    #[inline]
    pub fn locked_tilt(&self) -> Vec3 {
        Vec3::from_array(self.locked_tilt_degrees)
    }
}

/// Field-of-view values (degrees) applied when a follow mode is selected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FovTuning {
    /// Initial FOV of a freshly created camera pair.
    pub base: f32,
    pub smooth: f32,
    pub strict: f32,
    pub locked: f32,
    pub bumper: f32,
    pub first: f32,
    /// Clamp range for explicit FOV requests.
    pub min: f32,
    pub max: f32,
}

impl Default for FovTuning {
    fn default() -> Self {
        Self {
            base: 60.0,
            smooth: 60.0,
            strict: 60.0,
            locked: 50.0,
            bumper: 70.0,
            first: 90.0,
            min: 1.0,
            max: 135.0,
        }
    }
}

impl FovTuning {
    pub fn for_mode(&self, mode: FollowMode) -> f32 {
        match mode {
            FollowMode::Smooth => self.smooth,
            FollowMode::Strict => self.strict,
            FollowMode::Locked => self.locked,
            FollowMode::Bumper => self.bumper,
            FollowMode::First => self.first,
        }
    }

    pub fn clamp(&self, fov: f32) -> f32 {
        fov.clamp(self.min, self.max)
    }
}

/// Recovery window after losing a followed target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryCfg {
    pub poll_interval: f32,
    pub timeout: f32,
}

impl Default for RecoveryCfg {
    fn default() -> Self {
        Self {
            poll_interval: 0.25,
            timeout: 3.0,
        }
    }
}

/// Render surface sizing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceCfg {
    pub default_width: u32,
    pub default_height: u32,
    /// Smallest width/height a preset placement may request, in pixels.
    pub min_preset_size: u32,
}

impl Default for SurfaceCfg {
    fn default() -> Self {
        Self {
            default_width: 320,
            default_height: 240,
            min_preset_size: 100,
        }
    }
}

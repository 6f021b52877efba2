//! Camera pair, render surface and per-rig display state.
//!
//! The two cameras of a rig are only reachable through pair-wide setters, so
//! they cannot drift apart in field of view, projection, enabled flag or
//! surface binding. Both sit at the rig origin.

use serde::{Deserialize, Serialize};

use crate::math::Pose;

/// Render layer of one camera in the pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CameraLayer {
    /// Scene geometry, drawn second.
    Primary,
    /// Skybox, drawn first.
    Background,
}

impl CameraLayer {
    pub const BOTH: [CameraLayer; 2] = [CameraLayer::Background, CameraLayer::Primary];

    /// Draw order; higher draws later.
    pub fn depth(self) -> i32 {
        match self {
            CameraLayer::Primary => 1,
            CameraLayer::Background => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraPair {
    fov: f32,
    orthographic: bool,
    enabled: bool,
    surface_generation: u32,
}

impl CameraPair {
    pub fn new(fov: f32) -> Self {
        Self {
            fov,
            orthographic: false,
            enabled: true,
            surface_generation: 0,
        }
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    #[inline]
    pub fn orthographic(&self) -> bool {
        self.orthographic
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Generation of the render surface both cameras draw into.
    #[inline]
    pub fn surface_generation(&self) -> u32 {
        self.surface_generation
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }

    pub fn set_orthographic(&mut self, orthographic: bool) {
        self.orthographic = orthographic;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn bind_surface(&mut self, surface: &RenderSurface) {
        self.surface_generation = surface.generation();
    }
}

/// Rig transform plus its cameras; the part of a rig playback and follow
/// both write to.
#[derive(Clone, Debug, PartialEq)]
pub struct RigBody {
    pub pose: Pose,
    pub cameras: CameraPair,
}

impl RigBody {
    pub fn new(pose: Pose, fov: f32) -> Self {
        Self {
            pose,
            cameras: CameraPair::new(fov),
        }
    }
}

/// Backing texture of a rig. Each resize bumps the generation; hosts
/// recreate their texture when it changes.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSurface {
    width: u32,
    height: u32,
    generation: u32,
    released: bool,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            generation: 0,
            released: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Recreate the surface at a new size and rebind both cameras. Returns
    /// false when the size is unchanged or the surface is gone.
    pub fn resize(&mut self, width: u32, height: u32, cameras: &mut CameraPair) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if self.released || (width == self.width && height == self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.generation = self.generation.wrapping_add(1);
        cameras.bind_surface(self);
        true
    }

    /// Release the surface. Only the first call has an effect.
    pub fn release(&mut self) -> bool {
        !std::mem::replace(&mut self.released, true)
    }
}

/// Screen-space placement of a rig window, top-left origin.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Host UI state owned by a rig. The core only tracks flags; drawing is the
/// host's job.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayElements {
    pub attached: bool,
    pub window_visible: bool,
    /// Target name label.
    pub name_label: bool,
    /// Speed/input readouts, only meaningful for remote targets.
    pub telemetry: bool,
    pub locked: bool,
    pub label: String,
}

impl Default for DisplayElements {
    fn default() -> Self {
        Self {
            attached: true,
            window_visible: true,
            name_label: true,
            telemetry: true,
            locked: false,
            label: String::new(),
        }
    }
}

impl DisplayElements {
    /// Flags shown while a rig follows a live target.
    pub fn show_follow(&mut self, remote_target: bool) {
        self.name_label = true;
        self.telemetry = remote_target;
    }

    /// Cinematic rigs hide every target-related element.
    pub fn hide_follow(&mut self) {
        self.name_label = false;
        self.telemetry = false;
    }

    /// Detach from the host UI. Only the first call has an effect.
    pub fn detach(&mut self) -> bool {
        let was = self.attached;
        self.attached = false;
        self.window_visible = false;
        was
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_rebinds_cameras_and_bumps_generation() {
        let mut cams = CameraPair::new(60.0);
        let mut surface = RenderSurface::new(320, 240);
        cams.bind_surface(&surface);
        assert!(surface.resize(640, 360, &mut cams));
        assert_eq!(surface.generation(), 1);
        assert_eq!(cams.surface_generation(), 1);
        assert!(!surface.resize(640, 360, &mut cams));
        assert_eq!(surface.generation(), 1);
    }

    #[test]
    fn release_and_detach_happen_once() {
        let mut surface = RenderSurface::new(320, 240);
        assert!(surface.release());
        assert!(!surface.release());
        let mut cams = CameraPair::new(60.0);
        assert!(!surface.resize(10, 10, &mut cams));

        let mut display = DisplayElements::default();
        assert!(display.detach());
        assert!(!display.detach());
    }
}

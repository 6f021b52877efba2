//! A single camera rig: body, follow/playback state, surface and display.
//!
//! Rigs are created and mutated through [`RigRegistry`](crate::RigRegistry);
//! this module holds the per-rig state machine. One tick runs, in order: the
//! recovery poll, playback, then the follow controller when the rig is under
//! follow control and holds a target.

use log::{debug, info, warn};

use crate::camera::{CameraPair, DisplayElements, PixelRect, RenderSurface, RigBody};
use crate::config::{PhotoDroneConfig, RecoveryCfg};
use crate::error::FollowError;
use crate::follow::{FollowController, FollowMode};
use crate::ids::RigId;
use crate::math::Pose;
use crate::outputs::{DestroyReason, RigEvent, RigFrame, SurfaceInfo};
use crate::playback::{Control, PlaybackEngine};
use crate::preset::{DisplaySize, DronePreset, Unit};
use crate::recovery::{RecoveryPoll, RecoveryTimer};
use crate::roster::{first_valid_target, resolve_follow_target, Anchor, Roster, RosterEntry, TargetHandle};
use crate::script::Script;

/// Which subsystem writes the rig pose.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RigControl {
    Cinematic,
    Follow,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TargetState {
    Unbound,
    Bound {
        username: String,
        handle: TargetHandle,
        local: bool,
    },
    /// Target lost; cameras are off while the timer polls the roster.
    Recovering {
        username: String,
        timer: RecoveryTimer,
    },
}

impl TargetState {
    pub fn username(&self) -> Option<&str> {
        match self {
            TargetState::Unbound => None,
            TargetState::Bound { username, .. } | TargetState::Recovering { username, .. } => {
                Some(username)
            }
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, TargetState::Bound { .. })
    }

    pub fn is_recovering(&self) -> bool {
        matches!(self, TargetState::Recovering { .. })
    }
}

#[derive(Debug)]
pub struct Rig {
    id: RigId,
    body: RigBody,
    follow: FollowController,
    target: TargetState,
    playback: PlaybackEngine,
    surface: RenderSurface,
    display: DisplayElements,
    placement: PixelRect,
    control: RigControl,
    recovery: RecoveryCfg,
    destroyed: Option<DestroyReason>,
    events: Vec<RigEvent>,
}

impl Rig {
    pub(crate) fn new(id: RigId, cfg: &PhotoDroneConfig, cinematic: bool) -> Self {
        let mut body = RigBody::new(Pose::IDENTITY, cfg.fov.base);
        let surface = RenderSurface::new(cfg.surface.default_width, cfg.surface.default_height);
        body.cameras.bind_surface(&surface);
        let follow = FollowController::new(FollowMode::default(), cfg.tuning.clone(), cfg.fov.clone());
        follow.apply_fov(&mut body.cameras);

        let mut display = DisplayElements::default();
        if cinematic {
            display.window_visible = false;
            display.hide_follow();
        }

        let events = vec![RigEvent::Created {
            rig: id.clone(),
            cinematic,
        }];
        Self {
            placement: PixelRect {
                x: 0,
                y: 0,
                width: surface.width(),
                height: surface.height(),
            },
            id,
            body,
            follow,
            target: TargetState::Unbound,
            playback: PlaybackEngine::new(),
            surface,
            display,
            control: if cinematic {
                RigControl::Cinematic
            } else {
                RigControl::Follow
            },
            recovery: cfg.recovery.clone(),
            destroyed: None,
            events,
        }
    }

    pub fn id(&self) -> &RigId {
        &self.id
    }

    pub fn pose(&self) -> Pose {
        self.body.pose
    }

    pub fn cameras(&self) -> &CameraPair {
        &self.body.cameras
    }

    pub fn follow_mode(&self) -> FollowMode {
        self.follow.mode()
    }

    pub fn target(&self) -> &TargetState {
        &self.target
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target.username()
    }

    pub fn playback(&self) -> &PlaybackEngine {
        &self.playback
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn display(&self) -> &DisplayElements {
        &self.display
    }

    pub fn placement(&self) -> PixelRect {
        self.placement
    }

    pub fn control(&self) -> RigControl {
        self.control
    }

    pub fn is_cinematic(&self) -> bool {
        self.control == RigControl::Cinematic
    }

    pub fn destroyed(&self) -> Option<DestroyReason> {
        self.destroyed
    }

    /// Current placement, target and mode as a preset.
    pub fn preset(&self, unit: Unit, display: DisplaySize) -> DronePreset {
        DronePreset::capture(
            self.follow.mode(),
            self.target_name().unwrap_or_default(),
            &self.placement,
            unit,
            display,
        )
    }

    pub fn frame(&self) -> RigFrame {
        RigFrame {
            rig: self.id.clone(),
            position: self.body.pose.position.to_array(),
            rotation: self.body.pose.rotation.to_array(),
            fov: self.body.cameras.fov(),
            orthographic: self.body.cameras.orthographic(),
            cameras_enabled: self.body.cameras.enabled(),
            surface: SurfaceInfo {
                width: self.surface.width(),
                height: self.surface.height(),
                generation: self.surface.generation(),
            },
        }
    }

    pub(crate) fn drain_events(&mut self) -> std::vec::Drain<'_, RigEvent> {
        self.events.drain(..)
    }

    /// Bind to `entry`. Fails without side effects when the entry has no
    /// live pose.
    pub(crate) fn bind(&mut self, entry: &RosterEntry, roster: &dyn Roster) -> bool {
        let Some(handle) = resolve_follow_target(entry) else {
            warn!("rig '{}': '{}' has no live entity", self.id, entry.username);
            return false;
        };
        match roster.anchor_pose(&handle).filter(Pose::is_finite) {
            Some(pose) => {
                self.attach(entry.username.clone(), handle, entry.is_local_viewer, &pose);
                true
            }
            None => {
                warn!("rig '{}': '{}' has no usable pose", self.id, entry.username);
                false
            }
        }
    }

    /// Bind to the first roster entry with a live pose.
    pub(crate) fn bind_first_valid(&mut self, roster: &dyn Roster) -> bool {
        let Some((username, handle)) = first_valid_target(roster) else {
            debug!("rig '{}': no valid target in the roster", self.id);
            return false;
        };
        match roster.anchor_pose(&handle).filter(Pose::is_finite) {
            Some(pose) => {
                self.attach(username, handle, handle.anchor == Anchor::Reset, &pose);
                true
            }
            None => false,
        }
    }

    fn attach(&mut self, username: String, handle: TargetHandle, local: bool, target: &Pose) {
        self.body.cameras.set_enabled(true);
        self.follow.apply_fov(&mut self.body.cameras);
        self.body.pose = self.follow.bind_pose(target);
        self.display.label = username.clone();
        self.display.telemetry = !local;
        info!("rig '{}': following '{}'", self.id, username);
        self.events.push(RigEvent::TargetBound {
            rig: self.id.clone(),
            username: username.clone(),
        });
        self.target = TargetState::Bound {
            username,
            handle,
            local,
        };
    }

    pub(crate) fn set_follow_mode(&mut self, mode: FollowMode) {
        if self.follow.set_mode(mode, &mut self.body.cameras) {
            self.events.push(RigEvent::FollowModeChanged {
                rig: self.id.clone(),
                mode,
            });
        }
    }

    /// Explicit FOV request, clamped to the configured range.
    pub(crate) fn set_fov(&mut self, fov: f32) {
        let fov = self.follow.fov_tuning().clamp(fov);
        self.body.cameras.set_fov(fov);
    }

    pub(crate) fn set_cinematic(&mut self, state: bool, ui_visible: bool, script: Option<Script>) {
        self.display.window_visible = ui_visible;
        if state {
            self.control = RigControl::Cinematic;
            match script {
                Some(script) => self.playback.start(script),
                None => self.playback.restart(),
            }
            self.display.hide_follow();
        } else {
            self.playback.stop();
            self.control = RigControl::Follow;
            self.show_follow_display();
        }
    }

    pub(crate) fn run_script(&mut self, script: Script) {
        self.playback.start(script);
    }

    pub(crate) fn stop_script(&mut self) {
        self.playback.stop();
    }

    /// Window visibility; cinematic rigs ignore it.
    pub(crate) fn set_ui_visible(&mut self, visible: bool) -> bool {
        if self.is_cinematic() {
            return false;
        }
        self.display.window_visible = visible;
        true
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.display.locked = locked;
    }

    pub(crate) fn set_placement(&mut self, rect: PixelRect) {
        self.placement = rect;
        self.resize_surface(rect.width, rect.height);
    }

    pub(crate) fn resize_surface(&mut self, width: u32, height: u32) -> bool {
        if !self.surface.resize(width, height, &mut self.body.cameras) {
            return false;
        }
        self.events.push(RigEvent::SurfaceResized {
            rig: self.id.clone(),
            width: self.surface.width(),
            height: self.surface.height(),
        });
        true
    }

    fn show_follow_display(&mut self) {
        let local = matches!(self.target, TargetState::Bound { local: true, .. });
        self.display.show_follow(!local);
    }

    /// Advance one tick. Returns the reason when the rig must be destroyed.
    pub(crate) fn tick(&mut self, dt: f32, roster: &dyn Roster) -> Option<DestroyReason> {
        if self.destroyed.is_some() {
            return None;
        }

        if let Some(reason) = self.poll_recovery(dt, roster) {
            return Some(reason);
        }

        let step = self.playback.tick(dt, &mut self.body, roster);
        for index in step.started {
            self.events.push(RigEvent::KeyframeStarted {
                rig: self.id.clone(),
                index,
            });
        }
        match step.claimed {
            Some(Control::Follow(mode)) => {
                self.control = RigControl::Follow;
                self.set_follow_mode(mode);
                self.show_follow_display();
            }
            Some(Control::Cinematic) => {
                self.control = RigControl::Cinematic;
                self.display.hide_follow();
            }
            None => {}
        }
        if step.finished {
            self.events.push(RigEvent::PlaybackFinished {
                rig: self.id.clone(),
            });
        }

        if self.control == RigControl::Follow {
            if self.target == TargetState::Unbound {
                self.bind_first_valid(roster);
            }
            let outcome = match &self.target {
                TargetState::Bound {
                    username, handle, ..
                } => Some(self.follow.tick(
                    username,
                    roster.anchor_pose(handle),
                    &self.body.pose,
                    dt,
                )),
                _ => None,
            };
            match outcome {
                Some(Ok(pose)) => self.body.pose = pose,
                Some(Err(err)) => self.begin_recovery(err),
                None => {}
            }
        }
        None
    }

    fn poll_recovery(&mut self, dt: f32, roster: &dyn Roster) -> Option<DestroyReason> {
        let (poll, username, elapsed) = match &mut self.target {
            TargetState::Recovering { username, timer } => {
                let poll = timer.advance(dt);
                (poll, username.clone(), timer.elapsed())
            }
            _ => return None,
        };
        if poll == RecoveryPoll::Wait {
            return None;
        }
        if let Some(entry) = roster.find(&username) {
            if self.bind(entry, roster) {
                info!("rig '{}': recovered '{}' after {elapsed:.2}s", self.id, username);
                self.events.push(RigEvent::Recovered {
                    rig: self.id.clone(),
                    username,
                    after: elapsed,
                });
                return None;
            }
        }
        if poll == RecoveryPoll::PollFinal {
            warn!(
                "rig '{}': '{}' did not come back within {:.2}s",
                self.id, username, self.recovery.timeout
            );
            return Some(DestroyReason::RecoveryTimeout);
        }
        None
    }

    /// Disable the cameras and (re)start the recovery window. Any running
    /// recovery is replaced.
    fn begin_recovery(&mut self, err: FollowError) {
        let Some(username) = self.target.username().map(str::to_string) else {
            return;
        };
        warn!("rig '{}': lost '{}': {err}", self.id, username);
        self.body.cameras.set_enabled(false);
        self.target = TargetState::Recovering {
            username: username.clone(),
            timer: RecoveryTimer::from_cfg(&self.recovery),
        };
        self.events.push(RigEvent::TargetLost {
            rig: self.id.clone(),
            username,
            reason: err.to_string(),
        });
    }

    /// Release the surface and detach display elements. Only the first call
    /// has an effect.
    pub(crate) fn destroy(&mut self, reason: DestroyReason) -> bool {
        if self.destroyed.is_some() {
            return false;
        }
        self.body.cameras.set_enabled(false);
        self.playback.stop();
        self.surface.release();
        self.display.detach();
        self.target = TargetState::Unbound;
        self.destroyed = Some(reason);
        info!("rig '{}' destroyed ({reason:?})", self.id);
        self.events.push(RigEvent::Destroyed {
            rig: self.id.clone(),
            reason,
        });
        true
    }
}

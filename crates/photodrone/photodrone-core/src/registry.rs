//! Registry owning every live rig.
//!
//! The registry is the public entry point: hosts create and configure rigs
//! through it, then call [`RigRegistry::update`] once per frame with the
//! current roster snapshot. Rigs tick in creation order; rigs destroyed
//! during a tick are removed after the pass.

use bevy_math::Vec3;
use indexmap::IndexMap;
use log::{info, warn};

use crate::config::PhotoDroneConfig;
use crate::error::DroneError;
use crate::follow::FollowMode;
use crate::ids::RigId;
use crate::outputs::{DestroyReason, Outputs, RigEvent};
use crate::preset::{DisplaySize, DronePreset, Unit};
use crate::rig::Rig;
use crate::roster::{resolve_follow_target, Roster};
use crate::script::{parse, parse_report, ScriptDiagnostic};

/// How a new rig starts out.
#[derive(Clone, Debug, PartialEq)]
pub enum RigSpawn {
    /// Follow the first valid roster entry.
    Follow,
    /// Scripted rig with a hidden window and no target.
    Cinematic,
    /// Mode, preferred target and placement from a preset.
    Preset(DronePreset),
}

#[derive(Debug, Default)]
pub struct RigRegistry {
    cfg: PhotoDroneConfig,
    rigs: IndexMap<RigId, Rig>,
    display: DisplaySize,
    /// Events of rigs removed outside `update`.
    pending: Vec<RigEvent>,
    outputs: Outputs,
}

impl RigRegistry {
    pub fn new(cfg: PhotoDroneConfig) -> Self {
        Self {
            cfg,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &PhotoDroneConfig {
        &self.cfg
    }

    pub fn display_size(&self) -> DisplaySize {
        self.display
    }

    pub fn set_display_size(&mut self, display: DisplaySize) {
        self.display = display;
    }

    pub fn len(&self) -> usize {
        self.rigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rigs.is_empty()
    }

    pub fn contains(&self, id: &RigId) -> bool {
        self.rigs.contains_key(id)
    }

    pub fn get(&self, id: &RigId) -> Option<&Rig> {
        self.rigs.get(id)
    }

    /// Rig ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = &RigId> {
        self.rigs.keys()
    }

    pub fn rigs(&self) -> impl Iterator<Item = &Rig> {
        self.rigs.values()
    }

    fn rig_mut(&mut self, id: &RigId) -> Result<&mut Rig, DroneError> {
        self.rigs
            .get_mut(id)
            .ok_or_else(|| DroneError::RigNotFound(id.clone()))
    }

    /// Create and register a rig. Nothing is registered when binding the
    /// initial target fails.
    pub fn create_rig(
        &mut self,
        id: impl Into<RigId>,
        spawn: RigSpawn,
        roster: &dyn Roster,
    ) -> Result<RigId, DroneError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DroneError::EmptyRigId);
        }
        if self.rigs.contains_key(&id) {
            return Err(DroneError::DuplicateRig(id));
        }
        if roster.is_empty() {
            warn!("cannot create rig '{id}': no valid player targets");
            return Err(DroneError::EmptyRoster);
        }

        let mut rig = Rig::new(id.clone(), &self.cfg, spawn == RigSpawn::Cinematic);
        match spawn {
            RigSpawn::Cinematic => {}
            RigSpawn::Follow => {
                if !rig.bind_first_valid(roster) {
                    warn!("cannot create rig '{id}': no target could be bound");
                    return Err(DroneError::NoValidTarget(id));
                }
            }
            RigSpawn::Preset(preset) => {
                rig.set_follow_mode(preset.mode);
                let preferred = if preset.target.is_empty() {
                    false
                } else {
                    roster
                        .find(&preset.target)
                        .is_some_and(|entry| rig.bind(entry, roster))
                };
                if !preferred && !rig.bind_first_valid(roster) {
                    warn!("cannot create rig '{id}': no target could be bound");
                    return Err(DroneError::NoValidTarget(id));
                }
                rig.set_placement(preset.to_pixels(self.display, self.cfg.surface.min_preset_size));
            }
        }

        info!("rig '{id}' created");
        self.rigs.insert(id.clone(), rig);
        Ok(id)
    }

    /// Create a rig under a freshly generated id.
    pub fn create_rig_generated(
        &mut self,
        spawn: RigSpawn,
        roster: &dyn Roster,
    ) -> Result<RigId, DroneError> {
        self.create_rig(RigId::generate(), spawn, roster)
    }

    /// Create from preset text; the literal `cinematic` makes a cinematic rig.
    pub fn create_from_preset_str(
        &mut self,
        id: impl Into<RigId>,
        text: &str,
        roster: &dyn Roster,
    ) -> Result<RigId, DroneError> {
        let spawn = if text.trim().eq_ignore_ascii_case("cinematic") {
            RigSpawn::Cinematic
        } else {
            RigSpawn::Preset(text.parse()?)
        };
        self.create_rig(id, spawn, roster)
    }

    /// Spawn one rig per preset under fresh ids. With `clear_on_preset` set,
    /// every open rig is shut down first. A failing preset does not stop the
    /// rest of the group.
    pub fn apply_preset_group(
        &mut self,
        presets: &[DronePreset],
        roster: &dyn Roster,
    ) -> Vec<Result<RigId, DroneError>> {
        if self.cfg.clear_on_preset {
            self.shutdown_all();
        }
        let results: Vec<_> = presets
            .iter()
            .map(|preset| self.create_rig_generated(RigSpawn::Preset(preset.clone()), roster))
            .collect();
        for (preset, result) in presets.iter().zip(&results) {
            if let Err(err) = result {
                warn!("preset group entry '{preset}' failed: {err}");
            }
        }
        info!(
            "applied preset group: {}/{} rigs created",
            results.iter().filter(|r| r.is_ok()).count(),
            presets.len()
        );
        results
    }

    /// Destroy a rig right away, skipping recovery. Unknown or already
    /// closed ids are a no-op.
    pub fn close_rig(&mut self, id: &RigId) -> bool {
        let Some(mut rig) = self.rigs.shift_remove(id) else {
            return false;
        };
        rig.destroy(DestroyReason::Closed);
        self.pending.extend(rig.drain_events());
        true
    }

    pub fn shutdown_all(&mut self) {
        for (_, mut rig) in self.rigs.drain(..) {
            rig.destroy(DestroyReason::Shutdown);
            self.pending.extend(rig.drain_events());
        }
    }

    pub fn set_target(
        &mut self,
        id: &RigId,
        username: &str,
        roster: &dyn Roster,
    ) -> Result<(), DroneError> {
        let rig = self.rig_mut(id)?;
        let entry = roster
            .find(username)
            .ok_or_else(|| DroneError::UnknownPlayer(username.to_string()))?;
        if rig.bind(entry, roster) {
            Ok(())
        } else {
            Err(DroneError::NoValidTarget(id.clone()))
        }
    }

    /// Unknown mode names select Smooth.
    pub fn set_follow_mode(&mut self, id: &RigId, name: &str) -> Result<FollowMode, DroneError> {
        let mode = FollowMode::from_name(name).unwrap_or_else(|| {
            warn!("unknown follow mode '{name}', using smooth");
            FollowMode::Smooth
        });
        self.rig_mut(id)?.set_follow_mode(mode);
        Ok(mode)
    }

    pub fn set_fov(&mut self, id: &RigId, fov: f32) -> Result<(), DroneError> {
        self.rig_mut(id)?.set_fov(fov);
        Ok(())
    }

    /// Enter or leave cinematic control. Entering runs `script` when given,
    /// otherwise restarts the loaded one.
    pub fn set_cinematic(
        &mut self,
        id: &RigId,
        state: bool,
        ui_visible: bool,
        script: Option<&str>,
    ) -> Result<(), DroneError> {
        let rig = self.rig_mut(id)?;
        let script = script.filter(|s| !s.trim().is_empty()).map(parse);
        rig.set_cinematic(state, ui_visible, script);
        Ok(())
    }

    /// Replace the rig's script and start it. Returns the parse diagnostics.
    pub fn run_script(&mut self, id: &RigId, text: &str) -> Result<Vec<ScriptDiagnostic>, DroneError> {
        let rig = self.rig_mut(id)?;
        let report = parse_report(text);
        rig.run_script(report.script);
        Ok(report.diagnostics)
    }

    pub fn stop_script(&mut self, id: &RigId) -> Result<(), DroneError> {
        self.rig_mut(id)?.stop_script();
        Ok(())
    }

    /// Window visibility for every non-cinematic rig. Returns how many rigs
    /// were affected.
    pub fn set_ui_visible(&mut self, visible: bool) -> usize {
        self.rigs
            .values_mut()
            .map(|rig| rig.set_ui_visible(visible))
            .filter(|applied| *applied)
            .count()
    }

    pub fn set_rig_ui_visible(&mut self, id: &RigId, visible: bool) -> Result<bool, DroneError> {
        Ok(self.rig_mut(id)?.set_ui_visible(visible))
    }

    pub fn set_locked(&mut self, id: &RigId, locked: bool) -> Result<(), DroneError> {
        self.rig_mut(id)?.set_locked(locked);
        Ok(())
    }

    pub fn set_position(&mut self, id: &RigId, unit: Unit, x: f32, y: f32) -> Result<(), DroneError> {
        self.place(id, unit, |p| {
            p.x = x;
            p.y = y;
        })
    }

    pub fn set_size(
        &mut self,
        id: &RigId,
        unit: Unit,
        width: f32,
        height: f32,
    ) -> Result<(), DroneError> {
        self.place(id, unit, |p| {
            p.width = width;
            p.height = height;
        })
    }

    pub fn set_rect(
        &mut self,
        id: &RigId,
        unit: Unit,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), DroneError> {
        self.place(id, unit, |p| {
            p.x = x;
            p.y = y;
            p.width = width;
            p.height = height;
        })
    }

    /// Edit the rig's placement through its preset in `unit`, then reapply.
    fn place(
        &mut self,
        id: &RigId,
        unit: Unit,
        edit: impl FnOnce(&mut DronePreset),
    ) -> Result<(), DroneError> {
        let display = self.display;
        let min_size = self.cfg.surface.min_preset_size;
        let rig = self.rig_mut(id)?;
        let mut preset = rig.preset(unit, display);
        edit(&mut preset);
        rig.set_placement(preset.to_pixels(display, min_size));
        Ok(())
    }

    pub fn current_preset(&self, id: &RigId, unit: Unit) -> Result<String, DroneError> {
        let rig = self
            .rigs
            .get(id)
            .ok_or_else(|| DroneError::RigNotFound(id.clone()))?;
        Ok(rig.preset(unit, self.display).to_string())
    }

    /// Resize the rig's render surface; target and mode are untouched.
    pub fn resize_surface(&mut self, id: &RigId, width: u32, height: u32) -> Result<bool, DroneError> {
        Ok(self.rig_mut(id)?.resize_surface(width, height))
    }

    /// Distance from a rig to a player's followed anchor.
    pub fn distance_to(&self, id: &RigId, username: &str, roster: &dyn Roster) -> Option<f32> {
        let rig = self.rigs.get(id)?;
        let target = player_position(roster, username)?;
        Some(rig.pose().position.distance(target))
    }

    pub fn player_names(&self, roster: &dyn Roster) -> Vec<String> {
        roster.usernames()
    }

    /// Tick every rig and collect frames and events.
    pub fn update(&mut self, dt: f32, roster: &dyn Roster) -> &Outputs {
        self.outputs.clear();
        self.outputs.events.append(&mut self.pending);

        let mut doomed = Vec::new();
        for (id, rig) in self.rigs.iter_mut() {
            if let Some(reason) = rig.tick(dt, roster) {
                doomed.push((id.clone(), reason));
            }
            self.outputs.events.extend(rig.drain_events());
        }
        for (id, reason) in doomed {
            if let Some(mut rig) = self.rigs.shift_remove(&id) {
                rig.destroy(reason);
                self.outputs.events.extend(rig.drain_events());
            }
        }

        self.outputs
            .frames
            .extend(self.rigs.values().map(Rig::frame));
        &self.outputs
    }
}

/// World position of a player's followed anchor.
pub fn player_position(roster: &dyn Roster, username: &str) -> Option<Vec3> {
    let entry = roster.find(username)?;
    let handle = resolve_follow_target(entry)?;
    roster.anchor_pose(&handle).map(|p| p.position)
}

//! Read-only roster of live targets and the handle resolver.
//!
//! The host owns the roster and hands the core a snapshot each tick. A
//! [`TargetHandle`] names one anchor on one live entity; it is only valid as
//! long as the roster can produce a pose for it.

use bevy_math::Vec3;
use hashbrown::HashMap;
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::ids::LiveId;
use crate::math::Pose;

/// Which transform of a live entity a handle refers to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Canonical ready/reset transform of the local viewer.
    Reset,
    /// Root of a remote entity's visual replica.
    Body,
    /// Head bone of a remote entity's visual replica.
    Head,
}

/// Weak reference to an anchor on a live entity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TargetHandle {
    pub live: LiveId,
    pub anchor: Anchor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RosterEntry {
    pub username: String,
    pub is_local_viewer: bool,
    /// `None` while the entity has no live replica (e.g. still loading).
    pub live: Option<LiveId>,
}

/// Snapshot view of the known live targets.
pub trait Roster {
    fn entries(&self) -> &[RosterEntry];

    /// Current pose of a handle, or `None` once it has gone stale.
    fn anchor_pose(&self, handle: &TargetHandle) -> Option<Pose>;

    /// Case-insensitive username lookup; first match wins.
    fn find(&self, name: &str) -> Option<&RosterEntry> {
        let wanted = name.trim().to_lowercase();
        self.entries()
            .iter()
            .find(|e| e.username.to_lowercase() == wanted)
    }

    fn usernames(&self) -> Vec<String> {
        self.entries().iter().map(|e| e.username.clone()).collect()
    }

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// In-memory roster: entries plus a pose per (entity, anchor).
#[derive(Clone, Debug, Default)]
pub struct SnapshotRoster {
    entries: Vec<RosterEntry>,
    anchors: HashMap<(LiveId, Anchor), Pose>,
}

impl SnapshotRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.anchors.clear();
    }

    /// Add an entry; replaces any entry with the same username.
    pub fn push(&mut self, entry: RosterEntry) {
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|e| e.username == entry.username)
        {
            *slot = entry;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn set_anchor(&mut self, live: LiveId, anchor: Anchor, pose: Pose) {
        self.anchors.insert((live, anchor), pose);
    }

    pub fn clear_anchor(&mut self, live: LiveId, anchor: Anchor) {
        self.anchors.remove(&(live, anchor));
    }

    /// Drop an entry and every anchor pose of its live entity.
    pub fn remove(&mut self, username: &str) -> Option<RosterEntry> {
        let idx = self.entries.iter().position(|e| e.username == username)?;
        let entry = self.entries.remove(idx);
        if let Some(live) = entry.live {
            self.anchors.retain(|(id, _), _| *id != live);
        }
        Some(entry)
    }

    /// Build from serialized records (fixtures, host snapshots).
    pub fn from_records(records: Vec<RosterRecord>) -> Self {
        let mut roster = Self::new();
        for rec in records {
            let live = rec.live.map(LiveId);
            if let Some(live) = live {
                for anchor in rec.anchors {
                    roster.set_anchor(live, anchor.kind, anchor.pose());
                }
            }
            roster.push(RosterEntry {
                username: rec.username,
                is_local_viewer: rec.local,
                live,
            });
        }
        roster
    }
}

impl Roster for SnapshotRoster {
    fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    fn anchor_pose(&self, handle: &TargetHandle) -> Option<Pose> {
        self.anchors.get(&(handle.live, handle.anchor)).copied()
    }
}

/// Serialized roster entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub username: String,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub live: Option<u64>,
    #[serde(default)]
    pub anchors: Vec<AnchorRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub kind: Anchor,
    pub position: [f32; 3],
    /// Euler degrees.
    #[serde(default)]
    pub rotation: [f32; 3],
}

impl AnchorRecord {
    pub fn pose(&self) -> Pose {
        Pose::from_euler_degrees(
            Vec3::from_array(self.position),
            Vec3::from_array(self.rotation),
        )
    }
}

/// Handle a rig follows for `entry`: the reset anchor for the local viewer,
/// the body anchor otherwise.
pub fn resolve_follow_target(entry: &RosterEntry) -> Option<TargetHandle> {
    let live = entry.live?;
    let anchor = if entry.is_local_viewer {
        Anchor::Reset
    } else {
        Anchor::Body
    };
    Some(TargetHandle { live, anchor })
}

/// First roster entry whose follow handle currently has a pose.
pub fn first_valid_target<R: Roster + ?Sized>(roster: &R) -> Option<(String, TargetHandle)> {
    roster.entries().iter().find_map(|entry| {
        let handle = resolve_follow_target(entry)?;
        roster
            .anchor_pose(&handle)
            .map(|_| (entry.username.clone(), handle))
    })
}

/// Resolve a dynamic look-at name. Local viewer → reset anchor, remote →
/// head anchor. Failures are logged and yield `None`.
pub fn resolve_look_target<R: Roster + ?Sized>(roster: &R, name: &str) -> Option<TargetHandle> {
    let Some(entry) = roster.find(name) else {
        warn!("look-at target '{name}' is not in the roster");
        return None;
    };
    let Some(live) = entry.live else {
        error!("look-at target '{}' has no live entity", entry.username);
        return None;
    };
    let anchor = if entry.is_local_viewer {
        Anchor::Reset
    } else {
        Anchor::Head
    };
    let handle = TargetHandle { live, anchor };
    if roster.anchor_pose(&handle).is_none() {
        error!(
            "look-at target '{}' is missing its {:?} anchor",
            entry.username, anchor
        );
        return None;
    }
    Some(handle)
}

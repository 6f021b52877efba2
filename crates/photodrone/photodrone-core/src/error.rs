//! Error types for rig management, presets and follow ticks.

use thiserror::Error;

use crate::ids::RigId;

/// Failures surfaced by registry operations.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum DroneError {
    #[error("rig id must not be empty")]
    EmptyRigId,
    #[error("rig '{0}' already exists")]
    DuplicateRig(RigId),
    #[error("rig '{0}' not found")]
    RigNotFound(RigId),
    #[error("no valid player targets in the roster")]
    EmptyRoster,
    #[error("no target could be bound for rig '{0}'")]
    NoValidTarget(RigId),
    #[error("player '{0}' is not in the roster")]
    UnknownPlayer(String),
    #[error(transparent)]
    Preset(#[from] PresetError),
    #[error("config error: {0}")]
    Config(String),
}

/// Preset string parse failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PresetError {
    #[error("preset needs 7 ';'-separated fields, got {0}")]
    FieldCount(usize),
    #[error("unknown follow mode '{0}'")]
    UnknownMode(String),
    #[error("unknown unit '{0}', expected 'px' or '%'")]
    UnknownUnit(String),
    #[error("invalid number '{value}' for {field}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Runtime faults raised while computing a follow pose.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FollowError {
    #[error("target '{0}' has no live pose")]
    TargetLost(String),
    #[error("computed pose is not finite")]
    NonFinitePose,
}

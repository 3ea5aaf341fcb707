//! # Pose Output
//!
//! The blended result for one character, written once per playback step to
//! whatever renders it.

use std::collections::HashMap;

use rigstream_ingest::{CharacterKind, CharacterRole};
use rigstream_shared::{CharacterId, Quaternion, Vec3};

/// Blended pose for one character.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterPose {
    /// Character id.
    pub character_id: CharacterId,
    /// Rig variant.
    pub kind: CharacterKind,
    /// Field role.
    pub role: CharacterRole,
    /// Whether the playback frame is inside the character's bounds.
    pub visible: bool,
    /// Blended root position.
    pub root_position: Vec3,
    /// Root (pelvis / object) rotation.
    pub root_rotation: Quaternion,
    /// Per-joint local rotations, rest offset included. Empty for objects.
    pub joint_rotations: Vec<Quaternion>,
    /// Timestamp of the frame being blended towards.
    pub timestamp: Option<i32>,
}

impl CharacterPose {
    /// Hidden pose at the origin.
    #[must_use]
    pub fn hidden(character_id: impl Into<CharacterId>, kind: CharacterKind, role: CharacterRole) -> Self {
        Self {
            character_id: character_id.into(),
            kind,
            role,
            visible: false,
            root_position: Vec3::ZERO,
            root_rotation: Quaternion::IDENTITY,
            joint_rotations: Vec::new(),
            timestamp: None,
        }
    }
}

/// Receiver of blended poses (the renderer).
pub trait PoseSink {
    /// Called once per character per playback step.
    fn write_pose(&mut self, pose: &CharacterPose);
}

/// Keeps the latest pose of every character.
#[derive(Debug, Default)]
pub struct PoseBuffer {
    poses: HashMap<CharacterId, CharacterPose>,
    writes: u64,
}

impl PoseBuffer {
    /// Empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest pose for `character_id`.
    #[must_use]
    pub fn get(&self, character_id: &str) -> Option<&CharacterPose> {
        self.poses.get(character_id)
    }

    /// Characters seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Whether nothing was written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Characters currently visible.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.poses.values().filter(|p| p.visible).count()
    }

    /// Total writes.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// All latest poses.
    pub fn iter(&self) -> impl Iterator<Item = &CharacterPose> {
        self.poses.values()
    }
}

impl PoseSink for PoseBuffer {
    fn write_pose(&mut self, pose: &CharacterPose) {
        self.writes += 1;
        self.poses.insert(pose.character_id.clone(), pose.clone());
    }
}

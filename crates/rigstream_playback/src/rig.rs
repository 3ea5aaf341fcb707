//! # Character Rigs
//!
//! Per-character playback state and the two interpolation policies.
//!
//! ## Humanoid
//!
//! ```text
//! position   = lerp(prev.root, current.root, b)
//! joint[i]   = euler(rest[i] + correction[i]) * slerp(prev.rot[i], current.rot[i], b)
//! ```
//!
//! ## Object
//!
//! If the root moved further than the spin threshold between the two
//! frames, the object is airborne: it faces along its travel direction and
//! spins at a constant rate. Otherwise it takes the frame's own rotation.

use rigstream_ingest::{AnnouncedCharacter, CharacterKind};
use rigstream_shared::{BoundsRecord, FrameRecord, Quaternion, Vec3};

use crate::config::PlaybackConfig;
use crate::pose::CharacterPose;

/// Joint blending policy.
#[derive(Clone, Debug, PartialEq)]
pub struct HumanoidRig {
    rest_offsets: Vec<Vec3>,
    corrections: Vec<Vec3>,
}

impl HumanoidRig {
    /// Rig with the given rest pose (euler degrees) and no corrections.
    #[must_use]
    pub fn new(rest_offsets: Vec<Vec3>) -> Self {
        Self {
            rest_offsets,
            corrections: Vec::new(),
        }
    }

    /// Replaces the corrective angles.
    pub fn set_corrections(&mut self, corrections: Vec<Vec3>) {
        self.corrections = corrections;
    }

    /// Corrective angles.
    #[must_use]
    pub fn corrections(&self) -> &[Vec3] {
        &self.corrections
    }

    /// Blended joint rotations. Joints missing from either frame or from the
    /// rest pose are skipped.
    #[must_use]
    pub fn blend_joints(&self, prev: &FrameRecord, current: &FrameRecord, blend: f32) -> Vec<Quaternion> {
        self.rest_offsets
            .iter()
            .zip(prev.bone_rotations.iter().zip(&current.bone_rotations))
            .enumerate()
            .map(|(i, (rest, (from, to)))| {
                let correction = self.corrections.get(i).copied().unwrap_or(Vec3::ZERO);
                Quaternion::from_euler_degrees(*rest + correction) * from.slerp(*to, blend)
            })
            .collect()
    }
}

/// Rigid object policy.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRig {
    auto_spin: bool,
    spin_threshold: f32,
    spin_rate: Vec3,
    current_spin: f32,
    rotation: Quaternion,
}

impl ObjectRig {
    /// Rig using the spin settings from `config`.
    #[must_use]
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            auto_spin: config.auto_spin,
            spin_threshold: config.spin_threshold,
            spin_rate: Vec3::from_array(config.spin_rate_deg),
            current_spin: 0.0,
            rotation: Quaternion::IDENTITY,
        }
    }

    /// Seconds spent airborne so far.
    #[must_use]
    pub fn current_spin(&self) -> f32 {
        self.current_spin
    }

    /// Whether the last update used the spin heuristic.
    #[must_use]
    pub fn is_spinning(&self) -> bool {
        self.current_spin > 0.0
    }

    /// Root rotation for this step.
    pub fn rotate(&mut self, prev: &FrameRecord, current: &FrameRecord, dt: f32) -> Quaternion {
        let travel = current.root_position.distance(prev.root_position);
        if self.auto_spin && travel > self.spin_threshold {
            self.current_spin += dt;
            self.rotation = Quaternion::from_to(prev.root_position, current.root_position)
                * Quaternion::from_euler_degrees(self.spin_rate * self.current_spin);
        } else {
            self.current_spin = 0.0;
            if let Some(r) = current.bone_rotations.first() {
                self.rotation = *r;
            }
        }
        self.rotation
    }
}

/// Interpolation policy selected by character kind.
#[derive(Clone, Debug, PartialEq)]
pub enum CharacterRig {
    /// Skeleton.
    Humanoid(HumanoidRig),
    /// Ball or other rigid object.
    Object(ObjectRig),
}

impl CharacterRig {
    /// Rig for `kind`.
    #[must_use]
    pub fn for_kind(kind: CharacterKind, config: &PlaybackConfig) -> Self {
        match kind {
            CharacterKind::Humanoid => Self::Humanoid(HumanoidRig::new(config.rest_offsets())),
            CharacterKind::Object => Self::Object(ObjectRig::new(config)),
        }
    }
}

/// Visibility state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    /// Playback frame outside the bounds.
    Inactive,
    /// Playback frame inside the bounds.
    Active,
}

/// Playback state of one character.
#[derive(Clone, Debug)]
pub struct CharacterPlaybackState {
    character: AnnouncedCharacter,
    rig: CharacterRig,
    activity: Activity,
    prev: Option<FrameRecord>,
    current: Option<FrameRecord>,
    pose: CharacterPose,
}

impl CharacterPlaybackState {
    /// Inactive state for a newly announced character.
    #[must_use]
    pub fn new(character: AnnouncedCharacter, config: &PlaybackConfig) -> Self {
        let rig = CharacterRig::for_kind(character.kind, config);
        let pose = CharacterPose::hidden(character.id(), character.kind, character.role);
        Self {
            character,
            rig,
            activity: Activity::Inactive,
            prev: None,
            current: None,
            pose,
        }
    }

    /// Character id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.character.id()
    }

    /// Announced bounds.
    #[must_use]
    pub fn bounds(&self) -> &BoundsRecord {
        &self.character.bounds
    }

    /// Current activity.
    #[must_use]
    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Frame blended from.
    #[must_use]
    pub fn prev_frame(&self) -> Option<&FrameRecord> {
        self.prev.as_ref()
    }

    /// Frame blended towards.
    #[must_use]
    pub fn current_frame(&self) -> Option<&FrameRecord> {
        self.current.as_ref()
    }

    /// Rig.
    #[must_use]
    pub fn rig(&self) -> &CharacterRig {
        &self.rig
    }

    /// Latest pose.
    #[must_use]
    pub fn pose(&self) -> &CharacterPose {
        &self.pose
    }

    /// Replaces humanoid corrections. No effect on objects.
    pub fn set_corrections(&mut self, corrections: Vec<Vec3>) {
        if let CharacterRig::Humanoid(rig) = &mut self.rig {
            rig.set_corrections(corrections);
        }
    }

    /// One step inside the bounds.
    ///
    /// `frame` is the buffered frame for this step, if it arrived. Without
    /// one an active character keeps blending between the last known pair
    /// and an inactive one stays hidden.
    pub fn animate(&mut self, frame: Option<&FrameRecord>, blend: f32, dt: f32) -> &CharacterPose {
        match (self.activity, frame) {
            // Stays hidden until a buffered frame inside the bounds shows up.
            (Activity::Inactive, None) => {
                self.pose.visible = false;
                return &self.pose;
            }
            (Activity::Inactive, Some(frame)) => {
                self.prev = Some(frame.clone());
                self.current = Some(frame.clone());
                self.activity = Activity::Active;
            }
            (Activity::Active, Some(frame)) => self.advance_pair(frame),
            (Activity::Active, None) => {}
        }
        self.pose.visible = true;

        let (Some(prev), Some(current)) = (&self.prev, &self.current) else {
            return &self.pose;
        };

        self.pose.root_position = prev.root_position.lerp(current.root_position, blend);
        self.pose.timestamp = Some(current.timestamp);
        match &mut self.rig {
            CharacterRig::Humanoid(rig) => {
                self.pose.joint_rotations = rig.blend_joints(prev, current, blend);
                self.pose.root_rotation = self
                    .pose
                    .joint_rotations
                    .first()
                    .copied()
                    .unwrap_or(Quaternion::IDENTITY);
            }
            CharacterRig::Object(rig) => {
                self.pose.root_rotation = rig.rotate(prev, current, dt);
            }
        }
        &self.pose
    }

    /// One step outside the bounds.
    pub fn deactivate(&mut self) -> &CharacterPose {
        self.activity = Activity::Inactive;
        self.pose.visible = false;
        &self.pose
    }

    fn advance_pair(&mut self, frame: &FrameRecord) {
        match &self.current {
            Some(current) if current.timestamp == frame.timestamp => {}
            Some(_) => {
                self.prev = self.current.take();
                self.current = Some(frame.clone());
            }
            None => {
                self.prev = Some(frame.clone());
                self.current = Some(frame.clone());
            }
        }
    }
}

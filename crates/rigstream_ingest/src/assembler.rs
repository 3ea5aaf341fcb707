//! # Frame Assembler
//!
//! Builds one fixed-size, randomly addressable frame buffer per character.
//!
//! ## Rules
//!
//! 1. A buffer is allocated exactly once, at the character's first bounds,
//!    with `end - begin + 1` slots. It is never resized.
//! 2. A frame goes to slot `timestamp - begin`. Frames for characters with
//!    no known bounds are handed back to the caller for requeueing.
//! 3. Slots that never receive a frame stay empty. That is not an error.
//!
//! Everything here runs on the tick thread; no locking.

use std::collections::HashMap;

use rigstream_shared::{BoundsRecord, CharacterId, FrameRecord, RigDescriptor};

use crate::config::IngestConfig;

/// Rig variant selected from the announced category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharacterKind {
    /// Articulated skeleton with per-joint blending.
    Humanoid,
    /// Rigid object (the ball) with the spin heuristic.
    Object,
}

/// Role on the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharacterRole {
    /// A regular player.
    Player,
    /// A referee.
    Referee,
    /// The ball.
    Ball,
}

/// A character whose bounds have just been processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnouncedCharacter {
    /// Bounds with the category replaced by the classified one.
    pub bounds: BoundsRecord,
    /// Rig variant.
    pub kind: CharacterKind,
    /// Field role.
    pub role: CharacterRole,
}

impl AnnouncedCharacter {
    /// Character id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.bounds.character_id
    }
}

/// Fixed-length frame storage for one character.
#[derive(Clone, Debug)]
pub struct CharacterFrameBuffer {
    begin_time: i32,
    slots: Box<[Option<FrameRecord>]>,
}

impl CharacterFrameBuffer {
    /// Allocates an empty buffer covering `bounds`.
    #[must_use]
    pub fn new(bounds: &BoundsRecord) -> Self {
        Self {
            begin_time: bounds.begin_time,
            slots: vec![None; bounds.frame_count()].into_boxed_slice(),
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the buffer has zero slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Frame stored at `slot`.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&FrameRecord> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Frame stored for absolute `timestamp`.
    #[must_use]
    pub fn frame_at(&self, timestamp: i32) -> Option<&FrameRecord> {
        let slot = i64::from(timestamp) - i64::from(self.begin_time);
        usize::try_from(slot).ok().and_then(|s| self.get(s))
    }

    /// Number of filled slots.
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn store(&mut self, slot: usize, frame: FrameRecord) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(frame);
        }
    }
}

/// Outcome of [`FrameAssembler::announce`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Announcement {
    /// First bounds for this character; a buffer was allocated.
    New(AnnouncedCharacter),
    /// Bounds were already known; the rejected record is handed back.
    Duplicate(BoundsRecord),
}

/// Outcome of [`FrameAssembler::place`].
#[derive(Debug, PartialEq)]
pub enum Placement {
    /// Stored at `slot`.
    Placed {
        /// Buffer index.
        slot: usize,
    },
    /// No bounds yet. The frame is returned for requeueing.
    UnknownBounds(FrameRecord),
    /// Timestamp outside the character's bounds. The frame is returned
    /// so the caller can report it.
    OutOfRange(FrameRecord),
}

/// Maps announced categories onto rig kinds and roles.
#[derive(Clone, Debug)]
pub struct CharacterClassifier {
    roster: Vec<RigDescriptor>,
    default_category: String,
    object_categories: Vec<String>,
    referee_suffix: String,
}

impl CharacterClassifier {
    /// Creates a classifier for `roster`.
    #[must_use]
    pub fn new(config: &IngestConfig, roster: Vec<RigDescriptor>) -> Self {
        Self {
            roster,
            default_category: config.default_category.clone(),
            object_categories: config.object_categories.clone(),
            referee_suffix: config.referee_suffix.clone(),
        }
    }

    /// Resolves the category for a character.
    ///
    /// A roster entry wins. An id missing from a non-empty roster falls back
    /// to the default category. With no roster at all, the native category
    /// is kept only if it names an object category.
    #[must_use]
    pub fn category_for(&self, character_id: &str, declared: &str) -> String {
        let candidate = if self.roster.is_empty() {
            declared
        } else {
            self.roster
                .iter()
                .find(|rig| rig.id == character_id)
                .map_or("", |rig| rig.kind.as_str())
        };

        if self.is_object(candidate) {
            candidate.to_string()
        } else {
            self.default_category.clone()
        }
    }

    /// Classifies `bounds`, rewriting its category.
    #[must_use]
    pub fn classify(&self, mut bounds: BoundsRecord) -> AnnouncedCharacter {
        bounds.category = self.category_for(&bounds.character_id, &bounds.category);
        let kind = if self.is_object(&bounds.category) {
            CharacterKind::Object
        } else {
            CharacterKind::Humanoid
        };
        let role = match kind {
            CharacterKind::Object => CharacterRole::Ball,
            CharacterKind::Humanoid if bounds.character_id.ends_with(&self.referee_suffix) => {
                CharacterRole::Referee
            }
            CharacterKind::Humanoid => CharacterRole::Player,
        };
        AnnouncedCharacter { bounds, kind, role }
    }

    fn is_object(&self, category: &str) -> bool {
        self.object_categories.iter().any(|c| c == category)
    }
}

/// Per-character bounds, buffers and received counts.
#[derive(Debug)]
pub struct FrameAssembler {
    classifier: CharacterClassifier,
    bounds: HashMap<CharacterId, BoundsRecord>,
    buffers: HashMap<CharacterId, CharacterFrameBuffer>,
    received: HashMap<CharacterId, usize>,
}

impl FrameAssembler {
    /// Creates an empty assembler.
    #[must_use]
    pub fn new(classifier: CharacterClassifier) -> Self {
        Self {
            classifier,
            bounds: HashMap::new(),
            buffers: HashMap::new(),
            received: HashMap::new(),
        }
    }

    /// Processes a bounds record.
    pub fn announce(&mut self, bounds: BoundsRecord) -> Announcement {
        if self.bounds.contains_key(&bounds.character_id) {
            return Announcement::Duplicate(bounds);
        }
        let announced = self.classifier.classify(bounds);
        let id = announced.bounds.character_id.clone();
        self.buffers
            .insert(id.clone(), CharacterFrameBuffer::new(&announced.bounds));
        self.received.insert(id.clone(), 0);
        self.bounds.insert(id, announced.bounds.clone());
        Announcement::New(announced)
    }

    /// Places a frame into its character's buffer.
    pub fn place(&mut self, frame: FrameRecord) -> Placement {
        let Some(bounds) = self.bounds.get(&frame.character_id) else {
            return Placement::UnknownBounds(frame);
        };
        let Some(slot) = bounds.slot_of(frame.timestamp) else {
            return Placement::OutOfRange(frame);
        };
        let id = frame.character_id.clone();
        if let Some(buffer) = self.buffers.get_mut(&id) {
            buffer.store(slot, frame);
        }
        *self.received.entry(id).or_insert(0) += 1;
        Placement::Placed { slot }
    }

    /// Whether bounds are known for `character_id`.
    #[must_use]
    pub fn is_known(&self, character_id: &str) -> bool {
        self.bounds.contains_key(character_id)
    }

    /// Bounds for `character_id`.
    #[must_use]
    pub fn bounds(&self, character_id: &str) -> Option<&BoundsRecord> {
        self.bounds.get(character_id)
    }

    /// All known bounds.
    pub fn all_bounds(&self) -> impl Iterator<Item = &BoundsRecord> {
        self.bounds.values()
    }

    /// Frame buffer for `character_id`.
    #[must_use]
    pub fn buffer(&self, character_id: &str) -> Option<&CharacterFrameBuffer> {
        self.buffers.get(character_id)
    }

    /// Frames received for `character_id`.
    #[must_use]
    pub fn received(&self, character_id: &str) -> usize {
        self.received.get(character_id).copied().unwrap_or(0)
    }

    /// Number of characters with known bounds.
    #[must_use]
    pub fn character_count(&self) -> usize {
        self.bounds.len()
    }

    /// Whether every known character has received at least its frame count.
    /// Vacuously true with no characters.
    #[must_use]
    pub fn all_complete(&self) -> bool {
        self.bounds
            .values()
            .all(|b| self.received(&b.character_id) >= b.frame_count())
    }

    /// Characters still short of frames, with the number missing.
    #[must_use]
    pub fn missing(&self) -> Vec<(CharacterId, usize)> {
        let mut out: Vec<_> = self
            .bounds
            .values()
            .filter_map(|b| {
                let got = self.received(&b.character_id);
                (got < b.frame_count()).then(|| (b.character_id.clone(), b.frame_count() - got))
            })
            .collect();
        out.sort();
        out
    }

    /// Drops all characters.
    pub fn clear(&mut self) {
        self.bounds.clear();
        self.buffers.clear();
        self.received.clear();
    }
}

//! # Stream Manifest
//!
//! Roster and global frame range for a capture session. The file format is
//! owned by an external loader; this module only fixes the shape the core
//! consumes.

use serde::{Deserialize, Serialize};

/// Global frame range of the whole capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHeader {
    /// First frame (inclusive).
    pub start_frame: i32,
    /// Last frame (inclusive).
    pub end_frame: i32,
}

impl SessionHeader {
    /// Creates a header.
    #[must_use]
    pub const fn new(start_frame: i32, end_frame: i32) -> Self {
        Self { start_frame, end_frame }
    }

    /// `end - start + 1`, zero for an inverted range.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        if self.end_frame < self.start_frame {
            0
        } else {
            (i64::from(self.end_frame) - i64::from(self.start_frame) + 1) as usize
        }
    }
}

/// One roster entry: a character id and its declared category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigDescriptor {
    /// Character id.
    pub id: String,
    /// Declared category (`"solidObject"`, `"player"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
}

impl RigDescriptor {
    /// Creates a roster entry.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

/// Header plus roster, as supplied by the external manifest loader.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamManifest {
    /// Global frame range, if known.
    #[serde(default)]
    pub header: Option<SessionHeader>,
    /// Known characters.
    #[serde(default)]
    pub rigs: Vec<RigDescriptor>,
}

impl StreamManifest {
    /// Looks up a roster entry by id.
    #[must_use]
    pub fn rig(&self, id: &str) -> Option<&RigDescriptor> {
        self.rigs.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_frame_count() {
        assert_eq!(SessionHeader::new(0, 14).frame_count(), 15);
        assert_eq!(SessionHeader::new(5, 4).frame_count(), 0);
    }

    #[test]
    fn test_rig_lookup() {
        let manifest = StreamManifest {
            header: Some(SessionHeader::new(0, 9)),
            rigs: vec![RigDescriptor::new("ball", "solidObject"), RigDescriptor::new("p1", "player")],
        };
        assert_eq!(manifest.rig("ball").map(|r| r.kind.as_str()), Some("solidObject"));
        assert!(manifest.rig("nobody").is_none());
    }
}

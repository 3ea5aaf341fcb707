//! # Player Configuration
//!
//! One TOML document with an `[ingest]` and a `[playback]` table. Either
//! table may be omitted.
//!
//! ```toml
//! [ingest]
//! verbose = false
//! completion_grace_secs = 0.5
//!
//! [playback]
//! follow_sharpness = 0.4
//!
//! [playback.time_source]
//! frames_per_second = 30.0
//! ```
//!
//! The rig roster lives in a separate manifest file, see [`load_manifest`].

use std::path::Path;

use rigstream_ingest::IngestConfig;
use rigstream_playback::PlaybackConfig;
use rigstream_shared::StreamManifest;
use serde::{Deserialize, Serialize};

use crate::error::RigstreamResult;

/// Combined configuration for a [`StreamPlayer`](crate::StreamPlayer).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigstreamConfig {
    /// Drain budgets, classification and completion.
    pub ingest: IngestConfig,
    /// Clock, blending and rigs.
    pub playback: PlaybackConfig,
}

impl RigstreamConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns a parse error, or the first invalid field of either table.
    pub fn from_toml_str(text: &str) -> RigstreamResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file.
    ///
    /// # Errors
    ///
    /// As [`RigstreamConfig::from_toml_str`], plus I/O failures.
    pub fn load(path: impl AsRef<Path>) -> RigstreamResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validates both tables.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> RigstreamResult<()> {
        self.ingest.validate()?;
        self.playback.validate()?;
        Ok(())
    }
}

/// Parses a manifest (session header + rig roster) from TOML.
///
/// ```toml
/// [header]
/// startFrame = 0
/// endFrame = 299
///
/// [[rigs]]
/// id = "ball"
/// type = "solidObject"
/// ```
///
/// # Errors
///
/// Returns a parse error on malformed input.
pub fn parse_manifest(text: &str) -> RigstreamResult<StreamManifest> {
    Ok(toml::from_str(text)?)
}

/// Reads a manifest file, see [`parse_manifest`].
///
/// # Errors
///
/// Returns I/O or parse failures.
pub fn load_manifest(path: impl AsRef<Path>) -> RigstreamResult<StreamManifest> {
    let text = std::fs::read_to_string(path)?;
    parse_manifest(&text)
}

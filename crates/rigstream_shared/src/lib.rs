//! # RIGSTREAM Shared
//!
//! Common types used by both the ingest and the playback side.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - threading or channel crates
//! - anything that talks to the native streaming library
//!
//! If you need those, put them in `rigstream_ingest`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod manifest;
pub mod math;
pub mod records;
mod return_code;

pub use manifest::{RigDescriptor, SessionHeader, StreamManifest};
pub use math::{Quaternion, Vec3};
pub use records::{BoundsRecord, CharacterId, ErrorRecord, FrameRecord};
pub use return_code::ReturnCode;

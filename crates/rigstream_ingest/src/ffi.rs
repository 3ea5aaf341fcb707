//! # Native Callback Trampolines
//!
//! The native streaming library reports through plain C function pointers
//! with no user-data argument. These trampolines forward into whichever
//! [`NativeEventBridge`] currently holds the registration slot.
//!
//! ```text
//! native thread ──▶ rig_on_frame(...) ──▶ REGISTERED (read lock) ──▶ bridge.on_frame
//! tick thread   ──▶ CallbackRegistration::release ──▶ REGISTERED (write lock) = None
//! ```
//!
//! The read lock is held for the full duration of a forwarded callback, so
//! `release` cannot return while a callback is still running. After it
//! returns, trampolines drop every event.
//!
//! ## Safety
//!
//! Pointer arguments are only read inside the callback, never retained.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_double, c_int, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bridge::NativeEventBridge;
use crate::error::{StreamError, StreamResult};

static REGISTERED: RwLock<Option<Arc<NativeEventBridge>>> = parking_lot::const_rwlock(None);

/// `onError(rigId, code, description)`
pub type ErrorCallback = unsafe extern "C" fn(*const c_char, c_int, *const c_char);

/// `onBounds(rigId, startTimestamp, endTimestamp)`
pub type BoundsCallback = unsafe extern "C" fn(*const c_char, c_int, c_int);

/// `onFrame(rigId, ts, xyz, rotations, numRotations, lengths, numLengths, offsets, numOffsets)`
pub type FrameCallback = unsafe extern "C" fn(
    *const c_char,
    c_int,
    *const c_double,
    *const c_double,
    c_int,
    *const c_double,
    c_int,
    *const c_double,
    c_int,
);

/// Function pointers to hand to the native library's setter calls.
#[derive(Clone, Copy, Debug)]
pub struct NativeCallbacks {
    /// Error callback.
    pub on_error: ErrorCallback,
    /// Bounds callback.
    pub on_bounds: BoundsCallback,
    /// Frame callback.
    pub on_frame: FrameCallback,
}

impl NativeCallbacks {
    /// The trampolines defined in this module.
    pub const TRAMPOLINES: Self = Self {
        on_error: rig_on_error,
        on_bounds: rig_on_bounds,
        on_frame: rig_on_frame,
    };
}

/// Exclusive ownership of the native callback slot.
///
/// Only one bridge can be registered at a time. The slot is cleared by
/// [`CallbackRegistration::release`] or on drop, whichever comes first.
#[derive(Debug)]
pub struct CallbackRegistration {
    bridge: Arc<NativeEventBridge>,
    active: bool,
}

impl CallbackRegistration {
    /// Registers `bridge` as the target of the trampolines.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::CallbacksAlreadyRegistered`] if another
    /// registration is alive.
    pub fn register(bridge: Arc<NativeEventBridge>) -> StreamResult<Self> {
        let mut slot = REGISTERED.write();
        if slot.is_some() {
            return Err(StreamError::CallbacksAlreadyRegistered);
        }
        *slot = Some(Arc::clone(&bridge));
        tracing::debug!("native callbacks registered");
        Ok(Self { bridge, active: true })
    }

    /// Callback table for the native setters.
    #[must_use]
    pub fn callbacks(&self) -> NativeCallbacks {
        NativeCallbacks::TRAMPOLINES
    }

    /// Whether this guard still holds the slot.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Unregisters. Blocks until in-flight callbacks return. Idempotent.
    pub fn release(&mut self) {
        if !self.active {
            return;
        }
        let mut slot = REGISTERED.write();
        if slot.as_ref().is_some_and(|b| Arc::ptr_eq(b, &self.bridge)) {
            *slot = None;
        }
        self.active = false;
        tracing::debug!("native callbacks released");
    }
}

impl Drop for CallbackRegistration {
    fn drop(&mut self) {
        self.release();
    }
}

/// Whether any bridge currently holds the callback slot.
#[must_use]
pub fn is_registered() -> bool {
    REGISTERED.read().is_some()
}

fn forward(f: impl FnOnce(&NativeEventBridge)) {
    let slot = REGISTERED.read();
    if let Some(bridge) = slot.as_deref() {
        // A panic must not unwind into native frames.
        if catch_unwind(AssertUnwindSafe(|| f(bridge))).is_err() {
            tracing::error!("panic inside native callback; event dropped");
        }
    }
}

/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string for the call.
unsafe fn owned_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// # Safety
///
/// `ptr` must be null or point to at least `len` readable doubles.
unsafe fn doubles<'a>(ptr: *const c_double, len: usize) -> &'a [f64] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len)
    }
}

fn count(n: c_int) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// Error trampoline.
///
/// # Safety
///
/// String pointers must be null or valid NUL-terminated strings.
pub unsafe extern "C" fn rig_on_error(rig_id: *const c_char, code: c_int, description: *const c_char) {
    let id = owned_str(rig_id);
    let description = owned_str(description);
    forward(|bridge| bridge.on_error(&id, code, &description));
}

/// Bounds trampoline.
///
/// # Safety
///
/// `rig_id` must be null or a valid NUL-terminated string.
pub unsafe extern "C" fn rig_on_bounds(rig_id: *const c_char, start: c_int, end: c_int) {
    let id = owned_str(rig_id);
    forward(|bridge| bridge.on_bounds(&id, start, end));
}

/// Frame trampoline.
///
/// # Safety
///
/// `xyz` must be null or point to 3 doubles, `rotations` to `4·num_rotations`,
/// `lengths` to `num_lengths` and `offsets` to `3·num_offsets` doubles.
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn rig_on_frame(
    rig_id: *const c_char,
    timestamp: c_int,
    xyz: *const c_double,
    rotations: *const c_double,
    num_rotations: c_int,
    lengths: *const c_double,
    num_lengths: c_int,
    offsets: *const c_double,
    num_offsets: c_int,
) {
    let id = owned_str(rig_id);
    let position = doubles(xyz, 3);
    let rotations = doubles(rotations, count(num_rotations) * 4);
    let lengths = doubles(lengths, count(num_lengths));
    let offsets = doubles(offsets, count(num_offsets) * 3);
    forward(|bridge| bridge.on_frame(&id, timestamp, position, rotations, lengths, offsets));
}

/// Serializes tests that touch the process-wide callback slot.
#[cfg(test)]
pub(crate) static TEST_SLOT: parking_lot::Mutex<()> = parking_lot::const_mutex(());

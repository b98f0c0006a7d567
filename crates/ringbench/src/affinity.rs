//! Thin "pin current thread to core N" boundary over the OS affinity API.

use thiserror::Error;

/// Affinity call failed on a platform that claims to support it. Fatal for
/// the trial: unpinned workers would silently invalidate the measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to pin thread to core {core}")]
pub struct PinError {
    /// The requested core index.
    pub core: usize,
}

/// Number of logical cores workers are spread across.
pub fn core_count() -> usize {
    num_cpus::get()
}

/// Pin the calling thread to the core at `core % available`, using the
/// enumeration order the OS reports.
pub fn pin_to_core(core: usize) -> Result<(), PinError> {
    let core_ids = core_affinity::get_core_ids().ok_or(PinError { core })?;
    if core_ids.is_empty() {
        return Err(PinError { core });
    }
    let id = core_ids[core % core_ids.len()];
    if core_affinity::set_for_current(id) {
        Ok(())
    } else {
        Err(PinError { core })
    }
}

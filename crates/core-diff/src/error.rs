//! Failure modes the engine can report to its host (spec §7).

use thiserror::Error;

use crate::buffer::BufferSlot;

#[derive(Debug, Error)]
pub enum DiffError {
    /// All four buffer slots are occupied; `register_buffer` cannot proceed.
    #[error("all buffer slots are occupied")]
    CapacityExceeded,

    /// A call named a slot that isn't currently registered.
    #[error("buffer slot {0:?} is not participating in the diff")]
    NotParticipating(BufferSlot),

    /// An implicit transfer target couldn't be resolved because more than
    /// one candidate buffer exists.
    #[error("transfer target is ambiguous among {0} participating buffers")]
    Ambiguous(usize),

    /// An implicit transfer target couldn't be resolved because no other
    /// buffer is currently participating.
    #[error("no other buffer is participating to transfer with")]
    NotFound,

    /// The external differ failed for a specific buffer pair during a
    /// rebuild. Carries the slot and the underlying error text; a rebuild
    /// continues with the other pairs rather than aborting entirely.
    #[error("differ failed for buffer slot {slot:?}: {reason}")]
    DifferFailed { slot: BufferSlot, reason: String },

    /// An option string contained a token the parser doesn't recognize.
    #[error("unrecognized diff option {0:?}")]
    InvalidOption(String),
}

//! A multi-buffer diff engine for a modal text editor: tracks aligned
//! change blocks across up to four registered buffers, keeps them roughly
//! current as buffers are edited, and answers the rendering and
//! transfer-between-buffers queries a diff-mode view needs.
//!
//! The engine owns no window, scrollbar, or terminal state; it never
//! computes a diff itself, delegating that to whatever [`Differ`] the host
//! configures. See [`DiffEngine`] for the entry point.

pub mod block;
pub mod buffer;
pub mod comparator;
pub mod differ;
pub mod edit_tracker;
pub mod error;
pub mod lnum;
pub mod options;
pub mod parser;
pub mod query;
pub mod rebuild;
pub mod transfer;

use std::path::PathBuf;

use tracing::{info, warn};

pub use block::{DiffBlock, DiffList};
pub use buffer::{BufferSlot, DiffBuffer, DB_COUNT};
pub use comparator::CompareFlags;
pub use differ::Differ;
pub use error::DiffError;
pub use lnum::{Lnum, MAX_LNUM};
pub use options::DiffOptions;
pub use query::LineClass;
pub use transfer::Target;

/// A block whose shape changed enough that any cached fold state covering
/// it is stale and should be recomputed (spec §9 "Fold interaction").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldInvalidation {
    pub slot: BufferSlot,
    pub first: Lnum,
    pub last: Lnum,
}

/// Top-level handle a host constructs once and drives for the lifetime of
/// a diff-mode session across its buffers.
pub struct DiffEngine<B: ?Sized> {
    slots: buffer::Slots<B>,
    list: DiffList,
    options: DiffOptions,
    differ: Differ,
    scratch_dir: PathBuf,
    stale: bool,
    redraw_pending: bool,
    fold_invalidations: Vec<FoldInvalidation>,
}

impl<B: DiffBuffer + ?Sized> DiffEngine<B> {
    /// Build a new engine. `scratch_dir` is where per-rebuild temp files are
    /// written; callers typically pass `std::env::temp_dir()` or a
    /// directory already scoped to the editor's runtime state.
    pub fn new(differ: Differ, scratch_dir: PathBuf) -> Self {
        Self {
            slots: buffer::Slots::new(),
            list: DiffList::new(),
            options: DiffOptions::default(),
            differ,
            scratch_dir,
            stale: false,
            redraw_pending: false,
            fold_invalidations: Vec::new(),
        }
    }

    /// Register a new participating buffer. Fails once all four slots are
    /// full. Marks the engine stale; call [`Self::rebuild`] to fold it in.
    pub fn register_buffer(&mut self, buf: Box<B>) -> Result<BufferSlot, DiffError> {
        let slot = self.slots.insert(buf).ok_or(DiffError::CapacityExceeded)?;
        self.stale = true;
        self.redraw_pending = true;
        info!(target: "diff.edit", slot = slot.index(), "buffer registered");
        Ok(slot)
    }

    /// Drop a buffer from the diff. Does not rebuild immediately, but marks
    /// the engine stale since the remaining blocks' slot assignments are
    /// now half-meaningless for the removed index.
    pub fn unregister_buffer(&mut self, slot: BufferSlot) -> Result<(), DiffError> {
        self.slots.remove(slot).ok_or(DiffError::NotParticipating(slot))?;
        self.stale = true;
        self.redraw_pending = true;
        info!(target: "diff.edit", slot = slot.index(), "buffer unregistered");
        Ok(())
    }

    pub fn is_participating(&self, slot: BufferSlot) -> bool {
        query::is_participating(&self.slots, slot)
    }

    pub fn buffer(&self, slot: BufferSlot) -> Option<&B> {
        self.slots.get(slot)
    }

    pub fn buffer_mut(&mut self, slot: BufferSlot) -> Option<&mut B> {
        self.slots.get_mut(slot)
    }

    /// Force the next query to be served from a fresh [`Self::rebuild`]
    /// (vim's `diff_invalid`). Used when something outside the engine's own
    /// edit notifications changed a buffer (a reload from disk, an undo
    /// that replayed many edits at once).
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the active comparison/presentation options. If the change
    /// affects line equality (`icase`/`iwhite`), the engine is marked stale
    /// since existing blocks may now be wrong.
    pub fn set_options(&mut self, options: DiffOptions) {
        if self.options.requires_rebuild(&options) {
            self.stale = true;
        }
        self.options = options;
    }

    pub fn options(&self) -> DiffOptions {
        self.options
    }

    /// Recompute the whole diff list from the current buffer contents.
    /// Returns per-slot differ failures; those pairs simply contribute no
    /// blocks rather than aborting the rebuild (spec §7).
    pub fn rebuild(&mut self) -> Vec<(BufferSlot, DiffError)> {
        let failures = rebuild::rebuild(
            &mut self.list,
            &self.slots,
            &self.differ,
            self.options.flags,
            &self.scratch_dir,
        );
        self.stale = false;
        self.redraw_pending = true;
        for (slot, err) in &failures {
            warn!(target: "diff.rebuild", slot = slot.index(), error = %err, "pair rebuild failed");
        }
        failures
    }

    /// Rebuild only if something has marked the engine stale since the last
    /// rebuild; a cheap guard for hosts that call this on every redraw.
    pub fn rebuild_if_stale(&mut self) -> Vec<(BufferSlot, DiffError)> {
        if self.stale {
            self.rebuild()
        } else {
            Vec::new()
        }
    }

    /// Notify the engine that `slot` replaced lines `[first, last]`
    /// (inclusive; `last < first` for a pure insertion after `first`) with
    /// `new_count` lines. Adjusts the existing list in place without
    /// re-invoking the differ (spec §4.5).
    pub fn notify_edit(&mut self, slot: BufferSlot, first: Lnum, last: Lnum, new_count: Lnum) {
        let participating: Vec<usize> = self.slots.participating().map(BufferSlot::index).collect();
        edit_tracker::notify_edit(&mut self.list, slot.index(), first, last, new_count, &participating, false);
        rebuild::normalize(&mut self.list, &self.slots, &participating, self.options.flags);
        self.fold_invalidations.push(FoldInvalidation { slot, first, last });
        self.redraw_pending = true;
    }

    pub fn classify_line(&self, slot: BufferSlot, lnum: Lnum) -> LineClass {
        let participating: Vec<usize> = self.slots.participating().map(BufferSlot::index).collect();
        let flags = self.options.flags;
        let filler = flags.contains(CompareFlags::FILLER);
        let own_line = self.slots.get(slot).and_then(|buf| buf.line(lnum));
        query::classify_line(&self.list, slot.index(), lnum, &participating, filler, |other_slot, other_lnum| {
            let other_line = self.slots.get(BufferSlot(other_slot)).and_then(|buf| buf.line(other_lnum));
            match (&own_line, other_line) {
                (Some(a), Some(b)) => comparator::lines_equal(a, &b, flags),
                _ => false,
            }
        })
    }

    pub fn intra_line_diff(&self, a: &str, b: &str) -> Option<(usize, usize)> {
        query::intra_line_diff(a, b, self.options.flags)
    }

    pub fn map_topline(&self, from: BufferSlot, to: BufferSlot, lnum: Lnum) -> Lnum {
        query::map_topline(&self.list, from.index(), to.index(), lnum)
    }

    pub fn fold_contains(&self, slot: BufferSlot, first: Lnum, last: Lnum) -> bool {
        query::fold_contains(&self.list, slot.index(), first, last, Some(self.options.context))
    }

    /// Copy a block's lines between two participating buffers (spec §4.7).
    pub fn transfer(&mut self, source: BufferSlot, target: Target, block_idx: usize) -> Result<BufferSlot, DiffError> {
        let resolved =
            transfer::transfer(&mut self.list, &mut self.slots, source, target, block_idx, self.options.flags)?;
        self.fold_invalidations.push(FoldInvalidation {
            slot: resolved,
            first: 1,
            last: MAX_LNUM,
        });
        self.redraw_pending = true;
        Ok(resolved)
    }

    pub fn list(&self) -> &DiffList {
        &self.list
    }

    /// Drain and return whether a redraw has been requested since the last
    /// call (vim's deferred `diff_redraw`).
    pub fn take_redraw_pending(&mut self) -> bool {
        std::mem::take(&mut self.redraw_pending)
    }

    /// Drain the fold invalidation queue accumulated since the last call.
    pub fn take_fold_invalidations(&mut self) -> Vec<FoldInvalidation> {
        std::mem::take(&mut self.fold_invalidations)
    }
}

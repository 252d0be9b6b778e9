//! Buffer collaborator contract (spec §6) and the fixed-capacity slot array
//! (spec §3 "Participating buffer slot").

use crate::lnum::Lnum;
use std::path::Path;

/// Up to four buffers can be diff'ed at once (vim's `DB_COUNT`).
pub const DB_COUNT: usize = 4;

/// A handle the host receives back from [`crate::DiffEngine::register_buffer`]
/// and must present to every later call that names a participating buffer.
/// Wraps the slot's array position; becomes meaningless once the buffer it
/// named has been unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferSlot(pub(crate) usize);

impl BufferSlot {
    /// Raw slot index in `0..DB_COUNT`, exposed for hosts that want to key
    /// their own side tables by it.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Everything the diff engine needs from a text buffer, without depending on
/// any concrete rope/storage implementation (spec §6, §9 "Ownership of line
/// buffers").
///
/// Implementations must treat `lnum` as 1-based. `line` returns an owned
/// `String` rather than a borrowed slice on purpose: the original collaborator
/// invalidates its last-fetched-line pointer on the next fetch, and encoding
/// that in this trait (owned return) makes the hazard impossible to
/// reproduce in the port instead of merely documenting it.
pub trait DiffBuffer {
    /// Total number of lines currently in the buffer.
    fn line_count(&self) -> usize;

    /// Fetch line `lnum` (1-based). `None` if out of range.
    fn line(&self, lnum: Lnum) -> Option<String>;

    /// Delete line `lnum` (1-based), shifting subsequent lines up.
    fn delete_line(&mut self, lnum: Lnum);

    /// Insert `text` as a new line immediately after line `after` (1-based;
    /// `0` inserts before the first line).
    fn append_line_after(&mut self, after: Lnum, text: &str);

    /// Write the full buffer contents to `path`, one line per text line.
    fn write_to_file(&self, path: &Path) -> anyhow::Result<()>;

    /// Record an undo checkpoint covering `[first, last]` (1-based,
    /// inclusive) before the Transfer Operator mutates that range.
    fn undo_checkpoint(&mut self, first: Lnum, last: Lnum);
}

/// The fixed-capacity slot array (spec §3). Order is insertion order; slot 0
/// (the first occupied slot) is the reference buffer during rebuilds.
pub struct Slots<B: ?Sized> {
    slots: [Option<Box<B>>; DB_COUNT],
}

impl<B: DiffBuffer + ?Sized> Default for Slots<B> {
    fn default() -> Self {
        Self {
            slots: [None, None, None, None],
        }
    }
}

impl<B: DiffBuffer + ?Sized> Slots<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert into the first empty slot. Returns `None` if all four are full.
    pub fn insert(&mut self, buf: Box<B>) -> Option<BufferSlot> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(buf);
                return Some(BufferSlot(i));
            }
        }
        None
    }

    pub fn remove(&mut self, slot: BufferSlot) -> Option<Box<B>> {
        self.slots[slot.0].take()
    }

    pub fn get(&self, slot: BufferSlot) -> Option<&B> {
        self.slots[slot.0].as_deref()
    }

    pub fn get_mut(&mut self, slot: BufferSlot) -> Option<&mut B> {
        self.slots[slot.0].as_deref_mut()
    }

    pub fn is_occupied(&self, slot: BufferSlot) -> bool {
        self.slots[slot.0].is_some()
    }

    /// Index of the first occupied slot ("the reference buffer"), if any.
    pub fn reference(&self) -> Option<BufferSlot> {
        self.participating().next()
    }

    /// Iterate occupied slots in array order.
    pub fn participating(&self) -> impl Iterator<Item = BufferSlot> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_some().then_some(BufferSlot(i)))
    }

    /// Occupied slots other than `exclude`, in array order.
    pub fn participating_except(&self, exclude: BufferSlot) -> impl Iterator<Item = BufferSlot> + '_ {
        self.participating().filter(move |s| *s != exclude)
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;
    impl DiffBuffer for Dummy {
        fn line_count(&self) -> usize {
            0
        }
        fn line(&self, _lnum: Lnum) -> Option<String> {
            None
        }
        fn delete_line(&mut self, _lnum: Lnum) {}
        fn append_line_after(&mut self, _after: Lnum, _text: &str) {}
        fn write_to_file(&self, _path: &Path) -> anyhow::Result<()> {
            Ok(())
        }
        fn undo_checkpoint(&mut self, _first: Lnum, _last: Lnum) {}
    }

    #[test]
    fn insert_fills_first_empty_slot_and_reports_capacity() {
        let mut slots: Slots<Dummy> = Slots::new();
        let a = slots.insert(Box::new(Dummy)).unwrap();
        assert_eq!(a.index(), 0);
        for _ in 0..3 {
            slots.insert(Box::new(Dummy)).unwrap();
        }
        assert!(slots.insert(Box::new(Dummy)).is_none());
        assert_eq!(slots.count(), 4);
        assert_eq!(slots.reference(), Some(a));
    }

    #[test]
    fn remove_frees_slot_for_reuse() {
        let mut slots: Slots<Dummy> = Slots::new();
        let a = slots.insert(Box::new(Dummy)).unwrap();
        slots.remove(a);
        assert!(!slots.is_occupied(a));
        let b = slots.insert(Box::new(Dummy)).unwrap();
        assert_eq!(b, a);
    }
}

//! Transfer Operator (spec §4.7): copies a block's lines from one
//! participating buffer into another (vim's `ex_diffgetput`).

use tracing::{debug, info};

use crate::block::DiffList;
use crate::buffer::{BufferSlot, DiffBuffer, Slots};
use crate::comparator::{lines_equal, CompareFlags};
use crate::error::DiffError;
use crate::lnum::Lnum;

/// Which buffer a transfer should pull from / push to when the caller
/// hasn't already resolved a concrete slot. Resolving a numeric id or a
/// name pattern into a slot is the host's job: `core-diff` only ever sees
/// slots it already knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Auto-detect: succeeds only when exactly one other buffer besides the
    /// source is currently participating.
    Implicit,
    Explicit(BufferSlot),
}

/// Copy the lines of block `block_idx` from `source` into `target`
/// (vim's `diffget`/`diffput`, direction determined by caller). Returns the
/// resolved target slot on success.
///
/// Reentrancy: callers must not invoke this while already inside a transfer
/// for the same engine; `core-diff` itself holds no internal lock since it
/// has no concurrency of its own, but a host driving it from a single
/// command loop should treat this the same way vim treats `diff_busy`.
pub fn transfer<B: DiffBuffer + ?Sized>(
    list: &mut DiffList,
    slots: &mut Slots<B>,
    source: BufferSlot,
    target: Target,
    block_idx: usize,
    flags: CompareFlags,
) -> Result<BufferSlot, DiffError> {
    if !slots.is_occupied(source) {
        return Err(DiffError::NotParticipating(source));
    }
    let target_slot = resolve_target(slots, source, target)?;

    let block = list.get(block_idx).ok_or(DiffError::NotParticipating(source))?.clone();
    let src_start = block.start[source.index()];
    let src_count = block.count[source.index()];
    let dst_start = block.start[target_slot.index()];
    let dst_count = block.count[target_slot.index()];

    let lines: Vec<String> = {
        let src_buf = slots.get(source).expect("checked occupied above");
        (0..src_count)
            .filter_map(|i| src_buf.line(src_start + i))
            .collect()
    };

    {
        let dst_buf = slots.get_mut(target_slot).expect("resolved target is occupied");
        if dst_count > 0 {
            dst_buf.undo_checkpoint(dst_start, dst_start + dst_count - 1);
            for _ in 0..dst_count {
                dst_buf.delete_line(dst_start);
            }
        } else {
            dst_buf.undo_checkpoint(dst_start, dst_start);
        }
        let mut after = dst_start.saturating_sub(1);
        for line in &lines {
            dst_buf.append_line_after(after, line);
            after += 1;
        }
    }

    info!(
        target: "diff.transfer",
        source = source.index(),
        target = target_slot.index(),
        lines = lines.len(),
        "transferred block"
    );

    // spec §4.7 step 4: the block is only fully resolved once every other
    // participating buffer already matches the content source/target now
    // share; if any third buffer still disagrees, the block survives with
    // its target-side count corrected to the newly-copied length rather
    // than waiting for the Edit Tracker (which is a no-op for a same-size
    // replace) or a later rebuild to notice.
    let still_differs = slots.participating().any(|i| {
        if i == source || i == target_slot {
            return false;
        }
        let idx = i.index();
        if block.count[idx] as usize != lines.len() {
            return true;
        }
        let other_buf = slots.get(i).expect("participating slot occupied");
        (0..block.count[idx]).any(|k| match other_buf.line(block.start[idx] + k) {
            Some(other_line) => !lines_equal(&lines[k as usize], &other_line, flags),
            None => true,
        })
    });

    if still_differs {
        if let Some(b) = list.get_mut(block_idx) {
            b.count[target_slot.index()] = src_count;
        }
    } else {
        list.remove(block_idx);
    }

    let delta = lines.len() as i64 - dst_count as i64;
    let participating: Vec<usize> = slots.participating().map(BufferSlot::index).collect();
    // busy = true: this notification is induced by our own rewrite of the
    // destination buffer, so it must never allocate a new block (spec §4.7).
    crate::edit_tracker::notify_edit(
        list,
        target_slot.index(),
        dst_start,
        dst_start.saturating_add(dst_count).saturating_sub(1),
        lines.len() as Lnum,
        &participating,
        true,
    );
    debug!(target: "diff.transfer", delta, still_differs, "adjusted diff list after transfer");

    Ok(target_slot)
}

fn resolve_target<B: DiffBuffer + ?Sized>(
    slots: &Slots<B>,
    source: BufferSlot,
    target: Target,
) -> Result<BufferSlot, DiffError> {
    match target {
        Target::Explicit(slot) => {
            if slots.is_occupied(slot) {
                Ok(slot)
            } else {
                Err(DiffError::NotParticipating(slot))
            }
        }
        Target::Implicit => {
            let mut others = slots.participating_except(source);
            let first = others.next().ok_or(DiffError::NotFound)?;
            if others.next().is_some() {
                Err(DiffError::Ambiguous(slots.count() - 1))
            } else {
                Ok(first)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DiffBlock;
    use std::cell::RefCell;

    struct StringBuffer(RefCell<Vec<String>>, RefCell<Vec<(Lnum, Lnum)>>);

    impl StringBuffer {
        fn new(lines: &[&str]) -> Self {
            Self(RefCell::new(lines.iter().map(|s| s.to_string()).collect()), RefCell::new(Vec::new()))
        }
    }

    impl DiffBuffer for StringBuffer {
        fn line_count(&self) -> usize {
            self.0.borrow().len()
        }
        fn line(&self, lnum: Lnum) -> Option<String> {
            self.0.borrow().get((lnum.checked_sub(1)?) as usize).cloned()
        }
        fn delete_line(&mut self, lnum: Lnum) {
            self.0.borrow_mut().remove((lnum - 1) as usize);
        }
        fn append_line_after(&mut self, after: Lnum, text: &str) {
            self.0.borrow_mut().insert(after as usize, text.to_string());
        }
        fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
            std::fs::write(path, self.0.borrow().join("\n"))?;
            Ok(())
        }
        fn undo_checkpoint(&mut self, first: Lnum, last: Lnum) {
            self.1.borrow_mut().push((first, last));
        }
    }

    #[test]
    fn transfer_copies_block_lines_and_adjusts_target_list() {
        let mut slots: Slots<StringBuffer> = Slots::new();
        let a = slots.insert(Box::new(StringBuffer::new(&["x", "y", "z"]))).unwrap();
        let b = slots.insert(Box::new(StringBuffer::new(&["x", "Y", "z"]))).unwrap();

        let mut list = DiffList::new();
        list.push(DiffBlock::new([2, 2, 0, 0], [1, 1, 0, 0]));

        let resolved = transfer(&mut list, &mut slots, a, Target::Implicit, 0, CompareFlags::empty()).unwrap();
        assert_eq!(resolved, b);

        assert_eq!(slots.get(b).unwrap().line(2).unwrap(), "y");
        assert_eq!(slots.get(b).unwrap().0.borrow().len(), 3);
        // Only a/b participate, so once b matches a the block is fully
        // resolved (spec §4.7 step 4) without waiting for a rebuild.
        assert!(list.is_empty());
    }

    #[test]
    fn transfer_records_undo_checkpoint_on_destination() {
        let mut slots: Slots<StringBuffer> = Slots::new();
        let a = slots.insert(Box::new(StringBuffer::new(&["x", "y", "z"]))).unwrap();
        let _b = slots.insert(Box::new(StringBuffer::new(&["x", "Y", "z"]))).unwrap();

        let mut list = DiffList::new();
        list.push(DiffBlock::new([2, 2, 0, 0], [1, 1, 0, 0]));

        let resolved = transfer(&mut list, &mut slots, a, Target::Implicit, 0, CompareFlags::empty()).unwrap();
        assert_eq!(slots.get(resolved).unwrap().1.borrow().len(), 1);
    }

    #[test]
    fn transfer_keeps_block_when_another_participant_still_differs() {
        let mut slots: Slots<StringBuffer> = Slots::new();
        let a = slots.insert(Box::new(StringBuffer::new(&["x", "y", "z"]))).unwrap();
        let b = slots.insert(Box::new(StringBuffer::new(&["x", "Y", "z"]))).unwrap();
        let _c = slots.insert(Box::new(StringBuffer::new(&["x", "Z", "z"]))).unwrap();

        let mut list = DiffList::new();
        list.push(DiffBlock::new([2, 2, 2, 0], [1, 1, 1, 0]));

        let resolved = transfer(&mut list, &mut slots, a, Target::Explicit(b), 0, CompareFlags::empty()).unwrap();
        assert_eq!(resolved, b);
        assert_eq!(slots.get(b).unwrap().line(2).unwrap(), "y");

        // c still disagrees with the now-matching a/b pair, so the block
        // survives with its target-side count fixed up rather than being
        // deleted outright.
        assert_eq!(list.len(), 1);
        let block = list.get(0).unwrap();
        assert_eq!(block.count[b.index()], 1);
        assert_eq!(block.count[2], 1);
    }

    #[test]
    fn transfer_with_no_other_buffer_is_not_found() {
        let mut slots: Slots<StringBuffer> = Slots::new();
        let a = slots.insert(Box::new(StringBuffer::new(&["x"]))).unwrap();
        let mut list = DiffList::new();
        list.push(DiffBlock::new([1, 0, 0, 0], [0, 0, 0, 0]));

        let err = transfer(&mut list, &mut slots, a, Target::Implicit, 0, CompareFlags::empty()).unwrap_err();
        assert!(matches!(err, DiffError::NotFound));
    }

    #[test]
    fn transfer_with_multiple_others_and_no_explicit_target_is_ambiguous() {
        let mut slots: Slots<StringBuffer> = Slots::new();
        let a = slots.insert(Box::new(StringBuffer::new(&["x"]))).unwrap();
        slots.insert(Box::new(StringBuffer::new(&["x"]))).unwrap();
        slots.insert(Box::new(StringBuffer::new(&["x"]))).unwrap();
        let mut list = DiffList::new();
        list.push(DiffBlock::new([1, 1, 1, 0], [0, 0, 0, 0]));

        let err = transfer(&mut list, &mut slots, a, Target::Implicit, 0, CompareFlags::empty()).unwrap_err();
        assert!(matches!(err, DiffError::Ambiguous(2)));
    }

    #[test]
    fn transfer_to_unregistered_explicit_slot_is_not_participating() {
        let mut slots: Slots<StringBuffer> = Slots::new();
        let a = slots.insert(Box::new(StringBuffer::new(&["x"]))).unwrap();
        let mut list = DiffList::new();
        list.push(DiffBlock::new([1, 0, 0, 0], [0, 0, 0, 0]));

        let err =
            transfer(&mut list, &mut slots, a, Target::Explicit(BufferSlot(3)), 0, CompareFlags::empty()).unwrap_err();
        assert!(matches!(err, DiffError::NotParticipating(_)));
    }
}

//! Diff Block and Diff List (spec §4.2), and the Block Normalizer (spec
//! §4.2 "Normalizer") that keeps a list minimal after edits or merges.

use crate::buffer::DB_COUNT;
use crate::lnum::Lnum;

/// One aligned span across every participating slot (vim's `diffblock_T`).
///
/// `start[i]`/`count[i]` are only meaningful for slots that were occupied
/// when this block was built; unoccupied slots carry `count == 0` and
/// `start` equal to whichever line the block begins at in the reference
/// buffer, mirroring how the original leaves unused trailing buffer fields
/// untouched rather than sentinel-filling them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffBlock {
    pub start: [Lnum; DB_COUNT],
    pub count: [Lnum; DB_COUNT],
}

impl DiffBlock {
    pub fn new(start: [Lnum; DB_COUNT], count: [Lnum; DB_COUNT]) -> Self {
        Self { start, count }
    }

    /// True if every occupied slot in `participating` has zero lines in this
    /// block, i.e. it marks a pure insertion/deletion boundary with nothing
    /// on at least one side everywhere.
    pub fn is_empty_everywhere(&self, participating: &[usize]) -> bool {
        participating.iter().all(|&i| self.count[i] == 0)
    }

    /// One past the last line this block covers in slot `i`.
    pub fn end(&self, i: usize) -> Lnum {
        self.start[i] + self.count[i]
    }
}

/// An ordered run of [`DiffBlock`]s covering a set of participating buffers
/// front to back with no gaps (spec §4.2 invariant P1/P2). Vec-backed rather
/// than a literal linked list: blocks are never referenced by identity
/// outside the list, so there is nothing an intrusive pointer buys here that
/// index-based access doesn't.
#[derive(Debug, Default, Clone)]
pub struct DiffList {
    blocks: Vec<DiffBlock>,
}

impl DiffList {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiffBlock> {
        self.blocks.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&DiffBlock> {
        self.blocks.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut DiffBlock> {
        self.blocks.get_mut(idx)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn push(&mut self, block: DiffBlock) {
        self.blocks.push(block);
    }

    pub fn insert(&mut self, idx: usize, block: DiffBlock) {
        self.blocks.insert(idx, block);
    }

    pub fn remove(&mut self, idx: usize) -> DiffBlock {
        self.blocks.remove(idx)
    }

    /// Find the index of the first block whose span in slot `slot` ends at
    /// or after `lnum`, i.e. the block that contains or immediately follows
    /// `lnum`. Used by the Query Surface and the Edit Tracker to locate the
    /// block an event falls in without a linear rescan from the caller.
    pub fn block_at_or_after(&self, slot: usize, lnum: Lnum) -> Option<usize> {
        self.blocks.iter().position(|b| b.end(slot) > lnum || (b.count[slot] == 0 && b.start[slot] >= lnum))
    }

    pub fn last_mut(&mut self) -> Option<&mut DiffBlock> {
        self.blocks.last_mut()
    }
}

/// Drop leading/trailing lines common to every participating slot from a
/// freshly built block, shrinking its span and shifting `start` forward for
/// the leading trim (vim's `diff_check_unchanged` does this lazily per
/// query; building it into normalization keeps every other module free of
/// re-deriving "is this line actually different" on each read).
///
/// `equal` receives `(slot_a, lnum_a, slot_b, lnum_b)` and should answer
/// whether those two lines compare equal under the active flags; callers
/// close over the buffer handles and comparator.
pub fn trim_equal_edges<F>(block: &mut DiffBlock, participating: &[usize], mut equal: F)
where
    F: FnMut(usize, Lnum, usize, Lnum) -> bool,
{
    if participating.len() < 2 {
        return;
    }
    let min_count = participating.iter().map(|&i| block.count[i]).min().unwrap_or(0);

    let mut leading = 0;
    while leading < min_count {
        let reference = participating[0];
        let ref_lnum = block.start[reference] + leading;
        let all_equal = participating[1..].iter().all(|&other| {
            let other_lnum = block.start[other] + leading;
            equal(reference, ref_lnum, other, other_lnum)
        });
        if !all_equal {
            break;
        }
        leading += 1;
    }

    let mut trailing = 0;
    while trailing < min_count - leading {
        let reference = participating[0];
        let ref_lnum = block.end(reference) - 1 - trailing;
        let all_equal = participating[1..].iter().all(|&other| {
            let other_lnum = block.end(other) - 1 - trailing;
            equal(reference, ref_lnum, other, other_lnum)
        });
        if !all_equal {
            break;
        }
        trailing += 1;
    }

    for &i in participating {
        block.start[i] += leading;
        block.count[i] = block.count[i].saturating_sub(leading + trailing);
    }
}

/// Merge block `idx` into its predecessor if they are contiguous in every
/// occupied slot (no gap and no overlap). Returns `true` if a merge
/// happened, in which case block `idx` has been removed from the list.
pub fn merge_adjacent(list: &mut DiffList, idx: usize, participating: &[usize]) -> bool {
    if idx == 0 || idx >= list.len() {
        return false;
    }
    let touching = {
        let prev = list.get(idx - 1).unwrap();
        let cur = list.get(idx).unwrap();
        participating.iter().all(|&i| prev.end(i) == cur.start[i])
    };
    if !touching {
        return false;
    }
    let cur = list.remove(idx);
    let prev = list.get_mut(idx - 1).unwrap();
    for &i in participating {
        prev.count[i] += cur.count[i];
    }
    true
}

/// Remove a block that ended up with zero lines in every participating
/// slot after trimming or an edit shrank it away entirely (vim folds this
/// case into `diff_check_unchanged`'s bookkeeping rather than leaving
/// degenerate zero-width blocks in the list).
pub fn sweep_empty(list: &mut DiffList, participating: &[usize]) {
    let mut i = 0;
    while i < list.len() {
        if list.get(i).unwrap().is_empty_everywhere(participating) {
            list.remove(i);
        } else {
            i += 1;
        }
    }
}

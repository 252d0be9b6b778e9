//! Diff Parser (spec §4.3): turns one buffer pair's directive stream into
//! [`DiffBlock`] entries and folds them into the shared, multi-way
//! [`DiffList`] (vim's `diff_read`).
//!
//! The list only ever holds blocks where at least one participating slot
//! differs from the reference; unchanged runs between blocks are implicit.
//! Reconciling a new pair's changes against blocks already contributed by
//! earlier pairs is the "overlap" case: when the new pair's change and an
//! existing block's reference span intersect, they're combined into one
//! wider block rather than split at the exact boundary (see
//! `DESIGN.md` for the rationale — vim tracks this with a transient
//! negative `branch` count mid-computation; here it never leaves
//! `fold_overlap`).

use crate::block::{DiffBlock, DiffList};
use crate::differ::{DirectiveKind, ParsedDirective};

/// One directive converted to this buffer pair's own coordinate system:
/// `ref_*` in the reference buffer, `other_*` in the non-reference buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairBlock {
    pub ref_start: u32,
    pub ref_count: u32,
    pub other_start: u32,
    pub other_count: u32,
}

/// Convert a directive stream (already ordered by reference position, as
/// differ output always is) into [`PairBlock`]s.
pub fn directives_to_pair_blocks(directives: &[ParsedDirective]) -> Vec<PairBlock> {
    directives
        .iter()
        .map(|d| match d.kind {
            DirectiveKind::Add => PairBlock {
                ref_start: d.from.0 + 1,
                ref_count: 0,
                other_start: d.to.0,
                other_count: d.to.1 - d.to.0 + 1,
            },
            DirectiveKind::Delete => PairBlock {
                ref_start: d.from.0,
                ref_count: d.from.1 - d.from.0 + 1,
                other_start: d.to.0 + 1,
                other_count: 0,
            },
            DirectiveKind::Change => PairBlock {
                ref_start: d.from.0,
                ref_count: d.from.1 - d.from.0 + 1,
                other_start: d.to.0,
                other_count: d.to.1 - d.to.0 + 1,
            },
        })
        .collect()
}

/// Fold one pair's [`PairBlock`]s into `list`, writing `other`'s start/count
/// into every resulting block and extending any other already-occupied
/// slot's span to cover a union that grew past its own original block.
///
/// `reference` and `other` are slot indices (`0..DB_COUNT`); `established`
/// lists every slot index already present in `list`'s blocks before this
/// call (i.e. every occupied slot except `other`).
pub fn fold_overlap(
    list: &mut DiffList,
    reference: usize,
    other: usize,
    established: &[usize],
    pair_blocks: &[PairBlock],
) {
    for pb in pair_blocks {
        let mut union_lo = pb.ref_start;
        let mut union_hi = pb.ref_start + pb.ref_count;

        // Existing blocks whose reference span touches or overlaps the new
        // block's reference span, found by repeated scan since absorbing one
        // block can bring a further one into range.
        let mut merged_old: Vec<DiffBlock> = Vec::new();
        loop {
            let mut grew = false;
            let mut i = 0;
            while i < list.len() {
                let b = list.get(i).unwrap();
                let b_lo = b.start[reference];
                let b_hi = b.end(reference);
                let touches = b_lo <= union_hi && union_lo <= b_hi;
                if touches {
                    union_lo = union_lo.min(b_lo);
                    union_hi = union_hi.max(b_hi);
                    merged_old.push(list.remove(i));
                    grew = true;
                } else {
                    i += 1;
                }
            }
            if !grew {
                break;
            }
        }
        merged_old.sort_by_key(|b| b.start[reference]);

        // Nearest block preceding the union that wasn't absorbed into it.
        // When an established slot has no data of its own inside the union
        // (`pieces` empty below), its coordinates must still carry forward
        // whatever offset that prior block left open, exactly like
        // `diff_copy_entry`'s `off` (spec §4.3) — not collapse back to the
        // reference's own coordinates.
        let anchor = list.iter().rev().find(|b| b.end(reference) <= union_lo).cloned();

        let mut new_block = DiffBlock::new([union_lo; 4], [0; 4]);
        new_block.start[reference] = union_lo;
        new_block.count[reference] = union_hi - union_lo;

        let (o_start, o_count) = slot_extent(
            union_lo,
            union_hi,
            &[(pb.ref_start, pb.ref_count, pb.other_start, pb.other_count)],
            0,
        );
        new_block.start[other] = o_start;
        new_block.count[other] = o_count;

        for &slot in established {
            if slot == reference || slot == other {
                continue;
            }
            let pieces: Vec<(u32, u32, u32, u32)> = merged_old
                .iter()
                .map(|b| (b.start[reference], b.count[reference], b.start[slot], b.count[slot]))
                .collect();
            let off = match &anchor {
                Some(a) => a.end(reference) as i64 - a.end(slot) as i64,
                None => 0,
            };
            let (s_start, s_count) = slot_extent(union_lo, union_hi, &pieces, off);
            new_block.start[slot] = s_start;
            new_block.count[slot] = s_count;
        }

        let insert_at = list
            .iter()
            .position(|b| b.start[reference] >= union_hi)
            .unwrap_or(list.len());
        list.insert(insert_at, new_block);
    }
}

/// Compute a slot's `(start, count)` across `[union_lo, union_hi)` of
/// reference-space, given the explicit `(ref_start, ref_count, slot_start,
/// slot_count)` pieces known within that range (sorted by `ref_start`, each
/// piece's own range must lie inside `[union_lo, union_hi)`). Gaps between
/// pieces, and before the first / after the last, are unchanged stretches:
/// same length as the corresponding reference gap, offset preserved.
///
/// `off` is the running reference-to-slot offset carried in from whatever
/// preceded the union (`diff_copy_entry`'s `off`, spec §4.3); it only
/// matters when `pieces` is empty, since a non-empty piece list anchors its
/// own coordinates directly.
fn slot_extent(union_lo: u32, union_hi: u32, pieces: &[(u32, u32, u32, u32)], off: i64) -> (u32, u32) {
    if pieces.is_empty() {
        let start = (union_lo as i64 - off).max(0) as u32;
        return (start, union_hi - union_lo);
    }
    let mut cursor = union_lo;
    let mut start = None;
    let mut count = 0u32;
    for &(r_lo, r_cnt, s_lo, s_cnt) in pieces {
        if r_lo > cursor {
            let gap = r_lo - cursor;
            if start.is_none() {
                start = Some(s_lo.saturating_sub(gap));
            }
            count += gap;
        }
        if start.is_none() {
            start = Some(s_lo);
        }
        count += s_cnt;
        cursor = r_lo + r_cnt;
    }
    if union_hi > cursor {
        count += union_hi - cursor;
    }
    (start.unwrap_or(union_lo), count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::parse_directive;

    #[test]
    fn single_pair_change_becomes_one_block() {
        let directives = vec![parse_directive("3,4c3,3").unwrap()];
        let pair_blocks = directives_to_pair_blocks(&directives);
        let mut list = DiffList::new();
        fold_overlap(&mut list, 0, 1, &[], &pair_blocks);
        assert_eq!(list.len(), 1);
        let b = list.get(0).unwrap();
        assert_eq!((b.start[0], b.count[0]), (3, 2));
        assert_eq!((b.start[1], b.count[1]), (3, 1));
    }

    #[test]
    fn pure_insert_has_zero_reference_count() {
        let directives = vec![parse_directive("5a6,7").unwrap()];
        let pair_blocks = directives_to_pair_blocks(&directives);
        let mut list = DiffList::new();
        fold_overlap(&mut list, 0, 1, &[], &pair_blocks);
        let b = list.get(0).unwrap();
        assert_eq!((b.start[0], b.count[0]), (6, 0));
        assert_eq!((b.start[1], b.count[1]), (6, 2));
    }

    #[test]
    fn pure_delete_has_zero_other_count() {
        let directives = vec![parse_directive("5,6d4").unwrap()];
        let pair_blocks = directives_to_pair_blocks(&directives);
        let mut list = DiffList::new();
        fold_overlap(&mut list, 0, 1, &[], &pair_blocks);
        let b = list.get(0).unwrap();
        assert_eq!((b.start[0], b.count[0]), (5, 2));
        assert_eq!((b.start[1], b.count[1]), (5, 0));
    }

    #[test]
    fn second_pair_extends_third_slot_across_union() {
        // First pair (ref=0, other=1): change at ref lines 3-4.
        let mut list = DiffList::new();
        let d1 = vec![parse_directive("3,4c3,4").unwrap()];
        fold_overlap(&mut list, 0, 1, &[], &directives_to_pair_blocks(&d1));

        // Second pair (ref=0, other=2): a wider change at ref lines 2-5
        // overlapping the first block; slot 1 must be extended to match.
        let d2 = vec![parse_directive("2,5c2,5").unwrap()];
        fold_overlap(&mut list, 0, 2, &[1], &directives_to_pair_blocks(&d2));

        assert_eq!(list.len(), 1);
        let b = list.get(0).unwrap();
        assert_eq!((b.start[0], b.count[0]), (2, 4));
        assert_eq!((b.start[2], b.count[2]), (2, 4));
        // slot 1 (established) only truly changed at 3-4; extended by one
        // unchanged line on each side to cover the wider union.
        assert_eq!((b.start[1], b.count[1]), (2, 4));
    }

    #[test]
    fn non_overlapping_pairs_stay_separate_blocks() {
        let mut list = DiffList::new();
        let d1 = vec![parse_directive("3,4c3,4").unwrap()];
        fold_overlap(&mut list, 0, 1, &[], &directives_to_pair_blocks(&d1));

        let d2 = vec![parse_directive("10,11c10,11").unwrap()];
        fold_overlap(&mut list, 0, 2, &[1], &directives_to_pair_blocks(&d2));

        assert_eq!(list.len(), 2);
    }

    #[test]
    fn established_slot_without_local_data_inherits_prior_blocks_offset() {
        // First pair (A=ref, B=other): B gained two extra lines right after
        // ref line 5.
        let mut list = DiffList::new();
        let d1 = vec![parse_directive("5a6,7").unwrap()];
        fold_overlap(&mut list, 0, 1, &[], &directives_to_pair_blocks(&d1));

        // Second pair (A=ref, C=other): an unrelated change far later in the
        // file, with B already established but carrying no data in this
        // range. B's start must inherit the +2 offset opened by the first
        // block, not copy the reference's own coordinates verbatim.
        let d2 = vec![parse_directive("20,21c20,21").unwrap()];
        fold_overlap(&mut list, 0, 2, &[1], &directives_to_pair_blocks(&d2));

        assert_eq!(list.len(), 2);
        let second = list.get(1).unwrap();
        assert_eq!((second.start[0], second.count[0]), (20, 2));
        assert_eq!((second.start[2], second.count[2]), (20, 2));
        assert_eq!((second.start[1], second.count[1]), (22, 2));
    }
}

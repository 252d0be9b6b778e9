//! Edit Tracker (spec §4.5): keeps an existing diff list roughly correct as
//! a single buffer is edited, without a full rebuild (vim's
//! `diff_mark_adjust`).
//!
//! This is a close port of `diff_mark_adjust`'s cursor-pair walk over the
//! linked list, adapted to the Vec-backed [`DiffList`]: `prev`/`i` play the
//! role of `dprev`/`dp`, and "removing/inserting at an index" stands in for
//! relinking pointers. Trimming newly-adjacent equal edges, merging touching
//! blocks, and sweeping empties are left to [`crate::rebuild::normalize`],
//! which the caller runs immediately after every `notify_edit` — so this
//! function only has to get the raw line-number bookkeeping right.

use crate::block::{DiffBlock, DiffList};
use crate::lnum::Lnum;

/// Adjust `list` for an edit in slot `slot` that replaced the inclusive
/// range `[first, last]` (use `last < first` for a pure insertion
/// immediately after line `first`) with `new_count` lines.
///
/// `participating` lists every occupied slot index, including `slot`
/// itself. `busy` suppresses new-block creation for "open territory" edits
/// (spec §4.5(a)) and must be `true` when this call is induced by the
/// Transfer Operator rewriting its destination buffer (spec §4.7, vim's
/// `diff_busy`), so the operator's own block bookkeeping is authoritative.
pub fn notify_edit(list: &mut DiffList, slot: usize, first: Lnum, last: Lnum, new_count: Lnum, participating: &[usize], busy: bool) {
    let pure_insert = last < first;
    let line2 = if pure_insert { 0 } else { last };
    let old_count = if pure_insert { 0 } else { last - first + 1 };
    let delta = new_count as i64 - old_count as i64;

    // spec §4.5: derive inserted/deleted from the edit shape, mirroring
    // `diff_mark_adjust`'s three-way split on `line2`/`amount_after`.
    let (mut inserted, mut deleted): (Lnum, Lnum) = if pure_insert {
        (new_count, 0)
    } else if delta > 0 {
        (delta as Lnum, 0)
    } else {
        (0, (-delta) as Lnum)
    };

    let mut line1 = first;
    let mut prev: Option<usize> = None;
    let mut i: usize = 0;

    loop {
        // Open territory: the edit touches neither the block before `prev`
        // nor the block at `i`. Allocate a fresh block for it (spec §4.5(a)).
        let after_cur = match list.get(i) {
            None => true,
            Some(cur) => {
                (!pure_insert && cur.start[slot].saturating_sub(1) as i64 > line2 as i64)
                    || (pure_insert && cur.start[slot] > line1)
            }
        };
        let before_prev = match prev {
            None => true,
            Some(p) => list.get(p).unwrap().end(slot) < line1,
        };

        if after_cur && before_prev && !busy {
            let mut fresh = DiffBlock::new([line1; 4], [0; 4]);
            fresh.start[slot] = line1;
            fresh.count[slot] = inserted;
            for &other in participating {
                if other == slot {
                    continue;
                }
                let start = match prev {
                    None => line1,
                    Some(p) => {
                        let pb = list.get(p).unwrap();
                        let off = (pb.start[other] as i64 + pb.count[other] as i64)
                            - (pb.start[slot] as i64 + pb.count[slot] as i64);
                        (line1 as i64 + off).max(0) as Lnum
                    }
                };
                fresh.start[other] = start;
                fresh.count[other] = deleted;
            }
            list.insert(i, fresh);
            i += 1;
        }

        let Some(cur) = list.get(i).cloned() else {
            break;
        };

        let last_line = cur.start[slot] as i64 + cur.count[slot] as i64 - 1;

        // Case 1 (above): the block lies entirely before `line1`; nothing
        // to adjust. Anything else touches or follows the edit.
        if last_line >= line1 as i64 - 1 {
            let touches = inserted != 0 || deleted != 0;
            let line2_eff: i64 = if pure_insert { i64::MAX } else { line2 as i64 };
            let threshold = cur.start[slot] as i64 - if touches { 1 } else { 0 };

            if threshold > line2_eff {
                // Case 6 (below): only the starting line shifts.
                if delta == 0 {
                    break;
                }
                let b = list.get_mut(i).unwrap();
                b.start[slot] = (b.start[slot] as i64 + delta).max(0) as Lnum;
            } else if deleted > 0 {
                if cur.start[slot] >= line1 {
                    let off = cur.start[slot] as i64 - line1 as i64;
                    list.get_mut(i).unwrap().start[slot] = line1;
                    if last_line <= line2 as i64 {
                        // Case 4: delete spans this whole block.
                        let n = match list.get(i + 1) {
                            Some(next) if next.start[slot].saturating_sub(1) as i64 <= line2 as i64 => {
                                let nn = next.start[slot] as i64 - line1 as i64;
                                deleted = (deleted as i64 - nn).max(0) as Lnum;
                                let n = nn - cur.count[slot] as i64;
                                line1 = next.start[slot];
                                n
                            }
                            _ => deleted as i64 - cur.count[slot] as i64,
                        };
                        list.get_mut(i).unwrap().count[slot] = 0;
                        apply_side_effect(list, i, slot, participating, off, n);
                    } else {
                        // Case 5: delete lines at the top of this block.
                        let n = off;
                        let shrink = line2 as i64 - line1 as i64 + 1;
                        let b = list.get_mut(i).unwrap();
                        b.count[slot] = (b.count[slot] as i64 - shrink).max(0) as Lnum;
                        apply_side_effect(list, i, slot, participating, off, n);
                    }
                } else {
                    let off = 0i64;
                    if last_line < line2 as i64 {
                        // Case 2: delete lines at the end of this block.
                        let shrink = last_line - line1 as i64 + 1;
                        list.get_mut(i).unwrap().count[slot] =
                            (cur.count[slot] as i64 - shrink).max(0) as Lnum;
                        let n = match list.get(i + 1) {
                            Some(next) if next.start[slot].saturating_sub(1) as i64 <= line2 as i64 => {
                                let n = next.start[slot] as i64 - 1 - last_line;
                                deleted = (deleted as i64 - (next.start[slot] as i64 - line1 as i64)).max(0) as Lnum;
                                line1 = next.start[slot];
                                n
                            }
                            _ => line2 as i64 - last_line,
                        };
                        apply_side_effect(list, i, slot, participating, off, n);
                    } else {
                        // Case 3: delete lines entirely inside this block.
                        let n = 0i64;
                        list.get_mut(i).unwrap().count[slot] = cur.count[slot].saturating_sub(deleted);
                        apply_side_effect(list, i, slot, participating, off, n);
                    }
                }
            } else {
                // Insertion touching this block (or a no-op same-size edit).
                let b = list.get_mut(i).unwrap();
                if b.start[slot] <= line1 {
                    b.count[slot] = b.count[slot].saturating_add(inserted);
                } else {
                    b.start[slot] = b.start[slot].saturating_add(inserted);
                }
            }
        }

        prev = Some(i);
        i += 1;
    }
}

/// Apply a deletion's side effect to every other participating slot of
/// block `i`: `start` recedes by `off` (the portion of the deleted range
/// that lay above this block) and `count` grows by `n` (lines absorbed from
/// a neighboring block, possibly negative when a continuation shrinks it).
fn apply_side_effect(list: &mut DiffList, i: usize, slot: usize, participating: &[usize], off: i64, n: i64) {
    let block = list.get_mut(i).unwrap();
    for &other in participating {
        if other == slot {
            continue;
        }
        block.start[other] = (block.start[other] as i64 - off).max(0) as Lnum;
        block.count[other] = (block.count[other] as i64 + n).max(0) as Lnum;
    }
}

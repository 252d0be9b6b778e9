//! Query Surface (spec §4.6): read-only answers the host asks on every
//! redraw — how to classify a line, what differs within it, and how a
//! cursor line in one buffer maps to another (vim's `diff_check`,
//! `diff_find_change`, `diff_get_corresponding_line`).

use crate::block::DiffList;
use crate::buffer::{BufferSlot, DiffBuffer, Slots};
use crate::comparator::CompareFlags;
use crate::lnum::Lnum;
use crate::options::DEFAULT_CONTEXT;

/// How a single line in a single buffer should be rendered (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Not part of any diff block.
    None,
    /// Inside a block, and some participating buffer's corresponding line
    /// has different content (or a different span length).
    Changed,
    /// Inside a block where every counterpart with content is byte-for-byte
    /// equal; the block exists only because some other slot has no lines
    /// here at all (a pure insertion/deletion).
    InsertedOrDeleted,
    /// Just below a block whose `count` in some other slot is larger than
    /// in this slot: `n` filler rows should be drawn above this line to
    /// keep the views aligned.
    FillerAbove(u32),
}

/// Classify line `lnum` of `slot` against `list`. `participating` lists every
/// occupied slot index (including `slot` itself); `equal(other_slot,
/// other_lnum)` fetches the counterpart buffer's line and compares it
/// against `slot`'s line `lnum` under the active [`CompareFlags`] — the
/// callee already knows `slot`/`lnum` from its own closure capture.
pub fn classify_line<F>(
    list: &DiffList,
    slot: usize,
    lnum: Lnum,
    participating: &[usize],
    filler: bool,
    mut equal: F,
) -> LineClass
where
    F: FnMut(usize, Lnum) -> bool,
{
    let Some(block) = list.iter().find(|b| lnum <= b.end(slot)) else {
        return LineClass::None;
    };
    if lnum < block.start[slot] {
        return LineClass::None;
    }
    if lnum < block.end(slot) {
        // Compare against every counterpart that actually has a line at
        // this offset; a counterpart whose span is shorter (or empty) here
        // contributes no comparison — its absence is what makes this an
        // insertion/deletion rather than a textual change (spec §4.6, P6:
        // "Changed iff some other participating buffer's line at the
        // mapped position differs").
        let off = lnum - block.start[slot];
        let differs = participating
            .iter()
            .copied()
            .filter(|&i| i != slot && off < block.count[i])
            .any(|i| !equal(i, block.start[i] + off));
        return if differs { LineClass::Changed } else { LineClass::InsertedOrDeleted };
    }
    // lnum == block.end(slot): just below the block.
    if filler {
        let max_count = participating.iter().map(|&i| block.count[i]).max().unwrap_or(0);
        let n = max_count.saturating_sub(block.count[slot]);
        if n > 0 {
            return LineClass::FillerAbove(n);
        }
    }
    LineClass::None
}

/// Byte offset of the first, and one past the last, differing byte between
/// two corresponding lines (vim's `diff_find_change`). `None` if the lines
/// are identical under `flags`.
pub fn intra_line_diff(a: &str, b: &str, flags: CompareFlags) -> Option<(usize, usize)> {
    if crate::comparator::lines_equal(a, b, flags) {
        return None;
    }
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut start = 0;
    while start < a_bytes.len() && start < b_bytes.len() && a_bytes[start] == b_bytes[start] {
        start += 1;
    }

    let mut end_a = a_bytes.len();
    let mut end_b = b_bytes.len();
    while end_a > start && end_b > start && a_bytes[end_a - 1] == b_bytes[end_b - 1] {
        end_a -= 1;
        end_b -= 1;
    }

    Some((start, end_a.max(start)))
}

/// Map `lnum` in `from` to the corresponding line in `to` (vim's
/// `diff_get_corresponding_line`): walk blocks up to `lnum`, accumulating
/// the running offset between the two slots, then apply it.
pub fn map_topline(list: &DiffList, from: usize, to: usize, lnum: Lnum) -> Lnum {
    let mut offset: i64 = 0;
    for block in list.iter() {
        if block.start[from] > lnum {
            break;
        }
        if lnum < block.end(from) {
            // Inside this block: clamp into the corresponding span on `to`,
            // preferring to stay within its occupied range.
            let rel = lnum - block.start[from];
            let mapped = if block.count[to] == 0 {
                block.start[to]
            } else {
                block.start[to] + rel.min(block.count[to] - 1)
            };
            return mapped;
        }
        offset = block.end(to) as i64 - block.end(from) as i64;
    }
    (lnum as i64 + offset).max(0) as Lnum
}

/// Whether a fold spanning `[first, last]` (inclusive) in `slot` should stay
/// closed: true when no line in that range is within `context` lines of a
/// changed block (vim's `diff_infold`, used with `diffopt=context:N`).
pub fn fold_contains(list: &DiffList, slot: usize, first: Lnum, last: Lnum, context: Option<u32>) -> bool {
    let context = context.unwrap_or(DEFAULT_CONTEXT);
    for block in list.iter() {
        let lo = block.start[slot].saturating_sub(context);
        let hi = block.end(slot).saturating_add(context);
        if first <= hi && last >= lo {
            return false;
        }
    }
    true
}

/// Convenience check used by hosts before calling into slot-specific
/// queries: is `slot` one of the buffers currently registered in `slots`?
pub fn is_participating<B: DiffBuffer + ?Sized>(slots: &Slots<B>, slot: BufferSlot) -> bool {
    slots.is_occupied(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DiffBlock;

    fn list_with(blocks: Vec<DiffBlock>) -> DiffList {
        let mut l = DiffList::new();
        for b in blocks {
            l.push(b);
        }
        l
    }

    #[test]
    fn classify_inside_and_outside_block() {
        // A = ["x","x","x","x","DIFF_A","DIFF_A","x"], B mirrors with "DIFF_B".
        let list = list_with(vec![DiffBlock::new([5, 5, 0, 0], [2, 2, 0, 0])]);
        let always_diff = |_i: usize, _b: Lnum| false;
        assert_eq!(classify_line(&list, 0, 4, &[0, 1], false, always_diff), LineClass::None);
        assert_eq!(classify_line(&list, 0, 5, &[0, 1], false, always_diff), LineClass::Changed);
        assert_eq!(classify_line(&list, 0, 7, &[0, 1], false, always_diff), LineClass::None);
    }

    #[test]
    fn classify_inside_block_with_equal_content_is_inserted_or_deleted() {
        // Both sides have the same 2 lines recorded (e.g. a count mismatch
        // elsewhere forced the block open) but content happens to match.
        let list = list_with(vec![DiffBlock::new([5, 5, 0, 0], [2, 2, 0, 0])]);
        let always_equal = |_i: usize, _b: Lnum| true;
        assert_eq!(classify_line(&list, 0, 5, &[0, 1], false, always_equal), LineClass::InsertedOrDeleted);
    }

    #[test]
    fn classify_filler_when_slot_has_no_lines() {
        // A=["x"], B=["x","INS","y"]: pure insertion into B at line 2.
        let list = list_with(vec![DiffBlock::new([5, 5, 0, 0], [0, 2, 0, 0])]);
        let never_reached = |_i: usize, _b: Lnum| panic!("no counterpart to compare");
        assert_eq!(
            classify_line(&list, 0, 5, &[0, 1], true, never_reached),
            LineClass::FillerAbove(2)
        );
        assert_eq!(
            classify_line(&list, 1, 5, &[0, 1], true, |_i, _b| true),
            LineClass::InsertedOrDeleted
        );
    }

    #[test]
    fn intra_line_diff_finds_tight_bounds() {
        let (s, e) = intra_line_diff("foobarbaz", "fooXYZbaz", CompareFlags::empty()).unwrap();
        assert_eq!(&"foobarbaz"[s..e], "bar");
        assert_eq!(&"fooXYZbaz"[s..e], "XYZ");
    }

    #[test]
    fn intra_line_diff_none_when_equal() {
        assert_eq!(intra_line_diff("same", "same", CompareFlags::empty()), None);
    }

    #[test]
    fn map_topline_passes_through_unchanged_region() {
        // Slot 0 has 3 lines (5..8) where slot 1 only has 1 (5..6) for the
        // same block, so lines after it in slot 0 run 2 lines ahead of slot 1.
        let list = list_with(vec![DiffBlock::new([5, 5, 0, 0], [3, 1, 0, 0])]);
        assert_eq!(map_topline(&list, 0, 1, 2), 2);
        assert_eq!(map_topline(&list, 0, 1, 10), 8);
    }

    #[test]
    fn fold_contains_respects_context() {
        let list = list_with(vec![DiffBlock::new([20, 20, 0, 0], [1, 1, 0, 0])]);
        assert!(fold_contains(&list, 0, 1, 10, Some(3)));
        assert!(!fold_contains(&list, 0, 1, 18, Some(3)));
    }
}

//! Rebuild Driver (spec §4.4): recomputes the whole diff list from scratch
//! by writing every participating buffer to a temp file, running the
//! differ once per non-reference buffer against the reference, and folding
//! each pair's output into the list (vim's `ex_diffupdate`).

use std::path::Path;

use tracing::{debug, warn};

use crate::block::{merge_adjacent, sweep_empty, trim_equal_edges, DiffList};
use crate::buffer::{BufferSlot, DiffBuffer, Slots};
use crate::comparator::{lines_equal, CompareFlags};
use crate::differ::{parse_directive, write_temp_file, Differ};
use crate::error::DiffError;
use crate::lnum::Lnum;
use crate::parser::{directives_to_pair_blocks, fold_overlap};

/// Recompute `list` from scratch against the buffers in `slots`.
///
/// Returns the slots for which the differ failed; those pairs contribute no
/// blocks (meaning: the reference and that buffer are treated as having no
/// recorded differences until the next successful rebuild) rather than
/// aborting the whole rebuild, per spec §7.
pub fn rebuild<B: DiffBuffer + ?Sized>(
    list: &mut DiffList,
    slots: &Slots<B>,
    differ: &Differ,
    flags: CompareFlags,
    scratch_dir: &Path,
) -> Vec<(BufferSlot, DiffError)> {
    list.clear();
    let mut failures = Vec::new();

    let Some(reference) = slots.reference() else {
        debug!(target: "diff.rebuild", "no participating buffers, nothing to rebuild");
        return failures;
    };
    let reference_buf = slots.get(reference).expect("reference slot occupied");
    let reference_lines = buffer_lines(reference_buf);
    let reference_path = match write_temp_file(scratch_dir, &reference_lines) {
        Ok(p) => p,
        Err(e) => {
            warn!(target: "diff.rebuild", error = %e, "failed to stage reference buffer");
            return failures;
        }
    };

    let mut established = Vec::new();

    for other in slots.participating_except(reference) {
        let other_buf = slots.get(other).expect("participating slot occupied");
        let other_lines = buffer_lines(other_buf);
        let other_path = match write_temp_file(scratch_dir, &other_lines) {
            Ok(p) => p,
            Err(e) => {
                warn!(target: "diff.rebuild", slot = other.index(), error = %e, "failed to stage buffer");
                failures.push((other, DiffError::DifferFailed { slot: other, reason: e.to_string() }));
                continue;
            }
        };

        let output = match differ.run(&reference_path, &other_path, flags) {
            Ok(o) => o,
            Err(e) => {
                warn!(target: "diff.rebuild", slot = other.index(), error = %e, "differ failed");
                failures.push((other, DiffError::DifferFailed { slot: other, reason: e.to_string() }));
                continue;
            }
        };

        let directives: Vec<_> = output.lines().filter_map(parse_directive).collect();
        if directives.is_empty() && !output.trim().is_empty() {
            warn!(
                target: "diff.rebuild",
                slot = other.index(),
                "differ output had no recognizable directive lines, treating buffer as unchanged"
            );
        }

        let pair_blocks = directives_to_pair_blocks(&directives);
        fold_overlap(list, reference.index(), other.index(), &established, &pair_blocks);
        established.push(other.index());

        debug!(
            target: "diff.rebuild",
            slot = other.index(),
            directive_count = directives.len(),
            "merged pair into diff list"
        );
    }

    let participating: Vec<usize> = slots.participating().map(BufferSlot::index).collect();
    normalize(list, slots, &participating, flags);

    failures
}

/// Re-trim and consolidate every block after a rebuild or an edit-driven
/// mutation: shrink away any leading/trailing lines that actually compare
/// equal, merge touching blocks, and drop anything left empty.
pub fn normalize<B: DiffBuffer + ?Sized>(
    list: &mut DiffList,
    slots: &Slots<B>,
    participating: &[usize],
    flags: CompareFlags,
) {
    for idx in 0..list.len() {
        let block = list.get_mut(idx).unwrap();
        trim_equal_edges(block, participating, |sa, la, sb, lb| {
            let buf_a = slots.get(BufferSlot(sa));
            let buf_b = slots.get(BufferSlot(sb));
            match (buf_a.and_then(|b| b.line(la)), buf_b.and_then(|b| b.line(lb))) {
                (Some(a), Some(b)) => lines_equal(&a, &b, flags),
                _ => false,
            }
        });
    }
    sweep_empty(list, participating);

    let mut i = 1;
    while i < list.len() {
        if merge_adjacent(list, i, participating) {
            continue;
        }
        i += 1;
    }
}

fn buffer_lines<B: DiffBuffer + ?Sized>(buf: &B) -> Vec<String> {
    let n = buf.line_count();
    (1..=n as Lnum).filter_map(|l| buf.line(l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct StringBuffer(RefCell<Vec<String>>);

    impl StringBuffer {
        fn new(lines: &[&str]) -> Self {
            Self(RefCell::new(lines.iter().map(|s| s.to_string()).collect()))
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
        fn undo_checkpoint(&mut self, _first: Lnum, _last: Lnum) {}
    }

    #[test]
    fn rebuild_with_hook_differ_finds_single_line_change() {
        let mut slots: Slots<StringBuffer> = Slots::new();
        let a = slots.insert(Box::new(StringBuffer::new(&["one", "two", "three"]))).unwrap();
        let _b = slots.insert(Box::new(StringBuffer::new(&["one", "TWO", "three"]))).unwrap();
        let _ = a;

        let differ = Differ::hook(|_old, _new| Ok("2c2\n< two\n---\n> TWO\n".to_string()));
        let mut list = DiffList::new();
        let dir = tempfile::tempdir().unwrap();
        let failures = rebuild(&mut list, &slots, &differ, CompareFlags::default(), dir.path());

        assert!(failures.is_empty());
        assert_eq!(list.len(), 1);
        let block = list.get(0).unwrap();
        assert_eq!((block.start[0], block.count[0]), (2, 1));
        assert_eq!((block.start[1], block.count[1]), (2, 1));
    }

    #[test]
    fn rebuild_records_failure_without_aborting_other_pairs() {
        let mut slots: Slots<StringBuffer> = Slots::new();
        slots.insert(Box::new(StringBuffer::new(&["x"]))).unwrap();
        slots.insert(Box::new(StringBuffer::new(&["y"]))).unwrap();

        let differ = Differ::hook(|_old, _new| anyhow::bail!("boom"));
        let mut list = DiffList::new();
        let dir = tempfile::tempdir().unwrap();
        let failures = rebuild(&mut list, &slots, &differ, CompareFlags::default(), dir.path());

        assert_eq!(failures.len(), 1);
        assert!(list.is_empty());
    }
}

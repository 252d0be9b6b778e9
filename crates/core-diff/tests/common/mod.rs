use std::cell::RefCell;
use std::path::Path;

use core_diff::{DiffBuffer, Lnum};

/// Minimal in-memory [`DiffBuffer`] used by integration tests in place of a
/// real rope-backed editor buffer.
pub struct VecBuffer {
    lines: RefCell<Vec<String>>,
    pub undo_checkpoints: RefCell<Vec<(Lnum, Lnum)>>,
}

impl VecBuffer {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: RefCell::new(lines.iter().map(|s| s.to_string()).collect()),
            undo_checkpoints: RefCell::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl DiffBuffer for VecBuffer {
    fn line_count(&self) -> usize {
        self.lines.borrow().len()
    }

    fn line(&self, lnum: Lnum) -> Option<String> {
        let idx = lnum.checked_sub(1)? as usize;
        self.lines.borrow().get(idx).cloned()
    }

    fn delete_line(&mut self, lnum: Lnum) {
        let idx = (lnum - 1) as usize;
        self.lines.borrow_mut().remove(idx);
    }

    fn append_line_after(&mut self, after: Lnum, text: &str) {
        self.lines.borrow_mut().insert(after as usize, text.to_string());
    }

    fn write_to_file(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.lines.borrow().join("\n"))?;
        Ok(())
    }

    fn undo_checkpoint(&mut self, first: Lnum, last: Lnum) {
        self.undo_checkpoints.borrow_mut().push((first, last));
    }
}

/// A [`core_diff::Differ`] that shells out to the system `diff` binary,
/// for tests that want real differ output rather than a canned hook.
pub fn system_diff() -> core_diff::Differ {
    core_diff::Differ::external("diff")
}

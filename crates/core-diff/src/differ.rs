//! The external differ collaborator (spec §4.3 "input") and the grammar of
//! the textual diff format it emits (vim's `diff_read`).
//!
//! The engine never computes a diff itself; it shells out to (or is fed by)
//! something that already did. `Differ` is the seam between the two.

use std::io::Write as _;
use std::path::Path;
use std::process::Command;

use crate::comparator::CompareFlags;

/// A source of "normal" diff output between two files.
pub enum Differ {
    /// Runs an external `diff`-compatible executable and captures stdout.
    ExternalProcess { program: String },
    /// A host-supplied callback, for embedding test doubles or an in-process
    /// differ without forking a process (spec §6 "Hook expression"; takes no
    /// flags of its own since the hook is expected to already honor whatever
    /// comparison semantics the host configured).
    Hook(Box<dyn Fn(&Path, &Path) -> anyhow::Result<String> + Send + Sync>),
}

impl Differ {
    pub fn external(program: impl Into<String>) -> Self {
        Differ::ExternalProcess { program: program.into() }
    }

    pub fn hook<F>(f: F) -> Self
    where
        F: Fn(&Path, &Path) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Differ::Hook(Box::new(f))
    }

    /// Run the differ over `old` vs `new`, both already-written temp files.
    /// Returns the raw textual output regardless of exit status: a real
    /// `diff` exits 1 when files differ, which is not a failure here.
    ///
    /// `flags` controls the external process's `-b`/`-i` switches per spec
    /// §6: `-b` iff [`CompareFlags::IWHITE`], `-i` iff [`CompareFlags::ICASE`].
    pub fn run(&self, old: &Path, new: &Path, flags: CompareFlags) -> anyhow::Result<String> {
        match self {
            Differ::ExternalProcess { program } => {
                let mut cmd = Command::new(program);
                if flags.contains(CompareFlags::IWHITE) {
                    cmd.arg("-b");
                }
                if flags.contains(CompareFlags::ICASE) {
                    cmd.arg("-i");
                }
                let output = cmd.arg(old).arg(new).output()?;
                // Exit code 2+ means the tool itself failed (bad args, missing
                // file); 0/1 both carry meaningful stdout.
                if output.status.code().map(|c| c >= 2).unwrap_or(true) && output.stdout.is_empty() {
                    anyhow::bail!(
                        "differ {program} exited abnormally: {}",
                        String::from_utf8_lossy(&output.stderr)
                    );
                }
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Differ::Hook(f) => f(old, new),
        }
    }
}

/// One parsed directive line from normal diff output: `F1[,L1]{a,c,d}F2[,L2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDirective {
    pub kind: DirectiveKind,
    /// First-file range, inclusive (`(first, last)`).
    pub from: (u32, u32),
    /// Second-file range, inclusive (`(first, last)`).
    pub to: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Add,
    Change,
    Delete,
}

/// Parse one directive line such as `3,5c4,4` / `2a3,4` / `6,7d5`. Returns
/// `None` for lines that don't match any of the three grammars (content
/// lines the differ interleaves with `<`/`>`/`---`, which callers skip).
pub fn parse_directive(line: &str) -> Option<ParsedDirective> {
    let line = line.trim_end();
    let kind_pos = line.find(|c| c == 'a' || c == 'c' || c == 'd')?;
    let (lhs, rest) = line.split_at(kind_pos);
    let kind = match rest.as_bytes()[0] {
        b'a' => DirectiveKind::Add,
        b'c' => DirectiveKind::Change,
        b'd' => DirectiveKind::Delete,
        _ => return None,
    };
    let rhs = &rest[1..];

    let from = parse_range(lhs)?;
    let to = parse_range(rhs)?;
    Some(ParsedDirective { kind, from, to })
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    if s.is_empty() {
        return None;
    }
    match s.split_once(',') {
        Some((first, last)) => Some((first.parse().ok()?, last.parse().ok()?)),
        None => {
            let n: u32 = s.parse().ok()?;
            Some((n, n))
        }
    }
}

/// Write `lines` to a fresh temp file under `dir` and return its path.
pub fn write_temp_file(dir: &Path, lines: &[String]) -> anyhow::Result<std::path::PathBuf> {
    let mut file = tempfile::Builder::new().tempfile_in(dir)?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    let (_, path) = file.keep()?;
    Ok(path)
}

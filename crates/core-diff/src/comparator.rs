//! Line Comparator (spec §4.1): pure, total comparison of two lines subject
//! to case- and whitespace-insensitivity flags.

use bitflags::bitflags;

bitflags! {
    /// Flags derived from `diffopt` (spec §4.8) that affect line comparison
    /// and visualization. Mirrors vim's `DIFF_FILLER`/`DIFF_ICASE`/`DIFF_IWHITE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompareFlags: u8 {
        /// Render filler lines where one buffer has fewer lines than a block's max.
        const FILLER = 0b001;
        /// Case-insensitive comparison.
        const ICASE  = 0b010;
        /// Whitespace-run-insensitive comparison.
        const IWHITE = 0b100;
    }
}

impl Default for CompareFlags {
    /// vim's historical default: filler lines on, case/whitespace sensitive.
    fn default() -> Self {
        CompareFlags::FILLER
    }
}

/// Compare two lines under `flags`. Returns `true` when they are considered
/// equal for diff purposes.
pub fn lines_equal(a: &str, b: &str, flags: CompareFlags) -> bool {
    if !flags.intersects(CompareFlags::ICASE | CompareFlags::IWHITE) {
        return a == b;
    }
    if flags.contains(CompareFlags::ICASE) && !flags.contains(CompareFlags::IWHITE) {
        return a.eq_ignore_ascii_case(b) || case_fold_eq(a, b);
    }
    whitespace_fold_eq(a, b, flags.contains(CompareFlags::ICASE))
}

/// Full-Unicode case-insensitive comparison (ASCII `eq_ignore_ascii_case` is
/// a fast path above; this is the general fallback for non-ASCII letters).
fn case_fold_eq(a: &str, b: &str) -> bool {
    let mut ac = a.chars().flat_map(char::to_lowercase);
    let mut bc = b.chars().flat_map(char::to_lowercase);
    loop {
        match (ac.next(), bc.next()) {
            (Some(x), Some(y)) if x == y => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Whitespace-run-insensitive, optionally case-insensitive, comparison.
///
/// Walks both strings simultaneously. A whitespace run is only collapsed
/// and skipped when *both* cursors are simultaneously on a whitespace byte
/// (`diff.c:1154`'s `vim_iswhite(*p1) && vim_iswhite(*p2)`); otherwise one
/// code point is compared at a time, so whitespace on only one side is real
/// content. Trailing whitespace remaining on both ends once one side runs
/// out is ignored.
fn whitespace_fold_eq(a: &str, b: &str, icase: bool) -> bool {
    let mut ai = a.char_indices().peekable();
    let mut bi = b.char_indices().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (Some((_, ca)), Some((_, cb))) if ca.is_whitespace() && cb.is_whitespace() => {
                skip_whitespace_run(&mut ai);
                skip_whitespace_run(&mut bi);
            }
            (Some((_, ca)), Some((_, cb))) => {
                let eq = if icase {
                    ca.to_lowercase().eq(cb.to_lowercase())
                } else {
                    ca == cb
                };
                if !eq {
                    return false;
                }
                ai.next();
                bi.next();
            }
            _ => break,
        }
    }

    ai.all(|(_, c)| c.is_whitespace()) && bi.all(|(_, c)| c.is_whitespace())
}

fn skip_whitespace_run(iter: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
    while let Some(&(_, c)) = iter.peek() {
        if c.is_whitespace() {
            iter.next();
        } else {
            break;
        }
    }
}

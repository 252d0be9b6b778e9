//! Line numbers and the "open upper bound" sentinel used by edit notifications.

/// A 1-based line number. A value one past the last line means "append
/// position"; see [`MAX_LNUM`] for the separate "open upper bound" sentinel.
pub type Lnum = u32;

/// Sentinel meaning "end of buffer" / "open upper bound" in edit
/// notifications (mirrors vim's `MAXLNUM`). Chosen well below `u32::MAX` so
/// that `lnum + count` style arithmetic elsewhere never wraps before a
/// comparison against this sentinel would catch it.
pub const MAX_LNUM: Lnum = u32::MAX - 1;

/// Saturating `a + b` clamped at [`MAX_LNUM`], since several call sites add
/// an unbounded shift to a line number that may itself already be
/// [`MAX_LNUM`].
pub fn add_clamped(a: Lnum, b: Lnum) -> Lnum {
    a.saturating_add(b).min(MAX_LNUM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_clamped_saturates_at_sentinel() {
        assert_eq!(add_clamped(MAX_LNUM, 5), MAX_LNUM);
        assert_eq!(add_clamped(3, 4), 7);
    }
}

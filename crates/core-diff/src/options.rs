//! Option Parser (spec §4.8): turns a `diffopt`-style comma-separated
//! string into [`DiffOptions`], mirroring vim's `diffopt_changed`.

use crate::comparator::CompareFlags;
use crate::error::DiffError;

/// Context lines shown around a change when folding unchanged text (vim's
/// default `diff_context`).
pub const DEFAULT_CONTEXT: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    pub flags: CompareFlags,
    pub context: u32,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            flags: CompareFlags::default(),
            context: DEFAULT_CONTEXT,
        }
    }
}

impl DiffOptions {
    /// Parse a comma-separated option string such as
    /// `"filler,icase,iwhite,context:3"`. Unlike vim's own `diffopt`, which
    /// shares its option string with unrelated settings and so must stay
    /// tolerant of tokens it doesn't own, this parser's string is
    /// diff-engine-only: an unrecognized token is always a caller mistake.
    pub fn parse(s: &str) -> Result<Self, DiffError> {
        let mut flags = CompareFlags::empty();
        let mut context = DEFAULT_CONTEXT;

        for item in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match item {
                "filler" => flags |= CompareFlags::FILLER,
                "icase" => flags |= CompareFlags::ICASE,
                "iwhite" => flags |= CompareFlags::IWHITE,
                _ => match item.strip_prefix("context:").and_then(|digits| digits.parse().ok()) {
                    Some(n) => context = n,
                    None => return Err(DiffError::InvalidOption(item.to_string())),
                },
            }
        }

        Ok(Self { flags, context })
    }

    /// Whether changing from `self` to `new` requires rebuilding every diff
    /// list rather than just re-rendering with the existing blocks: a
    /// change to `icase`/`iwhite` alters which lines compare equal, so
    /// stale blocks could misclassify content (vim forces `diff_invalid`
    /// for the same two flags, but not for `filler` or `context`, which
    /// only affect presentation).
    pub fn requires_rebuild(&self, new: &DiffOptions) -> bool {
        let semantic = CompareFlags::ICASE | CompareFlags::IWHITE;
        (self.flags & semantic) != (new.flags & semantic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_flags_and_context() {
        let opts = DiffOptions::parse("filler,icase,iwhite,context:3").unwrap();
        assert_eq!(opts.flags, CompareFlags::FILLER | CompareFlags::ICASE | CompareFlags::IWHITE);
        assert_eq!(opts.context, 3);
    }

    #[test]
    fn rejects_unknown_tokens() {
        let err = DiffOptions::parse("filler,horizontal").unwrap_err();
        assert!(matches!(err, DiffError::InvalidOption(t) if t == "horizontal"));
    }

    #[test]
    fn rejects_malformed_context_value() {
        let err = DiffOptions::parse("context:abc").unwrap_err();
        assert!(matches!(err, DiffError::InvalidOption(t) if t == "context:abc"));
    }

    #[test]
    fn detects_rebuild_requiring_changes() {
        let a = DiffOptions::parse("filler").unwrap();
        let b = DiffOptions::parse("filler,icase").unwrap();
        assert!(a.requires_rebuild(&b));

        let c = DiffOptions::parse("filler,context:10").unwrap();
        assert!(!a.requires_rebuild(&c));
    }
}

//! Debug trace handling
//!
//! The backend reports raw log lines alongside each chat response; they are
//! normalized into short entries before being attached to a turn.

mod normalize;

pub use normalize::{ELLIPSIS, MAX_TRACE_LEN, normalize};

/// Normalize every raw line, preserving order
pub fn normalize_all<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines.into_iter().map(|line| normalize(line.as_ref())).collect()
}

/// Reversible escaping of the instance-info separator inside path segments
///
/// A literal `.` in a bookmarkable parameter would be read back as the start
/// of an instance-info suffix, so every `.` in a segment is replaced by an
/// escape marker: an underscore, a run of dashes, and another underscore
/// (`_-_`, `_--_`, ... up to [`MAX_ESCAPE`] dashes).
///
/// All functions are **pure**: same input, same output, no side effects.
use std::borrow::Cow;

use crate::error::RouteError;

/// The separator reserved by the instance-info grammar
pub const SEPARATOR: char = '.';

/// Longest dash run tried when building an escape marker
pub const MAX_ESCAPE: usize = 20;

/// Every marker starts with this prefix; segments without it never unescape
const MARKER_PREFIX: &str = "_-";

/// Builds the escape marker with `len` dashes
///
/// # Examples
///
/// ```
/// use hybrid_router::escape::escape_marker;
///
/// assert_eq!(escape_marker(1), "_-_");
/// assert_eq!(escape_marker(3), "_---_");
/// ```
pub fn escape_marker(len: usize) -> String {
    format!("_{}_", "-".repeat(len))
}

/// Escapes every separator in `segment`
///
/// Markers are tried from the longest down. The first one that does not
/// already occur in the segment, and whose result unescapes back to the
/// original text, wins. A segment without a separator is returned unchanged
/// (`Cow::Borrowed`).
///
/// # Errors
///
/// [`RouteError::EncodingOverflow`] when no marker up to [`MAX_ESCAPE`]
/// dashes is collision-free. Only this segment is affected.
///
/// # Examples
///
/// ```
/// use hybrid_router::escape::{escape_segment, unescape_segment};
/// use std::borrow::Cow;
///
/// let plain = escape_segment("report").unwrap();
/// assert!(matches!(plain, Cow::Borrowed("report")));
///
/// let escaped = escape_segment("v1.2").unwrap();
/// assert!(!escaped.contains('.'));
/// assert_eq!(unescape_segment(&escaped), "v1.2");
/// ```
pub fn escape_segment(segment: &str) -> Result<Cow<'_, str>, RouteError> {
    if !segment.contains(SEPARATOR) {
        return Ok(Cow::Borrowed(segment));
    }

    (1..=MAX_ESCAPE)
        .rev()
        .map(escape_marker)
        .filter(|marker| !segment.contains(marker.as_str()))
        .map(|marker| segment.replace(SEPARATOR, &marker))
        // A marker glued to neighbouring dashes/underscores can form a longer
        // marker; only accept candidates that read back exactly.
        .find(|candidate| unescape_segment(candidate) == segment)
        .map(Cow::Owned)
        .ok_or_else(|| RouteError::EncodingOverflow {
            segment: segment.to_string(),
        })
}

/// Reverses [`escape_segment`]
///
/// Scans markers from the longest down and replaces every occurrence of the
/// first one found with the separator. Segments without a marker are
/// returned borrowed.
///
/// # Examples
///
/// ```
/// use hybrid_router::escape::unescape_segment;
///
/// assert_eq!(unescape_segment("a_--_b_--_c"), "a.b.c");
/// assert_eq!(unescape_segment("plain"), "plain");
/// ```
pub fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(MARKER_PREFIX) {
        return Cow::Borrowed(segment);
    }

    (1..=MAX_ESCAPE)
        .rev()
        .map(escape_marker)
        .find(|marker| segment.contains(marker.as_str()))
        .map(|marker| Cow::Owned(segment.replace(&marker, ".")))
        .unwrap_or(Cow::Borrowed(segment))
}

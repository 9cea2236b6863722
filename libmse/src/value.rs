//! Scalar value types and the pure parse helpers behind typed reads.
//!
//! The conversion policy itself (what warns, what is fatal, which fallback
//! applies) lives in one place, the reader's `handle` dispatch; the helpers
//! here only answer "does this text parse".

use std::fmt;

use chrono::NaiveDateTime;

/// Three-valued boolean, for fields that may be explicitly unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriBool {
    True,
    False,
    #[default]
    Indeterminate,
}

impl TriBool {
    /// The definite value, or `None` when indeterminate.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            TriBool::True => Some(true),
            TriBool::False => Some(false),
            TriBool::Indeterminate => None,
        }
    }
}

impl From<bool> for TriBool {
    fn from(b: bool) -> Self {
        if b {
            TriBool::True
        } else {
            TriBool::False
        }
    }
}

/// A 2D point, written `(x,y)` in documents.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse the literal `(x,y)` form with floating-point components.
    pub(crate) fn from_read_string(s: &str) -> Option<Self> {
        let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
        let (x, y) = inner.split_once(',')?;
        Some(Self {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Reference to a file stored alongside the document, e.g. a card image.
///
/// Resolution against the containing package happens outside the reader;
/// the reference is kept in the form it will be looked up by.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileRef(String);

impl FileRef {
    /// Decode a reference from its stored form.
    pub fn from_read_string(s: &str) -> Self {
        FileRef(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application or document format version.
///
/// Dotted components pack with base-100 positional weights, so `0.3.8`
/// reads as 308 and `2.0.0` as 20000; a bare integer stands for itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u32);

impl Version {
    pub const fn new(n: u32) -> Self {
        Version(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) fn from_read_string(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if !s.contains('.') {
            return s.parse().ok().map(Version);
        }
        let mut total: u32 = 0;
        for part in s.split('.') {
            let n: u32 = part.parse().ok()?;
            total = total.checked_mul(100)?.checked_add(n)?;
        }
        Some(Version(total))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.0 / 10000,
            self.0 / 100 % 100,
            self.0 % 100
        )
    }
}

/// Tokens accepted for boolean fields. Case sensitive.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Base-10 signed integer; both int and uint fields read through this.
pub(crate) fn parse_long(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

pub(crate) fn parse_double(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

/// Formats accepted for date-time fields; the writer emits the first.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a date and time. The whole input must match; trailing characters
/// make the parse fail.
pub(crate) fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_version_dotted() {
        assert_eq!(Version::from_read_string("0.3.8"), Some(Version::new(308)));
        assert_eq!(Version::from_read_string("2.0.0"), Some(Version::new(20000)));
        assert_eq!(Version::new(308).to_string(), "0.3.8");
    }

    #[test]
    fn test_version_bare_integer() {
        assert_eq!(
            Version::from_read_string("2000000"),
            Some(Version::new(2000000))
        );
    }

    #[test]
    fn test_version_malformed() {
        assert_eq!(Version::from_read_string(""), None);
        assert_eq!(Version::from_read_string("a.b"), None);
        assert_eq!(Version::from_read_string("1.x"), None);
    }

    #[test]
    fn test_version_ordering() {
        assert!(Version::new(308) < Version::new(20000));
    }

    #[test]
    fn test_bool_tokens() {
        for token in ["true", "1", "yes"] {
            assert_eq!(parse_bool(token), Some(true));
        }
        for token in ["false", "0", "no"] {
            assert_eq!(parse_bool(token), Some(false));
        }
        for token in ["True", "YES", "on", "2", ""] {
            assert_eq!(parse_bool(token), None);
        }
    }

    #[test]
    fn test_vec2() {
        assert_eq!(Vec2::from_read_string("(1.5,2)"), Some(Vec2::new(1.5, 2.0)));
        assert_eq!(
            Vec2::from_read_string(" ( -1 , 0.25 ) "),
            Some(Vec2::new(-1.0, 0.25))
        );
        assert_eq!(Vec2::from_read_string("1,2"), None);
        assert_eq!(Vec2::from_read_string("(1)"), None);
        assert_eq!(Vec2::from_read_string("(1,two)"), None);
    }

    #[test]
    fn test_date_time() {
        let expected = NaiveDate::from_ymd_opt(2008, 11, 24)
            .unwrap()
            .and_hms_opt(21, 58, 54)
            .unwrap();
        assert_eq!(parse_date_time("2008-11-24 21:58:54"), Some(expected));
        assert_eq!(parse_date_time("someday"), None);
        // trailing characters are not tolerated
        assert_eq!(parse_date_time("2008-11-24 21:58:54 extra"), None);
    }

    #[test]
    fn test_tribool_widening() {
        assert_eq!(TriBool::from(true), TriBool::True);
        assert_eq!(TriBool::Indeterminate.as_bool(), None);
    }
}

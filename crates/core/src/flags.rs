//! Startup flags decoded from the page's query string.
//!
//! Parsing is total: malformed or missing parameters collapse to `None` and
//! nothing here ever returns an error.

use serde::{Deserialize, Serialize};
use url::Url;

/// Query keys the application understands.
pub const FLAG_KEYS: [&str; 6] = ["fg", "bg", "ff", "init", "h", "p"];

/// Initialization data handed to the application once, at mount time.
///
/// Absent fields serialize as `null`; the application's decoders expect every
/// key to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitFlags {
    /// Foreground colour, `#` followed by six lowercase hex digits.
    pub fg: Option<String>,
    pub bg: Option<String>,
    /// Font family identifier.
    pub ff: Option<String>,
    /// Initial offset for the timer.
    pub init: Option<i32>,
    /// Show hours.
    pub h: Option<String>,
    /// Show progress.
    pub p: Option<String>,
}

impl InitFlags {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Inclusive bounds for `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRange {
    pub min: i32,
    pub max: i32,
}

impl InitRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(self, n: i32) -> bool {
        self.min <= n && n <= self.max
    }
}

impl Default for InitRange {
    fn default() -> Self {
        Self::new(-30, 30)
    }
}

/// Parse flags from an absolute page URL. Anything that is not a URL yields
/// all-absent flags.
pub fn parse_init_flags(current_url: &str, range: Option<InitRange>) -> InitFlags {
    match Url::parse(current_url) {
        Ok(url) => parse_query(url.query().unwrap_or(""), range),
        Err(_) => InitFlags::default(),
    }
}

/// Parse flags from a bare query string (a leading `?` is allowed).
///
/// Decoding matches `URLSearchParams`: `+` is a space, percent escapes are
/// decoded, and the first occurrence of a key wins.
pub fn parse_query(query: &str, range: Option<InitRange>) -> InitFlags {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut raw: [Option<String>; 6] = Default::default();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if let Some(slot) = FLAG_KEYS.iter().position(|k| *k == key) {
            if raw[slot].is_none() {
                raw[slot] = Some(value.into_owned());
            }
        }
    }

    let [fg, bg, ff, init, h, p] = raw;
    InitFlags {
        fg: fg.as_deref().and_then(parse_fg),
        bg,
        ff,
        init: init.as_deref().and_then(|s| parse_init(s, range)),
        h,
        p,
    }
}

/// Accept exactly `#rrggbb` in lowercase hex.
pub fn parse_fg(s: &str) -> Option<String> {
    let digits = s.strip_prefix('#')?;
    let ok = digits.len() == 6
        && digits
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    ok.then(|| s.to_string())
}

/// Integer prefix decoding in the manner of `parseInt(s, 10)`, then the
/// optional range check.
pub fn parse_init(s: &str, range: Option<InitRange>) -> Option<i32> {
    let n = parse_int_prefix(s)?;
    match range {
        Some(r) if !r.contains(n) => None,
        _ => Some(n),
    }
}

fn parse_int_prefix(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut n: i64 = 0;
    let mut seen = false;
    for d in digits {
        seen = true;
        n = n.checked_mul(10)?.checked_add(i64::from(d - b'0'))?;
        if n > i64::from(i32::MAX) + 1 {
            return None;
        }
    }
    if !seen {
        return None;
    }

    let n = if negative { -n } else { n };
    i32::try_from(n).ok()
}

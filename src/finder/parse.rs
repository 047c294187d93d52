//! Duration and size parsing
//!
//! Grammars used by the `mtime` and `size` criteria.

use crate::errors::{FindError, FindResult};

/// Upper bound used for `+N` size ranges.
///
/// Kept at the historical 32-bit ceiling so `+1G` and friends behave the
/// same way as the tools these option mappings come from.
pub const SIZE_CEILING: u64 = (1 << 31) - 1;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// A parsed interval such as `1w3d6h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Total length in seconds
    pub seconds: f64,
    /// Seconds covered by the smallest unit present, `None` for the empty interval
    pub resolution: Option<u64>,
}

impl Interval {
    /// The empty interval: no constraint at all.
    pub const UNBOUNDED: Interval = Interval {
        seconds: 0.0,
        resolution: None,
    };

    pub fn is_unbounded(&self) -> bool {
        self.resolution.is_none()
    }
}

/// Inclusive byte range produced by [`parse_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub min: u64,
    pub max: u64,
}

impl SizeRange {
    pub fn contains(&self, size: u64) -> bool {
        self.min <= size && size <= self.max
    }
}

/// Seconds per unit letter, ordered from most to least significant.
fn interval_unit(letter: char) -> Option<(usize, u64)> {
    match letter {
        'w' => Some((0, WEEK)),
        'd' => Some((1, DAY)),
        'h' => Some((2, HOUR)),
        'm' => Some((3, MINUTE)),
        's' => Some((4, 1)),
        _ => None,
    }
}

/// Parse a compound interval like `1w3d6h` or `90s`.
///
/// Units must appear at most once and in decreasing significance
/// (`w`, `d`, `h`, `m`, `s`). A trailing number without a unit counts as
/// days, so `"2"` is two days. The empty string is the unbounded interval.
pub fn parse_interval(value: &str) -> FindResult<Interval> {
    if value.is_empty() {
        return Ok(Interval::UNBOUNDED);
    }

    let invalid = || FindError::InvalidInterval(value.to_string());
    let mut seconds = 0.0;
    let mut resolution = None;
    // rank of the last unit consumed; the next one must rank strictly lower
    let mut last_rank: Option<usize> = None;
    let mut chars = value.chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(c);
            chars.next();
        }
        if digits.is_empty() {
            return Err(invalid());
        }

        let (rank, unit) = match chars.next() {
            Some(letter) => interval_unit(letter).ok_or_else(invalid)?,
            None => (1, DAY),
        };
        if last_rank.is_some_and(|last| rank <= last) {
            return Err(invalid());
        }
        last_rank = Some(rank);

        let count: u64 = digits.parse().map_err(|_| invalid())?;
        seconds += count as f64 * unit as f64;
        resolution = Some(unit);
    }

    Ok(Interval {
        seconds,
        resolution,
    })
}

/// Parse a size expression such as `10k`, `-1m` or `+2G`.
///
/// * no sign: bytes are exact, larger units match the whole bucket
///   `[n * unit, (n + 1) * unit - 1]`
/// * `-`: anything up to and including `n * unit`
/// * `+`: at least `n * unit`, capped at [`SIZE_CEILING`]
pub fn parse_size(value: &str) -> FindResult<SizeRange> {
    let invalid = || FindError::InvalidSize(value.to_string());

    let (sign, rest) = match value.chars().next() {
        Some(sign @ ('+' | '-')) => (Some(sign), &value[1..]),
        _ => (None, value),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, suffix) = rest.split_at(digits_end);
    if digits.is_empty() {
        return Err(invalid());
    }

    let multiplier: u64 = match suffix.to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" => 1 << 10,
        "m" => 1 << 20,
        "g" => 1 << 30,
        "t" => 1 << 40,
        _ => return Err(invalid()),
    };

    let count: u64 = digits.parse().map_err(|_| invalid())?;
    let base = count.checked_mul(multiplier).ok_or_else(invalid)?;

    let range = match sign {
        Some('-') => SizeRange { min: 0, max: base },
        Some(_) => SizeRange {
            min: base,
            max: SIZE_CEILING,
        },
        None if multiplier == 1 => SizeRange {
            min: base,
            max: base,
        },
        None => SizeRange {
            min: base,
            max: base.checked_add(multiplier - 1).ok_or_else(invalid)?,
        },
    };
    Ok(range)
}

//! Sequential document numbers, partitioned by kind prefix.
//!
//! Numbers look like `I0001` / `P0042` / `DL0317`: an alphabetic prefix
//! followed by a zero-padded counter. The next number is derived from the
//! highest existing number for the prefix; the counter wraps back to 1 past
//! the width maximum, so the store's uniqueness check (plus bounded retry in
//! the service) is what stands between a wrapped counter and a still-live
//! number.

/// Digits in the numeric part of a document number.
pub const NUMBER_WIDTH: u32 = 4;

/// Highest counter value representable at `width` digits.
fn max_for_width(width: u32) -> u64 {
    10u64.pow(width) - 1
}

/// Format a counter value as a full document number.
pub fn format_number(prefix: &str, width: u32, value: u64) -> String {
    format!("{prefix}{value:0width$}", width = width as usize)
}

/// Derive the next number in a prefix partition.
///
/// `last` is the highest existing number for the prefix (or `None` when the
/// partition is empty). A suffix that does not parse as an integer falls back
/// to the start of the sequence rather than failing.
pub fn next_number(prefix: &str, width: u32, last: Option<&str>) -> String {
    let next = match last
        .and_then(|number| number.strip_prefix(prefix))
        .and_then(|suffix| suffix.parse::<u64>().ok())
    {
        Some(current) if current >= max_for_width(width) => 1,
        Some(current) => current + 1,
        None => 1,
    };
    format_number(prefix, width, next)
}

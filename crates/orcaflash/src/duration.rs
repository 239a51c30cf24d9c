//! Print duration text in the slicer's `1d 2h 3m 4s` form.

use thiserror::Error;

/// Why a duration string could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// Nothing but whitespace.
    #[error("duration is empty")]
    Empty,
    /// Raw seconds that are negative or not finite.
    #[error("seconds must be a finite, non-negative number")]
    InvalidSeconds,
    /// A unit letter with no number in front of it, or stray text.
    #[error("expected a number at {0:?}")]
    ExpectedNumber(String),
    /// A number with no unit after it.
    #[error("missing unit after {0}")]
    MissingUnit(u64),
    /// A unit other than d, h, m, s.
    #[error("unknown unit {0:?}")]
    UnknownUnit(char),
    /// The same unit appears twice.
    #[error("unit {0:?} given more than once")]
    RepeatedUnit(char),
    /// Too large to represent.
    #[error("duration overflows")]
    Overflow,
}

/// Parse a duration into whole seconds.
///
/// Accepts the compound form (`1h 2m 3s`, `2m`, `1d 0h 5m 0s`, spaces
/// optional, each unit at most once) and plain seconds (`3723`, `3723.4`).
/// Plain seconds are rounded to the nearest whole second.
pub fn parse_duration(text: &str) -> Result<u64, DurationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }

    if let Ok(secs) = text.parse::<f64>() {
        if !secs.is_finite() || secs < 0.0 {
            return Err(DurationError::InvalidSeconds);
        }
        return Ok(secs.round() as u64);
    }

    let mut total: u64 = 0;
    let mut seen = Vec::with_capacity(4);
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let mut amount: Option<u64> = None;
        while let Some(&(_, c)) = chars.peek() {
            let Some(digit) = c.to_digit(10) else { break };
            let next = amount
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(digit)))
                .ok_or(DurationError::Overflow)?;
            amount = Some(next);
            chars.next();
        }
        let amount = amount.ok_or_else(|| DurationError::ExpectedNumber(text[start..].to_string()))?;

        let unit = match chars.next() {
            Some((_, c)) if !c.is_whitespace() => c,
            _ => return Err(DurationError::MissingUnit(amount)),
        };
        let scale = match unit {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            other => return Err(DurationError::UnknownUnit(other)),
        };
        if seen.contains(&unit) {
            return Err(DurationError::RepeatedUnit(unit));
        }
        seen.push(unit);

        total = amount
            .checked_mul(scale)
            .and_then(|v| total.checked_add(v))
            .ok_or(DurationError::Overflow)?;
    }

    Ok(total)
}

/// Format seconds the way the slicer does: leading zero units are dropped,
/// inner ones are kept (`1h 0m 5s`).
pub fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = secs % 86_400 / 3_600;
    let minutes = secs % 3_600 / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

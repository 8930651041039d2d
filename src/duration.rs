// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Duration strings such as "300ms", "1.5h" or "2h45m".

use std::time::Duration;

use thiserror::Error;

const NANOSECOND: u128 = 1;
const MICROSECOND: u128 = 1000 * NANOSECOND;
const MILLISECOND: u128 = 1000 * MICROSECOND;
const SECOND: u128 = 1000 * MILLISECOND;
const MINUTE: u128 = 60 * SECOND;
const HOUR: u128 = 60 * MINUTE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDurationError {
    #[error("invalid duration {0:?}")]
    InvalidDuration(String),
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
    #[error("negative duration {0:?}")]
    Negative(String),
    #[error("duration {0:?} out of range")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(NANOSECOND),
        // "µs" is U+00B5, "μs" is U+03BC
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Parse a sequence of decimal numbers, each with an optional fraction and
/// a unit suffix. Valid units are "ns", "us" (or "µs"), "ms", "s", "m", "h".
/// A bare "0" is zero; negative durations are rejected.
pub fn parse_duration(text: &str) -> Result<Duration, ParseDurationError> {
    let invalid = || ParseDurationError::InvalidDuration(text.to_string());

    let mut s = text;
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    } else if let Some(rest) = s.strip_prefix('-') {
        if rest != "0" {
            return Err(ParseDurationError::Negative(text.to_string()));
        }
        s = rest;
    }

    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        // Consume [0-9]*
        let int_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (int_part, rest) = s.split_at(int_len);
        s = rest;

        // Consume (\.[0-9]*)?
        let mut frac_part = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            (frac_part, s) = rest.split_at(frac_len);
        }

        if int_part.is_empty() && frac_part.is_empty() {
            // no digits (e.g. ".s")
            return Err(invalid());
        }

        // Consume unit
        let unit_len = s
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(s.len());
        if unit_len == 0 {
            return Err(ParseDurationError::MissingUnit(text.to_string()));
        }
        let (unit, rest) = s.split_at(unit_len);
        s = rest;

        let scale = unit_nanos(unit).ok_or_else(|| ParseDurationError::UnknownUnit {
            unit: unit.to_string(),
            input: text.to_string(),
        })?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| ParseDurationError::Overflow(text.to_string()))?
        };

        // Fractions beyond nanosecond precision are truncated
        let mut frac_nanos: u128 = 0;
        let mut divisor: u128 = 1;
        for digit in frac_part.bytes().take(20) {
            frac_nanos = frac_nanos * 10 + u128::from(digit - b'0');
            divisor *= 10;
        }

        total = whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_nanos * scale / divisor))
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| ParseDurationError::Overflow(text.to_string()))?;
    }

    let secs = u64::try_from(total / SECOND)
        .map_err(|_| ParseDurationError::Overflow(text.to_string()))?;
    Ok(Duration::new(secs, (total % SECOND) as u32))
}

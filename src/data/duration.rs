use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
];

const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_DAY: u64 = 86_400 * MICROS_PER_SECOND;

/// Largest unit first. Months are 30 days and years 365.
const MICRO_UNITS: &[(&str, u64)] = &[
    ("year", 365 * MICROS_PER_DAY),
    ("month", 30 * MICROS_PER_DAY),
    ("day", MICROS_PER_DAY),
    ("hour", 3_600 * MICROS_PER_SECOND),
    ("minute", 60 * MICROS_PER_SECOND),
    ("second", MICROS_PER_SECOND),
    ("millisecond", 1_000),
    ("microsecond", 1),
];

/// Parse duration strings like "1s", "500ms", "1.5m"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val < 0.0 {
                bail!("Duration must be a non-negative number: {}", s);
            }
            return Ok(Duration::from_micros((val * multiplier * 1_000.0) as u64));
        }
    }

    bail!("Unknown duration format: {}", s)
}

/// Format an elapsed duration compactly, e.g. "850ms", "2.5s", "4m 10s"
pub fn format_elapsed(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Format a microsecond counter using the largest whole unit, e.g.
/// "3.5 hours", "1.0 day", "0.0 microseconds".
pub fn format_micros(us: u64) -> String {
    let (unit, divisor) = MICRO_UNITS
        .iter()
        .copied()
        .find(|&(_, divisor)| divisor <= us)
        .unwrap_or(("microsecond", 1));

    let value = us as f64 / divisor as f64;
    let rendered = format!("{:.1}", value);
    if rendered == "1.0" {
        format!("{} {}", rendered, unit)
    } else {
        format!("{} {}s", rendered, unit)
    }
}

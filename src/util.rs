// Utility helpers for parsing and basic statistics.
//
// Cell parsing, time-slot label parsing and the small descriptive-statistics
// kernels live here so the pipeline stages and queries can assume typed values.
use crate::error::PipelineError;
use num_format::{Locale, ToFormattedString};

/// Parse an occupancy cell.
///
/// - Trims surrounding whitespace.
/// - Returns `None` for empty cells, anything `f64::from_str` rejects
///   (including embedded spaces such as `"7 5"`), and non-finite values.
pub fn parse_f64_safe(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a raw spreadsheet header of the form `<hour>시<minute>분`.
///
/// Returns `None` for anything else, including the identifier headers.
pub fn parse_korean_time_header(header: &str) -> Option<(u32, u32)> {
    let h = header.trim();
    let (hour, rest) = h.split_once('시')?;
    let minute = rest.strip_suffix('분')?;
    let hour = hour.trim().parse::<u32>().ok()?;
    let minute = minute.trim().parse::<u32>().ok()?;
    Some((hour, minute))
}

/// Latest hour a time slot may carry. Midnight samples are remapped to 24 so
/// they sort after 23:xx.
pub const LAST_SERVICE_HOUR: u32 = 24;

/// Parse a canonical `H:MM` label into `(hour, minute)`. Hours past
/// [`LAST_SERVICE_HOUR`] and minutes past 59 are rejected.
pub fn parse_time_slot(label: &str) -> Result<(u32, u32), PipelineError> {
    let malformed = || PipelineError::MalformedTimeSlot {
        label: label.to_string(),
    };
    let (h, m) = label.split_once(':').ok_or_else(malformed)?;
    let hour = h.trim().parse::<u32>().map_err(|_| malformed())?;
    let minute = m.trim().parse::<u32>().map_err(|_| malformed())?;
    if hour > LAST_SERVICE_HOUR || minute >= 60 {
        return Err(malformed());
    }
    Ok((hour, minute))
}

/// Minutes-since-midnight key of a canonical label; `24:00` maps to 1440.
pub fn time_sort_key(label: &str) -> Result<u32, PipelineError> {
    let (hour, minute) = parse_time_slot(label)?;
    Ok(hour * 60 + minute)
}

/// First run of ASCII digits in a line name, e.g. `"2호선"` -> 2.
pub fn extract_line_number(line: &str) -> Option<u32> {
    let digits: String = line
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn max_value(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().copied().fold(f64::MIN, f64::max)
}

pub fn min_value(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().copied().fold(f64::MAX, f64::min)
}

/// Sample standard deviation (n - 1 denominator); 0 below two samples.
pub fn sample_std(v: &[f64]) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let mean = average(v);
    let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
    (ss / (v.len() - 1) as f64).sqrt()
}

/// Index of the first maximum; `None` for an empty slice.
pub fn argmax(v: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, x) in v.iter().enumerate() {
        match best {
            Some(b) if v[b] >= *x => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Index of the first minimum; `None` for an empty slice.
pub fn argmin(v: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, x) in v.iter().enumerate() {
        match best {
            Some(b) if v[b] <= *x => {}
            _ => best = Some(i),
        }
    }
    best
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_val: i64 = parts.next().unwrap_or("0").parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

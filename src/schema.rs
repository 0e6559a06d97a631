//! Column normalization for the raw wide table.
//!
//! The source file's identifier headers are unreliable, so the first five
//! columns are renamed purely by position:
//!
//! | position | column |
//! |---|---|
//! | 0 | `요일구분` (day type) |
//! | 1 | `호선` (line) |
//! | 2 | `역번호` (station number) |
//! | 3 | `역명` (station name) |
//! | 4 | `방향` (direction) |
//!
//! Remaining headers of the form `<hour>시<minute>분` become `HH:MM`.
use crate::error::PipelineError;
use crate::types::RawTable;
use crate::util::{parse_korean_time_header, LAST_SERVICE_HOUR};
use std::collections::HashMap;
use tracing::debug;

pub const DAY_TYPE: &str = "요일구분";
pub const LINE: &str = "호선";
pub const STATION_NUMBER: &str = "역번호";
pub const STATION_NAME: &str = "역명";
pub const DIRECTION: &str = "방향";
pub const TIME_SLOT: &str = "시간대";
pub const CONGESTION: &str = "혼잡도";

pub const IDENTIFIER_COLUMNS: [&str; 5] = [DAY_TYPE, LINE, STATION_NUMBER, STATION_NAME, DIRECTION];

/// Rename the first five columns to the fixed identifier names.
pub fn normalize_columns(raw: &RawTable) -> Result<RawTable, PipelineError> {
    let found = raw.headers.len();
    if found < IDENTIFIER_COLUMNS.len() {
        return Err(PipelineError::TooFewColumns {
            expected: IDENTIFIER_COLUMNS.len(),
            found,
        });
    }
    let headers = IDENTIFIER_COLUMNS
        .iter()
        .map(|s| s.to_string())
        .chain(raw.headers[IDENTIFIER_COLUMNS.len()..].iter().cloned())
        .collect();
    Ok(RawTable::new(headers, raw.rows.clone()))
}

/// Format an hour/minute pair as a canonical label, remapping hour 0 to 24
/// so midnight sorts after 23:xx within the same service day.
pub fn canonical_time_label(hour: u32, minute: u32) -> String {
    let hour = if hour == 0 { 24 } else { hour };
    format!("{:02}:{:02}", hour, minute)
}

/// Rename every `<hour>시<minute>분` header to its canonical `HH:MM` label.
///
/// Two raw headers that collapse onto the same label are rejected with
/// [`PipelineError::DuplicateTimeColumn`]; an hour past
/// [`LAST_SERVICE_HOUR`] or a minute past 59 is a
/// [`PipelineError::MalformedTimeSlot`].
pub fn canonicalize_time_columns(table: &RawTable) -> Result<RawTable, PipelineError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut headers = Vec::with_capacity(table.headers.len());
    let mut renamed = 0usize;
    for header in &table.headers {
        match parse_korean_time_header(header) {
            Some((hour, minute)) => {
                if hour > LAST_SERVICE_HOUR || minute >= 60 {
                    return Err(PipelineError::MalformedTimeSlot {
                        label: header.clone(),
                    });
                }
                let canonical = canonical_time_label(hour, minute);
                if let Some(first) = seen.insert(canonical.clone(), header) {
                    return Err(PipelineError::DuplicateTimeColumn {
                        first: first.to_string(),
                        second: header.clone(),
                        canonical,
                    });
                }
                headers.push(canonical);
                renamed += 1;
            }
            None => headers.push(header.clone()),
        }
    }
    debug!(renamed, "canonicalized time columns");
    Ok(RawTable::new(headers, table.rows.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str]) -> RawTable {
        RawTable::new(headers.iter().map(|h| h.to_string()).collect(), vec![])
    }

    #[test]
    fn renames_identifier_columns_by_position() {
        let t = raw(&["구분", "호선명", "역번호", "출발역", "상하구분", "5시30분"]);
        let out = normalize_columns(&t).unwrap();
        assert_eq!(
            out.headers,
            vec!["요일구분", "호선", "역번호", "역명", "방향", "5시30분"]
        );
        // input untouched
        assert_eq!(t.headers[0], "구분");
    }

    #[test]
    fn too_few_columns_is_a_schema_error() {
        let err = normalize_columns(&raw(&["a", "b", "c", "d"])).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn canonicalizes_time_headers_and_remaps_midnight() {
        let t = raw(&["요일구분", "호선", "역번호", "역명", "방향", "5시30분", "23시30분", "0시00분"]);
        let out = canonicalize_time_columns(&t).unwrap();
        assert_eq!(&out.headers[5..], &["05:30", "23:30", "24:00"]);
        assert_eq!(&out.headers[..5], &t.headers[..5]);
    }

    #[test]
    fn colliding_time_headers_are_rejected() {
        let t = raw(&["요일구분", "호선", "역번호", "역명", "방향", "8시00분", "8시0분"]);
        let err = canonicalize_time_columns(&t).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DuplicateTimeColumn { ref canonical, .. } if canonical == "08:00"
        ));
    }

    #[test]
    fn out_of_range_time_headers_are_rejected() {
        for bad in ["25시00분", "99999999시00분", "8시75분"] {
            let t = raw(&["요일구분", "호선", "역번호", "역명", "방향", bad]);
            assert!(
                matches!(
                    canonicalize_time_columns(&t),
                    Err(PipelineError::MalformedTimeSlot { ref label }) if label == bad
                ),
                "{}",
                bad
            );
        }
    }
}

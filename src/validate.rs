//! Post-pipeline checks on the enriched table.
//!
//! Missing columns and non-numeric occupancy fail the check. Out-of-range
//! occupancy and empty required fields are only reported.
use crate::error::PipelineError;
use crate::schema::{CONGESTION, DAY_TYPE, DIRECTION, LINE, STATION_NAME, TIME_SLOT};
use crate::types::CongestionRecord;
use crate::util::{max_value, min_value};
use tracing::{info, warn};

pub const REQUIRED_COLUMNS: [&str; 6] = [LINE, STATION_NAME, DIRECTION, DAY_TYPE, TIME_SLOT, CONGESTION];

pub const MAX_PLAUSIBLE_CONGESTION: f64 = 200.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    NegativeCongestion { min: f64 },
    ImplausibleCongestion { max: f64 },
    MissingValues { column: &'static str, count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub passed: bool,
    pub error: Option<String>,
    pub warnings: Vec<ValidationWarning>,
}

/// Fail with a schema error unless every required column is in `headers`.
pub fn check_required_columns<S: AsRef<str>>(headers: &[S]) -> Result<(), PipelineError> {
    check_columns(headers, &REQUIRED_COLUMNS)
}

/// Fail with a schema error listing every entry of `required` absent from
/// `headers`.
pub fn check_columns<S: AsRef<str>>(headers: &[S], required: &[&str]) -> Result<(), PipelineError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !headers.iter().any(|h| h.as_ref() == **c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns { missing })
    }
}

fn check_numeric(records: &[CongestionRecord]) -> Result<(), PipelineError> {
    match records.iter().find(|r| !r.congestion.is_finite()) {
        Some(r) => Err(PipelineError::NonNumericCongestion {
            detail: format!(
                "{} {} {} {} = {}",
                r.line, r.station_name, r.day_type, r.time_slot, r.congestion
            ),
        }),
        None => Ok(()),
    }
}

fn range_warnings(records: &[CongestionRecord]) -> Vec<ValidationWarning> {
    let values: Vec<f64> = records.iter().map(|r| r.congestion).collect();
    let mut out = Vec::new();
    if values.is_empty() {
        return out;
    }
    let (min, max) = (min_value(&values), max_value(&values));
    if min < 0.0 {
        out.push(ValidationWarning::NegativeCongestion { min });
    }
    if max > MAX_PLAUSIBLE_CONGESTION {
        out.push(ValidationWarning::ImplausibleCongestion { max });
    }
    out
}

fn missing_value_warnings(records: &[CongestionRecord]) -> Vec<ValidationWarning> {
    let fields: [(&'static str, fn(&CongestionRecord) -> bool); 6] = [
        (LINE, |r| r.line.trim().is_empty()),
        (STATION_NAME, |r| r.station_name.trim().is_empty()),
        (DIRECTION, |r| r.direction.trim().is_empty()),
        (DAY_TYPE, |r| r.day_type.trim().is_empty()),
        (TIME_SLOT, |r| r.time_slot.trim().is_empty()),
        (CONGESTION, |r| r.congestion.is_nan()),
    ];
    fields
        .iter()
        .filter_map(|(column, is_missing)| {
            let count = records.iter().filter(|r| is_missing(*r)).count();
            (count > 0).then_some(ValidationWarning::MissingValues {
                column: *column,
                count,
            })
        })
        .collect()
}

/// Run every check over `records` with the given column headers.
///
/// `passed` reflects only the schema and type checks; warnings never flip it.
pub fn validate_with_columns<S: AsRef<str>>(headers: &[S], records: &[CongestionRecord]) -> ValidationReport {
    let fatal = check_required_columns(headers).and_then(|_| check_numeric(records));
    if let Err(e) = fatal {
        warn!(error = %e, "validation failed");
        return ValidationReport {
            passed: false,
            error: Some(e.to_string()),
            warnings: Vec::new(),
        };
    }

    let mut warnings = range_warnings(records);
    warnings.extend(missing_value_warnings(records));
    for w in &warnings {
        warn!(warning = ?w, "validation warning");
    }
    info!(rows = records.len(), warnings = warnings.len(), "validation passed");
    ValidationReport {
        passed: true,
        error: None,
        warnings,
    }
}

/// Validate an in-memory enriched table, whose columns are fixed by its type.
pub fn validate(records: &[CongestionRecord]) -> ValidationReport {
    validate_with_columns(&REQUIRED_COLUMNS, records)
}

/// Like [`validate`], but a failed check comes back as the fatal error.
pub fn ensure_valid(records: &[CongestionRecord]) -> Result<ValidationReport, PipelineError> {
    check_numeric(records)?;
    Ok(validate(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CongestionLevel, TimePeriod};

    fn record(station: &str, congestion: f64) -> CongestionRecord {
        CongestionRecord {
            day_type: "평일".into(),
            line: "2호선".into(),
            station_number: "222".into(),
            station_name: station.into(),
            direction: "상선".into(),
            time_slot: "08:00".into(),
            sort_key: 480,
            congestion,
            level: CongestionLevel::from_congestion(congestion),
            period: TimePeriod::CommuteIn,
            line_number: Some(2),
        }
    }

    #[test]
    fn clean_table_passes_without_warnings() {
        let report = validate(&[record("강남", 80.0), record("역삼", 30.0)]);
        assert!(report.passed);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn high_values_warn_but_pass() {
        let report = validate(&[record("강남", 250.0)]);
        assert!(report.passed);
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::ImplausibleCongestion { max: 250.0 }]
        );
    }

    #[test]
    fn negative_values_and_blank_names_warn() {
        let report = validate(&[record("", -1.0)]);
        assert!(report.passed);
        assert!(report
            .warnings
            .contains(&ValidationWarning::NegativeCongestion { min: -1.0 }));
        assert!(report.warnings.contains(&ValidationWarning::MissingValues {
            column: STATION_NAME,
            count: 1
        }));
    }

    #[test]
    fn non_numeric_occupancy_fails() {
        let report = validate(&[record("강남", f64::NAN)]);
        assert!(!report.passed);
        assert!(report.error.unwrap().starts_with("type error"));
    }

    #[test]
    fn ensure_valid_returns_the_type_error() {
        let err = ensure_valid(&[record("강남", f64::INFINITY)]).unwrap_err();
        assert!(matches!(err, PipelineError::NonNumericCongestion { .. }));
        assert!(ensure_valid(&[record("강남", 10.0)]).unwrap().passed);
    }

    #[test]
    fn missing_columns_fail() {
        let report = validate_with_columns(&["호선", "역명"], &[]);
        assert!(!report.passed);
        assert!(check_required_columns(&["호선"]).unwrap_err().is_schema_error());
    }
}

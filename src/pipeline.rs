//! Raw wide table -> enriched long table.
use crate::clean::clean_values;
use crate::enrich::enrich;
use crate::error::PipelineError;
use crate::reshape::{melt, ColumnManifest};
use crate::schema::{canonicalize_time_columns, normalize_columns};
use crate::types::{CongestionRecord, RawTable};
use tracing::{debug, info, instrument};

/// Run normalization, cleaning, melting and enrichment in sequence.
///
/// Each stage consumes the full output of the previous one. Any error aborts
/// the run before a table is produced.
#[instrument(skip_all, fields(rows = raw.rows.len(), columns = raw.headers.len()))]
pub fn preprocess(raw: &RawTable) -> Result<Vec<CongestionRecord>, PipelineError> {
    info!("preprocessing started");

    let normalized = normalize_columns(raw)?;
    let canonical = canonicalize_time_columns(&normalized)?;
    let manifest = ColumnManifest::classify(&canonical)?;
    info!(time_columns = manifest.time_columns.len(), "time columns found");

    let (wide, report) = clean_values(&canonical, &manifest);
    debug!(?report, "values cleaned");

    let long = melt(&wide)?;
    info!(rows = long.len(), "melted to long format");

    let records = enrich(long)?;
    info!(rows = records.len(), "preprocessing finished");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CongestionLevel, TimePeriod};

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn wide_rows_become_long_enriched_rows() {
        let t = raw(
            &["구분", "호선", "역번호", "출발역", "상하구분", "5시30분", "0시00분"],
            &[
                &["평일", "2호선", "222", "강남", "상선", " 35.1 ", "12"],
                &["토요일", "2호선", "222", "강남", "상선", "20", ""],
            ],
        );
        let out = preprocess(&t).unwrap();
        assert_eq!(out.len(), 4);
        // day type order within a station/direction: "토요일" < "평일"
        assert_eq!(out[0].day_type, "토요일");
        assert_eq!(out[0].time_slot, "05:30");
        assert_eq!(out[1].time_slot, "24:00");
        assert_eq!(out[1].congestion, 0.0);
        assert_eq!(out[1].period, TimePeriod::LateNight);
        assert_eq!(out[2].congestion, 35.1);
        assert_eq!(out[2].level, CongestionLevel::Relaxed);
        assert_eq!(out[3].sort_key, 1440);
    }

    #[test]
    fn narrow_input_fails_before_any_output() {
        let t = raw(&["a", "b", "c"], &[&["1", "2", "3"]]);
        assert!(preprocess(&t).unwrap_err().is_schema_error());
    }

    #[test]
    fn absurd_hour_header_is_rejected_before_the_melt() {
        let t = raw(
            &["a", "b", "c", "d", "e", "99999999시00분"],
            &[&["평일", "2호선", "222", "강남", "상선", "10"]],
        );
        assert!(matches!(
            preprocess(&t),
            Err(PipelineError::MalformedTimeSlot { .. })
        ));
    }
}

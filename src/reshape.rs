//! Column classification and the wide-to-long melt.
use crate::error::PipelineError;
use crate::schema::IDENTIFIER_COLUMNS;
use crate::types::{LongRecord, RawTable, WideTable};
use crate::util::time_sort_key;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Typed manifest of a canonicalized wide table, computed once and passed
/// to the cleaner and the melt instead of re-deriving it per stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnManifest {
    /// Positions of day type, line, station number, station name, direction.
    pub identifier_columns: [usize; 5],
    /// `(position, canonical label)` of every time-slot column, in file order.
    pub time_columns: Vec<(usize, String)>,
    /// Headers that are neither identifiers nor time slots; dropped.
    pub unrecognized: Vec<String>,
}

impl ColumnManifest {
    /// Classify the headers of a normalized table. Time-slot columns are the
    /// ones whose canonical label contains a colon.
    pub fn classify(table: &RawTable) -> Result<Self, PipelineError> {
        let mut identifier_columns = [0usize; 5];
        let mut missing = Vec::new();
        for (slot, name) in IDENTIFIER_COLUMNS.iter().enumerate() {
            match table.column_index(name) {
                Some(i) => identifier_columns[slot] = i,
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns { missing });
        }

        let mut time_columns = Vec::new();
        let mut unrecognized = Vec::new();
        for (i, header) in table.headers.iter().enumerate() {
            if identifier_columns.contains(&i) {
                continue;
            }
            if header.contains(':') {
                time_columns.push((i, header.clone()));
            } else {
                unrecognized.push(header.clone());
            }
        }
        if !unrecognized.is_empty() {
            warn!(columns = ?unrecognized, "dropping unrecognized columns");
        }
        debug!(time_columns = time_columns.len(), "classified columns");
        Ok(Self {
            identifier_columns,
            time_columns,
            unrecognized,
        })
    }

    pub fn time_labels(&self) -> Vec<String> {
        self.time_columns.iter().map(|(_, l)| l.clone()).collect()
    }
}

/// Melt a cleaned wide table into one record per (row, time slot).
///
/// The result is stably sorted by line, station name, direction, day type and
/// sort key. Downstream first/last-in-group lookups rely on this order.
pub fn melt(wide: &WideTable) -> Result<Vec<LongRecord>, PipelineError> {
    let keys = wide
        .time_slots
        .iter()
        .map(|label| time_sort_key(label))
        .collect::<Result<Vec<u32>, _>>()?;

    let mut out = Vec::with_capacity(wide.rows.len() * keys.len());
    // column-major, one block per time slot
    for (j, (label, sort_key)) in wide.time_slots.iter().zip(&keys).enumerate() {
        for row in &wide.rows {
            out.push(LongRecord {
                key: row.key.clone(),
                time_slot: label.clone(),
                sort_key: *sort_key,
                congestion: row.values.get(j).copied().unwrap_or(0.0),
            });
        }
    }
    out.sort_by(canonical_order);
    Ok(out)
}

fn canonical_order(a: &LongRecord, b: &LongRecord) -> Ordering {
    a.key
        .line
        .cmp(&b.key.line)
        .then_with(|| a.key.station_name.cmp(&b.key.station_name))
        .then_with(|| a.key.direction.cmp(&b.key.direction))
        .then_with(|| a.key.day_type.cmp(&b.key.day_type))
        .then_with(|| a.sort_key.cmp(&b.sort_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StationKey, WideRow};

    fn key(line: &str, station: &str, day: &str) -> StationKey {
        StationKey {
            day_type: day.into(),
            line: line.into(),
            station_number: "0".into(),
            station_name: station.into(),
            direction: "상선".into(),
        }
    }

    #[test]
    fn classify_splits_identifier_time_and_other_columns() {
        let headers = ["요일구분", "호선", "역번호", "역명", "방향", "05:30", "비고", "24:00"];
        let t = RawTable::new(headers.iter().map(|s| s.to_string()).collect(), vec![]);
        let m = ColumnManifest::classify(&t).unwrap();
        assert_eq!(m.identifier_columns, [0, 1, 2, 3, 4]);
        assert_eq!(m.time_labels(), vec!["05:30", "24:00"]);
        assert_eq!(m.unrecognized, vec!["비고"]);
    }

    #[test]
    fn classify_requires_identifier_columns() {
        let t = RawTable::new(vec!["호선".into(), "05:30".into()], vec![]);
        assert!(ColumnManifest::classify(&t).unwrap_err().is_schema_error());
    }

    #[test]
    fn melt_produces_one_row_per_cell_in_canonical_order() {
        let wide = WideTable {
            time_slots: vec!["24:00".into(), "05:30".into()],
            rows: vec![
                WideRow { key: key("2호선", "역삼", "평일"), values: vec![1.0, 2.0] },
                WideRow { key: key("2호선", "강남", "평일"), values: vec![3.0, 4.0] },
            ],
        };
        let long = melt(&wide).unwrap();
        assert_eq!(long.len(), 4);
        let seq: Vec<(&str, &str, f64)> = long
            .iter()
            .map(|r| (r.key.station_name.as_str(), r.time_slot.as_str(), r.congestion))
            .collect();
        assert_eq!(
            seq,
            vec![
                ("강남", "05:30", 4.0),
                ("강남", "24:00", 3.0),
                ("역삼", "05:30", 2.0),
                ("역삼", "24:00", 1.0),
            ]
        );
        assert_eq!(long[1].sort_key, 1440);
    }

    #[test]
    fn melt_rejects_malformed_labels() {
        let wide = WideTable {
            time_slots: vec!["비고:".into()],
            rows: vec![],
        };
        assert!(matches!(
            melt(&wide),
            Err(PipelineError::MalformedTimeSlot { .. })
        ));
    }
}

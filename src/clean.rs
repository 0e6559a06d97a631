//! Occupancy value cleaning.
//!
//! Every time-slot cell is trimmed and parsed; unparseable or missing cells
//! become 0 and negatives are clipped to 0. This stage never fails, so the
//! time-slot grid is always complete downstream.
use crate::reshape::ColumnManifest;
use crate::types::{RawTable, StationKey, WideRow, WideTable};
use crate::util::parse_f64_safe;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub cells: usize,
    /// Empty or unparseable cells replaced with 0.
    pub coerced: usize,
    /// Negative values clipped to 0.
    pub clipped: usize,
}

fn cell(row: &[String], i: usize) -> String {
    row.get(i).cloned().unwrap_or_default()
}

pub fn clean_values(table: &RawTable, manifest: &ColumnManifest) -> (WideTable, CleanReport) {
    let mut report = CleanReport::default();
    let [day, line, number, name, direction] = manifest.identifier_columns;

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let key = StationKey {
                day_type: cell(row, day),
                line: cell(row, line),
                station_number: cell(row, number),
                station_name: cell(row, name),
                direction: cell(row, direction),
            };
            let values = manifest
                .time_columns
                .iter()
                .map(|(i, _)| {
                    let raw = row.get(*i).map(String::as_str).unwrap_or("");
                    report.cells += 1;
                    match parse_f64_safe(raw) {
                        None => {
                            report.coerced += 1;
                            0.0
                        }
                        Some(v) if v < 0.0 => {
                            report.clipped += 1;
                            0.0
                        }
                        Some(v) => v,
                    }
                })
                .collect();
            WideRow { key, values }
        })
        .collect();

    if report.coerced > 0 {
        info!(coerced = report.coerced, "unparseable occupancy cells set to 0");
    }
    debug!(cells = report.cells, clipped = report.clipped, "cleaned occupancy values");
    (
        WideTable {
            time_slots: manifest.time_labels(),
            rows,
        },
        report,
    )
}

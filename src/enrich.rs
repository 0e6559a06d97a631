use crate::error::PipelineError;
use crate::types::{CongestionLevel, CongestionRecord, LongRecord, TimePeriod};
use crate::util::{extract_line_number, parse_time_slot};

/// Attach occupancy level, time period and line ordinal to melted rows.
///
/// The period is keyed off the hour of the label, not the sort key.
pub fn enrich(long: Vec<LongRecord>) -> Result<Vec<CongestionRecord>, PipelineError> {
    long.into_iter()
        .map(|r| {
            let (hour, _) = parse_time_slot(&r.time_slot)?;
            Ok(CongestionRecord {
                level: CongestionLevel::from_congestion(r.congestion),
                period: TimePeriod::from_hour(hour),
                line_number: extract_line_number(&r.key.line),
                day_type: r.key.day_type,
                line: r.key.line,
                station_number: r.key.station_number,
                station_name: r.key.station_name,
                direction: r.key.direction,
                time_slot: r.time_slot,
                sort_key: r.sort_key,
                congestion: r.congestion,
            })
        })
        .collect()
}

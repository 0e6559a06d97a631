//! Time-slot analysis: snapshots at one slot, two-slot comparisons and
//! commute peak windows.
use crate::error::PipelineError;
use crate::query::{asc, congestion_by_time, desc, group_by, mean_of};
use crate::types::{
    CongestionRecord, DayFilter, PeakHoursPattern, PeakWindow, SlotComparisonRow,
    StationSnapshotRow, TimeRankRow, TimeSummaryRow,
};
use crate::util::{argmax, average, time_sort_key};
use std::collections::HashMap;

pub const MORNING_PEAK: (u32, u32) = (7 * 60, 9 * 60);
pub const EVENING_PEAK: (u32, u32) = (17 * 60, 19 * 60);

/// Mean occupancy per (station, line) over `records`, busiest first.
fn per_station<'a, I>(records: I) -> Vec<StationSnapshotRow>
where
    I: IntoIterator<Item = &'a CongestionRecord>,
{
    let owned: Vec<CongestionRecord> = records.into_iter().cloned().collect();
    let mut rows: Vec<StationSnapshotRow> = group_by(&owned, |r| (r.station_name.clone(), r.line.clone()))
        .into_iter()
        .map(|((station_name, line), group)| StationSnapshotRow {
            line_number: group[0].line_number,
            congestion: mean_of(&group),
            station_name,
            line,
        })
        .collect();
    rows.sort_by(|a, b| desc(a.congestion, b.congestion));
    rows
}

/// Per-station mean occupancy at exactly `time_slot`, averaged over
/// directions, sorted descending.
pub fn time_snapshot(records: &[CongestionRecord], time_slot: &str, day: &DayFilter) -> Vec<StationSnapshotRow> {
    per_station(
        records
            .iter()
            .filter(|r| r.time_slot == time_slot && day.matches(&r.day_type)),
    )
}

pub fn top_stations_by_time(
    records: &[CongestionRecord],
    time_slot: &str,
    n: usize,
    ascending: bool,
    day: &DayFilter,
) -> Vec<TimeRankRow> {
    let mut snapshot = time_snapshot(records, time_slot, day);
    if ascending {
        snapshot.sort_by(|a, b| asc(a.congestion, b.congestion));
    }
    snapshot
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, r)| TimeRankRow {
            rank: i + 1,
            station_name: r.station_name,
            line: r.line,
            congestion: r.congestion,
        })
        .collect()
}

/// Join the snapshots of two slots on (station, line). `difference` is
/// `b - a`; rows are sorted by the two-slot average, busiest first.
pub fn compare_time_slots(
    records: &[CongestionRecord],
    slot_a: &str,
    slot_b: &str,
    day: &DayFilter,
    top_n: usize,
) -> Vec<SlotComparisonRow> {
    let a = time_snapshot(records, slot_a, day);
    let b: HashMap<(String, String), f64> = time_snapshot(records, slot_b, day)
        .into_iter()
        .map(|r| ((r.station_name, r.line), r.congestion))
        .collect();

    let mut rows: Vec<SlotComparisonRow> = a
        .into_iter()
        .filter_map(|r| {
            let congestion_b = *b.get(&(r.station_name.clone(), r.line.clone()))?;
            Some(SlotComparisonRow {
                difference: congestion_b - r.congestion,
                average: (r.congestion + congestion_b) / 2.0,
                congestion_a: r.congestion,
                congestion_b,
                station_name: r.station_name,
                line: r.line,
            })
        })
        .collect();
    rows.sort_by(|x, y| desc(x.average, y.average));
    rows.truncate(top_n);
    rows
}

fn peak_window(by_time: &[TimeSummaryRow], (start, end): (u32, u32)) -> Option<PeakWindow> {
    let window: Vec<_> = by_time
        .iter()
        .filter(|r| r.sort_key >= start && r.sort_key <= end)
        .collect();
    let values: Vec<f64> = window.iter().map(|r| r.avg_congestion).collect();
    let peak = window[argmax(&values)?];
    Some(PeakWindow {
        peak_time: peak.time_slot.clone(),
        peak_congestion: peak.avg_congestion,
        avg_congestion: average(&values),
    })
}

/// Busiest slot and mean inside the 07:00-09:00 and 17:00-19:00 windows.
pub fn peak_hours_pattern(records: &[CongestionRecord], day: &DayFilter) -> PeakHoursPattern {
    let filtered: Vec<CongestionRecord> = records
        .iter()
        .filter(|r| day.matches(&r.day_type))
        .cloned()
        .collect();
    let by_time = congestion_by_time(&filtered, None);
    PeakHoursPattern {
        morning: peak_window(&by_time, MORNING_PEAK),
        evening: peak_window(&by_time, EVENING_PEAK),
    }
}

/// Per-station mean occupancy inside the inclusive `[start, end]` window,
/// given as `HH:MM` labels. Malformed labels are an error.
pub fn time_range_congestion(
    records: &[CongestionRecord],
    start: &str,
    end: &str,
    day: &DayFilter,
) -> Result<Vec<StationSnapshotRow>, PipelineError> {
    let (start, end) = (time_sort_key(start)?, time_sort_key(end)?);
    Ok(per_station(records.iter().filter(|r| {
        r.sort_key >= start && r.sort_key <= end && day.matches(&r.day_type)
    })))
}

//! Dashboard-level filters and aggregates over the enriched long table.
//!
//! Every function borrows the table and returns fresh rows; an empty input
//! or a filter that matches nothing yields an empty result, never an error.
use crate::types::{
    BusiestSlot, CongestionRecord, DatasetStats, DayFilter, GroupKey, LineSummaryRow, PeakInfo,
    StationRankRow, TimeSummaryRow,
};
use crate::util::{argmax, argmin, average, extract_line_number, max_value, min_value, sample_std};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Group records by `key`, keeping groups in order of first appearance.
pub(crate) fn group_by<'a, K, F>(records: &'a [CongestionRecord], key: F) -> Vec<(K, Vec<&'a CongestionRecord>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&CongestionRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&CongestionRecord>)> = Vec::new();
    for r in records {
        let k = key(r);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(r),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![r]));
            }
        }
    }
    groups
}

pub(crate) fn mean_of(rows: &[&CongestionRecord]) -> f64 {
    average(&rows.iter().map(|r| r.congestion).collect::<Vec<_>>())
}

pub(crate) fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub(crate) fn asc(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Lines without an embedded number sort after every numbered line.
pub(crate) fn line_order(line_number: Option<u32>) -> (bool, u32) {
    (line_number.is_none(), line_number.unwrap_or(0))
}

/// Subset by day type, line set and an inclusive `[start_hour, end_hour]`
/// window on the sort key. An empty `lines` slice keeps every line.
pub fn filter(
    records: &[CongestionRecord],
    day: &DayFilter,
    lines: &[String],
    hours: Option<(u32, u32)>,
) -> Vec<CongestionRecord> {
    records
        .iter()
        .filter(|r| day.matches(&r.day_type))
        .filter(|r| lines.is_empty() || lines.iter().any(|l| *l == r.line))
        .filter(|r| match hours {
            Some((start, end)) => {
                r.sort_key >= start.saturating_mul(60) && r.sort_key <= end.saturating_mul(60)
            }
            None => true,
        })
        .cloned()
        .collect()
}

pub fn statistics(records: &[CongestionRecord]) -> DatasetStats {
    if records.is_empty() {
        return DatasetStats::default();
    }
    let values: Vec<f64> = records.iter().map(|r| r.congestion).collect();
    let lines: HashSet<&str> = records.iter().map(|r| r.line.as_str()).collect();
    let stations: HashSet<&str> = records.iter().map(|r| r.station_name.as_str()).collect();
    let busiest = argmax(&values).map(|i| BusiestSlot {
        station_name: records[i].station_name.clone(),
        time_slot: records[i].time_slot.clone(),
        congestion: records[i].congestion,
    });
    DatasetStats {
        total_rows: records.len(),
        line_count: lines.len(),
        station_count: stations.len(),
        avg_congestion: average(&values),
        max_congestion: max_value(&values),
        min_congestion: min_value(&values),
        std_congestion: sample_std(&values),
        busiest,
    }
}

/// Mean occupancy and distinct station count per line, in line order.
pub fn congestion_by_line(records: &[CongestionRecord]) -> Vec<LineSummaryRow> {
    let mut rows: Vec<(Option<u32>, LineSummaryRow)> = group_by(records, |r| r.line.clone())
        .into_iter()
        .map(|(line, group)| {
            let stations: HashSet<&str> = group.iter().map(|r| r.station_name.as_str()).collect();
            let row = LineSummaryRow {
                avg_congestion: mean_of(&group),
                station_count: stations.len(),
                line,
            };
            (group[0].line_number, row)
        })
        .collect();
    rows.sort_by_key(|(n, _)| line_order(*n));
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Mean occupancy per time slot, optionally split by one more column,
/// ordered by sort key and then by the group label.
pub fn congestion_by_time(records: &[CongestionRecord], group: Option<GroupKey>) -> Vec<TimeSummaryRow> {
    let mut rows: Vec<TimeSummaryRow> = group_by(records, |r| {
        (r.time_slot.clone(), r.sort_key, group.map(|g| g.value(r)))
    })
    .into_iter()
    .map(|((time_slot, sort_key, group), rows)| TimeSummaryRow {
        time_slot,
        sort_key,
        group,
        avg_congestion: mean_of(&rows),
    })
    .collect();
    rows.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then_with(|| a.group.cmp(&b.group)));
    rows
}

/// Mean occupancy per (day type, time slot), for weekday/holiday charts.
pub fn congestion_by_day_time(records: &[CongestionRecord]) -> Vec<TimeSummaryRow> {
    congestion_by_time(records, Some(GroupKey::DayType))
}

/// Rank stations by mean occupancy. `ascending` puts the least congested
/// first; ties keep table order.
pub fn top_stations(records: &[CongestionRecord], n: usize, ascending: bool) -> Vec<StationRankRow> {
    let mut rows: Vec<StationRankRow> = group_by(records, |r| (r.line.clone(), r.station_name.clone()))
        .into_iter()
        .map(|((line, station_name), group)| {
            let values: Vec<f64> = group.iter().map(|r| r.congestion).collect();
            StationRankRow {
                rank: 0,
                line,
                station_name,
                avg_congestion: average(&values),
                max_congestion: max_value(&values),
            }
        })
        .collect();
    if ascending {
        rows.sort_by(|a, b| asc(a.avg_congestion, b.avg_congestion));
    } else {
        rows.sort_by(|a, b| desc(a.avg_congestion, b.avg_congestion));
    }
    rows.truncate(n);
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}

/// Busiest and quietest time slot by mean occupancy; first slot in
/// chronological order wins a tie.
pub fn peak_info(records: &[CongestionRecord]) -> Option<PeakInfo> {
    let by_time = congestion_by_time(records, None);
    let values: Vec<f64> = by_time.iter().map(|r| r.avg_congestion).collect();
    let peak = &by_time[argmax(&values)?];
    let quiet = &by_time[argmin(&values)?];
    Some(PeakInfo {
        peak_time: peak.time_slot.clone(),
        peak_congestion: peak.avg_congestion,
        quiet_time: quiet.time_slot.clone(),
        quiet_congestion: quiet.avg_congestion,
    })
}

pub fn line_list(records: &[CongestionRecord]) -> Vec<String> {
    let mut lines: Vec<(String, Option<u32>)> = group_by(records, |r| r.line.clone())
        .into_iter()
        .map(|(line, _)| {
            let n = extract_line_number(&line);
            (line, n)
        })
        .collect();
    lines.sort_by_key(|(_, n)| line_order(*n));
    lines.into_iter().map(|(l, _)| l).collect()
}

/// Distinct time-slot labels in chronological order.
pub fn time_slots(records: &[CongestionRecord]) -> Vec<String> {
    let mut slots: Vec<(u32, String)> = group_by(records, |r| (r.sort_key, r.time_slot.clone()))
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    slots.sort();
    slots.into_iter().map(|(_, s)| s).collect()
}

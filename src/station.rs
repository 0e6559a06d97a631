//! Single-station views: stats, direction/day comparisons and heatmaps.
use crate::query::{asc, congestion_by_time, group_by, mean_of, peak_info};
use crate::types::{
    CongestionLevel, CongestionRecord, GroupKey, HeatmapMatrix, PivotBy, StationStats, TimeSummaryRow,
    SATURDAY, SUNDAY, WEEKDAY,
};
use crate::util::{average, max_value, min_value};
use std::collections::BTreeSet;

/// Gap in percentage points below which two averages count as similar.
const INSIGHT_GAP: f64 = 5.0;

/// Distinct station names, optionally restricted to one line, sorted.
pub fn station_list(records: &[CongestionRecord], line: Option<&str>) -> Vec<String> {
    records
        .iter()
        .filter(|r| line.map_or(true, |l| r.line == l))
        .map(|r| r.station_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn station_records(records: &[CongestionRecord], station: &str, line: &str) -> Vec<CongestionRecord> {
    records
        .iter()
        .filter(|r| r.station_name == station && r.line == line)
        .cloned()
        .collect()
}

/// `None` when the station has no rows on that line.
pub fn station_stats(records: &[CongestionRecord], station: &str, line: &str) -> Option<StationStats> {
    let rows = station_records(records, station, line);
    let values: Vec<f64> = rows.iter().map(|r| r.congestion).collect();
    let peak = peak_info(&rows)?;
    Some(StationStats {
        avg_congestion: average(&values),
        max_congestion: max_value(&values),
        min_congestion: min_value(&values),
        peak,
    })
}

pub fn station_direction_comparison(records: &[CongestionRecord], station: &str, line: &str) -> Vec<TimeSummaryRow> {
    let rows = station_records(records, station, line);
    congestion_by_time(&rows, Some(GroupKey::Direction))
}

pub fn station_day_comparison(records: &[CongestionRecord], station: &str, line: &str) -> Vec<TimeSummaryRow> {
    let rows = station_records(records, station, line);
    congestion_by_time(&rows, Some(GroupKey::DayType))
}

/// Pivot one station into a `pivot x time slot` matrix of mean occupancy.
/// Rows are sorted by label; columns are chronological.
pub fn station_heatmap(records: &[CongestionRecord], station: &str, line: &str, pivot: PivotBy) -> HeatmapMatrix {
    let rows = station_records(records, station, line);
    let grouped = congestion_by_time(&rows, Some(pivot.into()));

    let row_labels: Vec<String> = grouped
        .iter()
        .filter_map(|r| r.group.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut time_slots: Vec<String> = Vec::new();
    for r in &grouped {
        if !time_slots.contains(&r.time_slot) {
            time_slots.push(r.time_slot.clone());
        }
    }

    let mut values = vec![vec![None; time_slots.len()]; row_labels.len()];
    for r in &grouped {
        let (Some(group), Some(j)) = (
            r.group.as_ref(),
            time_slots.iter().position(|t| *t == r.time_slot),
        ) else {
            continue;
        };
        if let Some(i) = row_labels.iter().position(|l| l == group) {
            values[i][j] = Some(r.avg_congestion);
        }
    }
    HeatmapMatrix {
        pivot,
        row_labels,
        time_slots,
        values,
    }
}

/// Short observations about one station; empty when it has no data.
pub fn station_insights(records: &[CongestionRecord], station: &str, line: &str) -> Vec<String> {
    let rows = station_records(records, station, line);
    let Some(stats) = station_stats(records, station, line) else {
        return Vec::new();
    };
    let mut insights = vec![
        format!(
            "이 역은 {}에 가장 혼잡합니다 (혼잡도 {:.1}%)",
            stats.peak.peak_time, stats.peak.peak_congestion
        ),
        format!(
            "가장 여유로운 시간대는 {}입니다 (혼잡도 {:.1}%)",
            stats.peak.quiet_time, stats.peak.quiet_congestion
        ),
    ];

    let weekday: Vec<&CongestionRecord> = rows.iter().filter(|r| r.day_type == WEEKDAY).collect();
    let weekend: Vec<&CongestionRecord> = rows
        .iter()
        .filter(|r| r.day_type == SATURDAY || r.day_type == SUNDAY)
        .collect();
    let (weekday_avg, weekend_avg) = (mean_of(&weekday), mean_of(&weekend));
    if weekday_avg > 0.0 && weekend_avg > 0.0 {
        let diff = weekday_avg - weekend_avg;
        if diff > INSIGHT_GAP {
            insights.push(format!("평일이 주말보다 평균 {:.1}% 더 혼잡합니다", diff));
        } else if diff < -INSIGHT_GAP {
            insights.push(format!("주말이 평일보다 평균 {:.1}% 더 혼잡합니다", diff.abs()));
        } else {
            insights.push("평일과 주말의 혼잡도 차이가 크지 않습니다".to_string());
        }
    }

    let mut by_direction: Vec<(String, f64)> = group_by(&rows, |r| r.direction.clone())
        .into_iter()
        .map(|(d, g)| (d, mean_of(&g)))
        .collect();
    if by_direction.len() >= 2 {
        by_direction.sort_by(|a, b| asc(a.1, b.1));
        let (less, low) = &by_direction[0];
        let (more, high) = &by_direction[by_direction.len() - 1];
        let diff = high - low;
        if diff > INSIGHT_GAP {
            insights.push(format!(
                "{} 방향이 {} 방향보다 평균 {:.1}% 덜 혼잡합니다",
                less, more, diff
            ));
        }
    }

    let avg = stats.avg_congestion;
    insights.push(match CongestionLevel::from_congestion(avg) {
        CongestionLevel::Relaxed => format!("이 역은 전반적으로 여유로운 편입니다 (평균 {:.1}%)", avg),
        CongestionLevel::Normal => format!("이 역은 보통 수준의 혼잡도를 보입니다 (평균 {:.1}%)", avg),
        CongestionLevel::Congested => format!("이 역은 전반적으로 혼잡한 편입니다 (평균 {:.1}%)", avg),
    });
    insights
}

use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

pub const WEEKDAY: &str = "평일";
pub const SATURDAY: &str = "토요일";
pub const SUNDAY: &str = "일요일";
pub const ALL_DAYS: &str = "전체";
pub const HOLIDAY: &str = "휴일";

/// Raw wide table exactly as parsed from the source file: one header row
/// and string cells. Nothing is trimmed or typed yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }
}

/// The five positional identifier columns of a wide row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StationKey {
    pub day_type: String,
    pub line: String,
    pub station_number: String,
    pub station_name: String,
    pub direction: String,
}

/// Wide table after value cleaning: one `f64` per time-slot column, in the
/// column order of `time_slots`.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    pub time_slots: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone)]
pub struct WideRow {
    pub key: StationKey,
    pub values: Vec<f64>,
}

/// A melted row before the derived categories are attached.
#[derive(Debug, Clone)]
pub struct LongRecord {
    pub key: StationKey,
    pub time_slot: String,
    pub sort_key: u32,
    pub congestion: f64,
}

/// Three-band occupancy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CongestionLevel {
    #[serde(rename = "여유")]
    Relaxed,
    #[serde(rename = "보통")]
    Normal,
    #[serde(rename = "혼잡")]
    Congested,
}

impl CongestionLevel {
    pub fn from_congestion(congestion: f64) -> Self {
        if congestion < 50.0 {
            CongestionLevel::Relaxed
        } else if congestion < 70.0 {
            CongestionLevel::Normal
        } else {
            CongestionLevel::Congested
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CongestionLevel::Relaxed => "여유",
            CongestionLevel::Normal => "보통",
            CongestionLevel::Congested => "혼잡",
        }
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named part of the service day, bucketed by the hour of a time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "출근시간")]
    CommuteIn,
    #[serde(rename = "오전")]
    Morning,
    #[serde(rename = "점심시간")]
    Lunch,
    #[serde(rename = "오후")]
    Afternoon,
    #[serde(rename = "퇴근시간")]
    CommuteOut,
    #[serde(rename = "저녁")]
    Evening,
    #[serde(rename = "심야")]
    LateNight,
}

impl TimePeriod {
    /// Hour 24 (the remapped midnight) lands in `LateNight`.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=8 => TimePeriod::CommuteIn,
            9..=11 => TimePeriod::Morning,
            12..=13 => TimePeriod::Lunch,
            14..=17 => TimePeriod::Afternoon,
            18..=20 => TimePeriod::CommuteOut,
            21..=23 => TimePeriod::Evening,
            _ => TimePeriod::LateNight,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimePeriod::CommuteIn => "출근시간",
            TimePeriod::Morning => "오전",
            TimePeriod::Lunch => "점심시간",
            TimePeriod::Afternoon => "오후",
            TimePeriod::CommuteOut => "퇴근시간",
            TimePeriod::Evening => "저녁",
            TimePeriod::LateNight => "심야",
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the enriched long-format table, and one row of the persisted
/// artifact. Field renames are the artifact's column headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionRecord {
    #[serde(rename = "요일구분")]
    pub day_type: String,
    #[serde(rename = "호선")]
    pub line: String,
    #[serde(rename = "역번호")]
    pub station_number: String,
    #[serde(rename = "역명")]
    pub station_name: String,
    #[serde(rename = "방향")]
    pub direction: String,
    #[serde(rename = "시간대")]
    pub time_slot: String,
    #[serde(rename = "시간_정렬용")]
    pub sort_key: u32,
    #[serde(rename = "혼잡도")]
    pub congestion: f64,
    #[serde(rename = "혼잡도_레벨")]
    pub level: CongestionLevel,
    #[serde(rename = "시간대_구분")]
    pub period: TimePeriod,
    #[serde(rename = "호선_번호")]
    pub line_number: Option<u32>,
}

/// Day-type filter accepted by every query.
///
/// Any value other than "전체" and "휴일" is matched literally, so an unknown
/// day type simply selects nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayFilter {
    All,
    Holiday,
    Exact(String),
}

impl DayFilter {
    pub fn matches(&self, day_type: &str) -> bool {
        match self {
            DayFilter::All => true,
            DayFilter::Holiday => day_type == SATURDAY || day_type == SUNDAY,
            DayFilter::Exact(d) => d == day_type,
        }
    }
}

impl From<&str> for DayFilter {
    fn from(s: &str) -> Self {
        match s {
            "" | ALL_DAYS => DayFilter::All,
            HOLIDAY => DayFilter::Holiday,
            other => DayFilter::Exact(other.to_string()),
        }
    }
}

/// Extra grouping column for time-slot aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    DayType,
    Line,
    Direction,
    Period,
    Level,
}

impl GroupKey {
    pub fn value(&self, r: &CongestionRecord) -> String {
        match self {
            GroupKey::DayType => r.day_type.clone(),
            GroupKey::Line => r.line.clone(),
            GroupKey::Direction => r.direction.clone(),
            GroupKey::Period => r.period.label().to_string(),
            GroupKey::Level => r.level.label().to_string(),
        }
    }
}

/// Row dimension of a station heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotBy {
    Direction,
    DayType,
}

impl From<PivotBy> for GroupKey {
    fn from(p: PivotBy) -> Self {
        match p {
            PivotBy::Direction => GroupKey::Direction,
            PivotBy::DayType => GroupKey::DayType,
        }
    }
}

fn fmt_pct(v: &f64) -> String {
    format!("{:.1}", v)
}

fn fmt_signed(v: &f64) -> String {
    format!("{:+.1}", v)
}

fn fmt_group(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct LineSummaryRow {
    #[serde(rename = "호선")]
    #[tabled(rename = "호선")]
    pub line: String,
    #[serde(rename = "평균_혼잡도")]
    #[tabled(rename = "평균_혼잡도", display_with = "fmt_pct")]
    pub avg_congestion: f64,
    #[serde(rename = "역_수")]
    #[tabled(rename = "역_수")]
    pub station_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TimeSummaryRow {
    #[serde(rename = "시간대")]
    #[tabled(rename = "시간대")]
    pub time_slot: String,
    #[serde(skip)]
    #[tabled(skip)]
    pub sort_key: u32,
    #[serde(rename = "구분")]
    #[tabled(rename = "구분", display_with = "fmt_group")]
    pub group: Option<String>,
    #[serde(rename = "혼잡도")]
    #[tabled(rename = "혼잡도", display_with = "fmt_pct")]
    pub avg_congestion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct StationRankRow {
    #[serde(rename = "순위")]
    #[tabled(rename = "순위")]
    pub rank: usize,
    #[serde(rename = "호선")]
    #[tabled(rename = "호선")]
    pub line: String,
    #[serde(rename = "역명")]
    #[tabled(rename = "역명")]
    pub station_name: String,
    #[serde(rename = "평균_혼잡도")]
    #[tabled(rename = "평균_혼잡도", display_with = "fmt_pct")]
    pub avg_congestion: f64,
    #[serde(rename = "최대_혼잡도")]
    #[tabled(rename = "최대_혼잡도", display_with = "fmt_pct")]
    pub max_congestion: f64,
}

/// Per-station mean occupancy at one time slot or within one time window.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct StationSnapshotRow {
    #[serde(rename = "역명")]
    #[tabled(rename = "역명")]
    pub station_name: String,
    #[serde(rename = "호선")]
    #[tabled(rename = "호선")]
    pub line: String,
    #[serde(skip)]
    #[tabled(skip)]
    pub line_number: Option<u32>,
    #[serde(rename = "혼잡도")]
    #[tabled(rename = "혼잡도", display_with = "fmt_pct")]
    pub congestion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TimeRankRow {
    #[serde(rename = "순위")]
    #[tabled(rename = "순위")]
    pub rank: usize,
    #[serde(rename = "역명")]
    #[tabled(rename = "역명")]
    pub station_name: String,
    #[serde(rename = "호선")]
    #[tabled(rename = "호선")]
    pub line: String,
    #[serde(rename = "혼잡도")]
    #[tabled(rename = "혼잡도", display_with = "fmt_pct")]
    pub congestion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SlotComparisonRow {
    #[serde(rename = "역명")]
    #[tabled(rename = "역명")]
    pub station_name: String,
    #[serde(rename = "호선")]
    #[tabled(rename = "호선")]
    pub line: String,
    #[serde(rename = "혼잡도_A")]
    #[tabled(rename = "혼잡도_A", display_with = "fmt_pct")]
    pub congestion_a: f64,
    #[serde(rename = "혼잡도_B")]
    #[tabled(rename = "혼잡도_B", display_with = "fmt_pct")]
    pub congestion_b: f64,
    #[serde(rename = "차이")]
    #[tabled(rename = "차이", display_with = "fmt_signed")]
    pub difference: f64,
    #[serde(rename = "평균")]
    #[tabled(rename = "평균", display_with = "fmt_pct")]
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakInfo {
    pub peak_time: String,
    pub peak_congestion: f64,
    pub quiet_time: String,
    pub quiet_congestion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub avg_congestion: f64,
    pub max_congestion: f64,
    pub min_congestion: f64,
    pub peak: PeakInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakWindow {
    pub peak_time: String,
    pub peak_congestion: f64,
    pub avg_congestion: f64,
}

/// Commute peaks; a window is `None` when no time slot falls inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeakHoursPattern {
    pub morning: Option<PeakWindow>,
    pub evening: Option<PeakWindow>,
}

/// Pivoted station matrix: `values[i][j]` is the mean occupancy for
/// `row_labels[i]` at `time_slots[j]`, `None` where no sample exists.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapMatrix {
    pub pivot: PivotBy,
    pub row_labels: Vec<String>,
    pub time_slots: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl HeatmapMatrix {
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }

    pub fn get(&self, row: &str, time_slot: &str) -> Option<f64> {
        let i = self.row_labels.iter().position(|r| r == row)?;
        let j = self.time_slots.iter().position(|t| t == time_slot)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusiestSlot {
    pub station_name: String,
    pub time_slot: String,
    pub congestion: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_rows: usize,
    pub line_count: usize,
    pub station_count: usize,
    pub avg_congestion: f64,
    pub max_congestion: f64,
    pub min_congestion: f64,
    pub std_congestion: f64,
    pub busiest: Option<BusiestSlot>,
}

//! End-to-end tests: raw CSV text -> enriched table -> artifact -> queries.

use std::fs;

use subway_congestion::loader::{load_processed, parse_raw, save_processed};
use subway_congestion::query::{congestion_by_line, congestion_by_time, filter, peak_info, statistics, top_stations};
use subway_congestion::station::{station_day_comparison, station_direction_comparison, station_heatmap, station_stats};
use subway_congestion::timeslot::{compare_time_slots, peak_hours_pattern, time_range_congestion, time_snapshot};
use subway_congestion::types::{CongestionLevel, PivotBy};
use subway_congestion::validate::validate;
use subway_congestion::{preprocess, CongestionRecord, DayFilter, PipelineError};
use tempfile::TempDir;

const HEADER: &str = "구분,호선,역번호,출발역,상하구분,5시30분,8시00분,18시00분,23시30분,0시00분";

fn enriched(body: &str) -> Vec<CongestionRecord> {
    let raw = parse_raw(&format!("{}\n{}", HEADER, body)).expect("fixture should parse");
    preprocess(&raw).expect("pipeline should succeed")
}

fn fixture() -> Vec<CongestionRecord> {
    enriched(
        "평일,2호선,222,강남,상선,10,80,60,20,5\n\
         평일,2호선,222,강남,하선,12,70,90,25,4\n\
         토요일,2호선,222,강남,상선,5,30,40,15,3\n\
         평일,2호선,221,역삼,상선,8,50,55,10,2\n\
         평일,5호선,510,광화문,상선, 7 5 ,-4,40,,1\n",
    )
}

#[test]
fn round_trip_scenario() {
    let raw = parse_raw("a,b,c,d,e,8시00분,20시00분\n평일,2호선,222,강남,상행,80,30\n").unwrap();
    let table = preprocess(&raw).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].time_slot, "08:00");
    assert_eq!(table[0].level, CongestionLevel::Congested);
    assert_eq!(table[1].time_slot, "20:00");
    assert_eq!(table[1].level, CongestionLevel::Relaxed);

    let station = filter(&table, &DayFilter::from("평일"), &["2호선".to_string()], None);
    let p = peak_info(&station).unwrap();
    assert_eq!((p.peak_time.as_str(), p.peak_congestion), ("08:00", 80.0));
    assert_eq!((p.quiet_time.as_str(), p.quiet_congestion), ("20:00", 30.0));
}

#[test]
fn every_cell_appears_exactly_once() {
    let table = fixture();
    assert_eq!(table.len(), 5 * 5);
    for station in ["강남", "역삼", "광화문"] {
        for slot in ["05:30", "08:00", "18:00", "23:30", "24:00"] {
            let n = table
                .iter()
                .filter(|r| r.station_name == station && r.time_slot == slot && r.day_type == "평일")
                .count();
            let expected = if station == "강남" { 2 } else { 1 };
            assert_eq!(n, expected, "{} {}", station, slot);
        }
    }
}

#[test]
fn cleaning_keeps_values_non_negative() {
    let table = fixture();
    assert!(table.iter().all(|r| r.congestion >= 0.0));
    let gwanghwamun: Vec<f64> = table
        .iter()
        .filter(|r| r.station_name == "광화문")
        .map(|r| r.congestion)
        .collect();
    // " 7 5 " and "-4" and "" all become 0
    assert_eq!(gwanghwamun, vec![0.0, 0.0, 40.0, 0.0, 1.0]);
}

#[test]
fn sort_key_increases_within_each_group() {
    let table = fixture();
    for pair in table.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let same_group = a.line == b.line
            && a.station_name == b.station_name
            && a.direction == b.direction
            && a.day_type == b.day_type;
        if same_group {
            assert!(a.sort_key < b.sort_key, "{} !< {}", a.time_slot, b.time_slot);
        }
    }
    let midnight = table.iter().find(|r| r.time_slot == "24:00").unwrap();
    let late = table.iter().find(|r| r.time_slot == "23:30").unwrap();
    assert!(midnight.sort_key > late.sort_key);
}

#[test]
fn top_n_is_sorted_and_ranked() {
    let table = fixture();
    for n in [0, 1, 2, 3, 10] {
        let top = top_stations(&table, n, false);
        assert_eq!(top.len(), n.min(3));
        assert!(top.windows(2).all(|w| w[0].avg_congestion >= w[1].avg_congestion));
        let ranks: Vec<usize> = top.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=top.len()).collect::<Vec<_>>());
    }
}

#[test]
fn compare_time_slots_scenario() {
    let table = enriched("평일,2호선,100,X,상선,0,80,60,0,0\n");
    let rows = compare_time_slots(&table, "08:00", "18:00", &DayFilter::All, 20);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].station_name, "X");
    assert_eq!(rows[0].difference, -20.0);
}

#[test]
fn empty_filter_yields_empty_results_everywhere() {
    let table = enriched(
        "평일,2호선,222,강남,상선,10,80,60,20,5\n\
         토요일,2호선,222,강남,상선,5,30,40,15,3\n",
    );
    let empty = filter(&table, &DayFilter::from("일요일"), &[], None);
    assert!(empty.is_empty());

    assert_eq!(statistics(&empty).total_rows, 0);
    assert!(congestion_by_line(&empty).is_empty());
    assert!(congestion_by_time(&empty, None).is_empty());
    assert!(top_stations(&empty, 10, false).is_empty());
    assert!(peak_info(&empty).is_none());
    assert!(station_stats(&empty, "강남", "2호선").is_none());
    assert!(station_direction_comparison(&empty, "강남", "2호선").is_empty());
    assert!(station_day_comparison(&empty, "강남", "2호선").is_empty());
    assert!(station_heatmap(&empty, "강남", "2호선", PivotBy::Direction).is_empty());
    assert!(time_snapshot(&empty, "08:00", &DayFilter::All).is_empty());
    assert!(compare_time_slots(&empty, "08:00", "18:00", &DayFilter::All, 5).is_empty());
    let pattern = peak_hours_pattern(&empty, &DayFilter::All);
    assert!(pattern.morning.is_none() && pattern.evening.is_none());
    assert!(time_range_congestion(&empty, "07:00", "09:00", &DayFilter::All)
        .unwrap()
        .is_empty());
}

#[test]
fn aggregates_are_repeatable() {
    let table = fixture();
    let all = filter(&table, &DayFilter::from("전체"), &[], None);
    assert_eq!(all, table);
    assert_eq!(congestion_by_time(&all, None), congestion_by_time(&all, None));
}

#[test]
fn artifact_round_trip_preserves_records() {
    let table = fixture();
    assert!(validate(&table).passed);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("processed").join("subway_congestion.csv");
    save_processed(&path, &table).unwrap();
    assert!(!dir.path().join("processed").join("subway_congestion.csv.tmp").exists());

    let loaded = load_processed(&path).unwrap();
    assert_eq!(loaded, table);
}

#[test]
fn artifact_keeps_lines_without_an_ordinal() {
    let table = enriched(
        "평일,우이신설선,4711,북한산우이,상선,3,45,30,8,1\n\
         평일,2호선,222,강남,상선,10,80,60,20,5\n",
    );
    let unnumbered: Vec<&CongestionRecord> = table.iter().filter(|r| r.line == "우이신설선").collect();
    assert_eq!(unnumbered.len(), 5);
    assert!(unnumbered.iter().all(|r| r.line_number.is_none()));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lines.csv");
    save_processed(&path, &table).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let row = text.lines().find(|l| l.contains("우이신설선")).unwrap();
    assert!(row.ends_with(','), "{}", row);

    assert_eq!(load_processed(&path).unwrap(), table);
}

#[test]
fn empty_artifact_still_has_a_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");
    save_processed(&path, &[]).unwrap();
    assert!(load_processed(&path).unwrap().is_empty());
}

#[test]
fn artifact_without_required_columns_is_a_schema_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "호선,역명\n2호선,강남\n").unwrap();
    let err = load_processed(&path).unwrap_err();
    assert!(err.is_schema_error(), "{:?}", err);
}

#[test]
fn artifact_with_text_occupancy_is_a_type_error() {
    let table = enriched("평일,2호선,222,강남,상선,10,80,60,20,5\n");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("typed.csv");
    save_processed(&path, &table).unwrap();
    let text = fs::read_to_string(&path).unwrap().replacen(",80.0,", ",many,", 1);
    fs::write(&path, text).unwrap();
    assert!(matches!(
        load_processed(&path),
        Err(PipelineError::NonNumericCongestion { .. })
    ));
}

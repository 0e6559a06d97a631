// Entry point and interactive CLI flow.
//
// - Option [1] loads the raw wide CSV, runs the preprocessing pipeline,
//   validates the result and persists the enriched artifact.
// - Option [2] loads the artifact, prints report previews, writes the
//   report CSVs and a JSON summary.
// - After generating reports, the user can go back to the menu or exit.
use anyhow::{bail, Context, Result};
use chrono::{Local, SecondsFormat};
use clap::Parser;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use subway_congestion::types::{DatasetStats, PeakHoursPattern, PeakInfo, WEEKDAY};
use subway_congestion::{loader, output, query, timeslot, util, validate};
use subway_congestion::{CongestionRecord, DayFilter};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "subway_congestion")]
#[command(about = "Preprocess and report on Seoul subway congestion data", long_about = None)]
struct Cli {
    /// Raw wide-format CSV (CP949 or UTF-8)
    #[arg(long, default_value = "data/raw/서울교통공사_지하철혼잡도정보_20250930.csv")]
    raw: PathBuf,

    /// Enriched long-format artifact
    #[arg(long, default_value = "data/processed/subway_congestion.csv")]
    artifact: PathBuf,

    /// Directory for report CSVs and summary.json
    #[arg(long, default_value = "reports")]
    out_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

// The loaded snapshot is kept so reports can be generated repeatedly
// without re-reading or copying the artifact.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Arc<Vec<CongestionRecord>>>,
}

#[derive(Serialize)]
struct Summary<'a> {
    generated_at: String,
    stats: &'a DatasetStats,
    peak: Option<&'a PeakInfo>,
    weekday_commute: &'a PeakHoursPattern,
}

/// Next trimmed line of input; `None` once input is exhausted.
fn read_line(input: &mut impl BufRead) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) => None,
        Ok(_) => Some(buf.trim().to_string()),
        Err(e) => {
            warn!(error = %e, "cannot read input");
            None
        }
    }
}

fn read_choice(input: &mut impl BufRead) -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    read_line(input)
}

/// `Some(true)` if the user chose `Y`, `Some(false)` for `N`, `None` at end
/// of input.
fn prompt_back_to_menu(input: &mut impl BufRead) -> Option<bool> {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        match read_line(input)?.to_uppercase().as_str() {
            "Y" => return Some(true),
            "N" => return Some(false),
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn store(data: Vec<CongestionRecord>) -> Arc<Vec<CongestionRecord>> {
    let data = Arc::new(data);
    let mut state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
    state.data = Some(Arc::clone(&data));
    data
}

fn cached() -> Option<Arc<Vec<CongestionRecord>>> {
    let state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
    state.data.clone()
}

/// Option [1]: raw CSV -> enriched artifact. Nothing is written unless the
/// pipeline and the fatal validation checks both succeed.
fn handle_preprocess(cli: &Cli) -> Result<()> {
    let raw = loader::load_raw(&cli.raw).with_context(|| format!("loading {}", cli.raw.display()))?;
    let (rows, columns) = raw.shape();
    println!(
        "Processing dataset... ({} rows x {} columns loaded)",
        util::format_int(rows),
        util::format_int(columns)
    );

    let records = subway_congestion::preprocess(&raw).context("preprocessing failed")?;
    let report = validate::ensure_valid(&records).context("validation failed")?;
    if !report.warnings.is_empty() {
        println!("Note: {} validation warnings (see log).", report.warnings.len());
    }

    loader::save_processed(&cli.artifact, &records)
        .with_context(|| format!("saving {}", cli.artifact.display()))?;
    println!(
        "Saved {} rows to {}\n",
        util::format_int(records.len()),
        cli.artifact.display()
    );
    store(records);
    Ok(())
}

fn load_snapshot(artifact: &Path) -> Result<Arc<Vec<CongestionRecord>>> {
    if let Some(data) = cached() {
        return Ok(data);
    }
    if !artifact.exists() {
        bail!(
            "no processed data at {}. Run option 1 first.",
            artifact.display()
        );
    }
    let data = loader::load_processed(artifact).with_context(|| format!("loading {}", artifact.display()))?;
    Ok(store(data))
}

/// Option [2]: print previews and write every report to `out_dir`.
fn handle_generate_reports(cli: &Cli) -> Result<()> {
    let data = load_snapshot(&cli.artifact)?;
    let dir = &cli.out_dir;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    println!("Generating reports...\n");

    let all = DayFilter::All;
    let weekday = DayFilter::from(WEEKDAY);

    let by_line = query::congestion_by_line(&data);
    output::write_csv(&dir.join("line_summary.csv"), &by_line)?;
    output::preview_table("호선별 평균 혼잡도", None, &by_line, 5);

    let busiest = query::top_stations(&data, 10, false);
    output::write_csv(&dir.join("top_congested.csv"), &busiest)?;
    output::preview_table("혼잡한 역 TOP 10", Some("전체 시간대 평균"), &busiest, 5);

    let quietest = query::top_stations(&data, 10, true);
    output::write_csv(&dir.join("top_relaxed.csv"), &quietest)?;
    output::preview_table("여유로운 역 TOP 10", Some("전체 시간대 평균"), &quietest, 5);

    let day_time = query::congestion_by_day_time(&data);
    output::write_csv(&dir.join("day_time.csv"), &day_time)?;

    let comparison = timeslot::compare_time_slots(&data, "08:00", "18:00", &weekday, 20);
    output::write_csv(&dir.join("compare_0800_1800.csv"), &comparison)?;
    output::preview_table("08:00 vs 18:00", Some("평일, 평균 상위 20개 역"), &comparison, 5);

    let morning = timeslot::time_range_congestion(&data, "07:00", "09:00", &weekday)?;
    output::write_csv(&dir.join("morning_commute.csv"), &morning)?;
    output::preview_table("출근 시간대 (07:00-09:00)", Some("평일"), &morning, 5);

    let stats = query::statistics(&query::filter(&data, &all, &[], None));
    let peak = query::peak_info(&data);
    let pattern = timeslot::peak_hours_pattern(&data, &weekday);
    match &peak {
        Some(p) => println!(
            "Peak {} ({}%), quietest {} ({}%)",
            p.peak_time,
            util::format_number(p.peak_congestion, 1),
            p.quiet_time,
            util::format_number(p.quiet_congestion, 1)
        ),
        None => warn!("no rows to compute peak info"),
    }

    let summary = Summary {
        generated_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        stats: &stats,
        peak: peak.as_ref(),
        weekday_commute: &pattern,
    };
    output::write_json(&dir.join("summary.json"), &summary)?;
    println!(
        "Summary Stats (summary.json): {} rows, {} lines, {} stations, mean {}\n",
        util::format_int(stats.total_rows),
        stats.line_count,
        stats.station_count,
        util::format_number(stats.avg_congestion, 2)
    );
    info!(dir = %dir.display(), "reports written");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        println!("Select an action:");
        println!("[1] Preprocess raw data");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice(&mut input) else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => {
                if let Err(e) = handle_preprocess(&cli) {
                    eprintln!("Error: {:#}\n", e);
                }
            }
            "2" => {
                println!();
                if let Err(e) = handle_generate_reports(&cli) {
                    eprintln!("Error: {:#}\n", e);
                }
                if prompt_back_to_menu(&mut input) != Some(true) {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_input_ends_the_prompts() {
        let mut empty: &[u8] = b"";
        assert_eq!(read_choice(&mut empty), None);
        assert_eq!(prompt_back_to_menu(&mut empty), None);
    }

    #[test]
    fn back_to_menu_reprompts_until_y_or_n() {
        let mut input: &[u8] = b"maybe\n n \n";
        assert_eq!(prompt_back_to_menu(&mut input), Some(false));
        let mut input: &[u8] = b"x\n";
        assert_eq!(prompt_back_to_menu(&mut input), None);
        let mut input: &[u8] = b" 2 \ny\n";
        assert_eq!(read_choice(&mut input).as_deref(), Some("2"));
        assert_eq!(prompt_back_to_menu(&mut input), Some(true));
    }

    #[test]
    fn cached_snapshot_is_shared_not_copied() {
        let stored = store(Vec::new());
        let first = cached().unwrap();
        let second = cached().unwrap();
        assert!(Arc::ptr_eq(&stored, &first));
        assert!(Arc::ptr_eq(&first, &second));
    }
}

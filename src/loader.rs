use crate::error::PipelineError;
use crate::schema::CONGESTION;
use crate::types::{CongestionRecord, RawTable};
use crate::validate::check_columns;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use encoding_rs::{EUC_KR, UTF_8};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Artifact column order, matching the serde renames on [`CongestionRecord`].
pub const ARTIFACT_COLUMNS: [&str; 11] = [
    "요일구분",
    "호선",
    "역번호",
    "역명",
    "방향",
    "시간대",
    "시간_정렬용",
    "혼잡도",
    "혼잡도_레벨",
    "시간대_구분",
    "호선_번호",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode raw file bytes: CP949 first, then UTF-8 with an optional BOM.
/// A leading UTF-8 BOM skips the CP949 attempt, since its bytes happen to
/// form a valid CP949 pair.
pub fn decode_bytes(bytes: &[u8]) -> Option<String> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return UTF_8
            .decode_without_bom_handling_and_without_replacement(rest)
            .map(|s| s.into_owned());
    }
    if let Some(s) = EUC_KR.decode_without_bom_handling_and_without_replacement(bytes) {
        debug!("decoded input as CP949");
        return Some(s.into_owned());
    }
    UTF_8
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|s| s.into_owned())
}

/// Parse delimited text into a raw wide table. Cells are kept verbatim.
pub fn parse_raw(text: &str) -> Result<RawTable, PipelineError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable::new(headers, rows))
}

pub fn load_raw(path: &Path) -> Result<RawTable, PipelineError> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let text = decode_bytes(&bytes).ok_or_else(|| PipelineError::Encoding {
        path: path.to_path_buf(),
    })?;
    let table = parse_raw(&text)?;
    let (rows, columns) = table.shape();
    info!(rows, columns, path = %path.display(), "raw table loaded");
    Ok(table)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_artifact(tmp: &Path, records: &[CongestionRecord]) -> Result<(), PipelineError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(tmp)?;
    wtr.write_record(ARTIFACT_COLUMNS)?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|e| PipelineError::io(tmp, e))
}

/// Persist the enriched table. The file is written next to `path` and
/// renamed into place, so an interrupted write leaves the old artifact.
/// The temporary file is removed when any step fails.
pub fn save_processed(path: &Path, records: &[CongestionRecord]) -> Result<(), PipelineError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }
    let tmp = temp_path(path);
    let written = write_artifact(&tmp, records)
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| PipelineError::io(path, e)));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            debug!(error = %cleanup, path = %tmp.display(), "temporary artifact not removed");
        }
        return Err(e);
    }
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    info!(rows = records.len(), bytes = size, path = %path.display(), "artifact saved");
    Ok(())
}

/// Load a persisted artifact. Any missing artifact column is a schema error
/// and an unparseable occupancy cell is a type error.
pub fn load_processed(path: &Path) -> Result<Vec<CongestionRecord>, PipelineError> {
    let file = fs::File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);
    let headers: StringRecord = rdr.headers()?.clone();
    check_columns(&headers.iter().collect::<Vec<_>>(), &ARTIFACT_COLUMNS)?;
    let congestion_idx = headers.iter().position(|h| h == CONGESTION);

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        if let Some(cell) = congestion_idx.and_then(|i| record.get(i)) {
            if cell.trim().parse::<f64>().is_err() {
                return Err(PipelineError::NonNumericCongestion {
                    detail: format!("row {}: \"{}\"", row + 1, cell),
                });
            }
        }
        records.push(record.deserialize::<CongestionRecord>(Some(&headers))?);
    }
    info!(rows = records.len(), path = %path.display(), "artifact loaded");
    Ok(records)
}

//! CSV report writers for verdicts and per-stage timings.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::PicketError;
use crate::types::{TimingRecord, Verdict};

/// Derive the timing report path from the verdict report path by
/// appending `_timing` to the file stem: `verdicts.csv` becomes
/// `verdicts_timing.csv`.
pub fn timing_report_path(report: &Path) -> PathBuf {
    let stem = report
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}_timing");
    if let Some(ext) = report.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    report.with_file_name(name)
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write the file-name-to-verdict table.
pub fn write_verdicts<W: Write>(mut w: W, verdicts: &[Verdict]) -> io::Result<()> {
    writeln!(w, "file_name,review_message")?;
    for verdict in verdicts {
        writeln!(
            w,
            "{},{}",
            csv_field(&verdict.file_name),
            csv_field(verdict.review_message.as_deref().unwrap_or("")),
        )?;
    }
    Ok(())
}

/// Write the file-name-to-stage-timings table, seconds at millisecond
/// precision.
pub fn write_timings<W: Write>(mut w: W, timings: &[TimingRecord]) -> io::Result<()> {
    writeln!(
        w,
        "file_name,compress_secs,credentials_secs,upload_secs,review_secs,quarantine_secs,total_secs"
    )?;
    for t in timings {
        writeln!(
            w,
            "{},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3}",
            csv_field(&t.file_name),
            t.compress_secs,
            t.credentials_secs,
            t.upload_secs,
            t.review_secs,
            t.quarantine_secs,
            t.total_secs,
        )?;
    }
    Ok(())
}

/// Write both reports to disk. Any failure here is fatal to the run;
/// a scan without its reports has produced nothing.
pub fn write_reports(
    report_path: &Path,
    timing_path: &Path,
    verdicts: &[Verdict],
    timings: &[TimingRecord],
) -> Result<(), PicketError> {
    for path in [report_path, timing_path] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PicketError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
    }

    fn report_err(path: &Path) -> impl FnOnce(io::Error) -> PicketError {
        let path = path.to_path_buf();
        move |e| PicketError::Report { path, source: e }
    }

    let file = File::create(report_path).map_err(report_err(report_path))?;
    let mut writer = BufWriter::new(file);
    write_verdicts(&mut writer, verdicts).map_err(report_err(report_path))?;
    writer.flush().map_err(report_err(report_path))?;

    let file = File::create(timing_path).map_err(report_err(timing_path))?;
    let mut writer = BufWriter::new(file);
    write_timings(&mut writer, timings).map_err(report_err(timing_path))?;
    writer.flush().map_err(report_err(timing_path))?;

    tracing::info!(
        verdicts = %report_path.display(),
        timings = %timing_path.display(),
        "wrote scan reports"
    );
    Ok(())
}

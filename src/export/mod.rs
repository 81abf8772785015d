pub mod format;
pub mod pdf;

use crate::cli::PdfQuality;
use crate::error::Result;
use crate::pipeline::Session;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Report file name derived from an ISO-8601 timestamp, with characters that
/// are unsafe in file names (colons, periods) replaced by hyphens.
pub fn report_file_name(now: DateTime<Local>) -> String {
    let stamp = now.to_rfc3339().replace(':', "-").replace('.', "-");
    format!("check_report_{}.pdf", stamp)
}

fn resolve_output_path(output: &Path) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(report_file_name(Local::now()))
    } else {
        output.to_path_buf()
    }
}

/// Renders the session and writes the PDF. The buffer is assembled fully
/// before the file is created, so a renderer failure leaves nothing behind.
pub fn export_report(
    session: &Session,
    output: &Path,
    title: &str,
    quality: PdfQuality,
) -> Result<PathBuf> {
    let bytes = pdf::render_report(session, title, quality)?;

    let path = resolve_output_path(output);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&path, &bytes)?;

    Ok(path)
}

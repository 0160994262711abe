use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::annotation::AnnotationRecord;
use crate::timecode::format_subtitle_timestamp;

/// Plain-text export flavors for the clipboard payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlainTextMode {
    /// `<time> - <text>` per line, timecode verbatim from the source.
    WithTimestamps,
    /// Text only, one record per line.
    TextOnly,
}

/// Serialize records as a SubRip subtitle document.
///
/// Each record's end time is the next record's start, or `total_duration`
/// for the last one. Empty input produces an empty document. A last record
/// past `total_duration` yields end < start; that is passed through
/// uncorrected rather than second-guessing upstream timing.
pub fn subtitle_document(records: &[AnnotationRecord], total_duration: f64) -> String {
    let mut document = String::new();

    for (i, record) in records.iter().enumerate() {
        let start = record.seconds;
        let end = records
            .get(i + 1)
            .map(|next| next.seconds)
            .unwrap_or(total_duration);

        document.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_subtitle_timestamp(start),
            format_subtitle_timestamp(end),
            record.caption()
        ));
    }

    document
}

/// Serialize records to newline-joined plain text.
pub fn plain_text(records: &[AnnotationRecord], mode: PlainTextMode) -> String {
    records
        .iter()
        .map(|record| match mode {
            PlainTextMode::WithTimestamps => format!("{} - {}", record.time, record.caption()),
            PlainTextMode::TextOnly => record.caption(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write a subtitle document to disk.
pub async fn save_subtitles<P: AsRef<Path>>(
    records: &[AnnotationRecord],
    total_duration: f64,
    path: P,
) -> Result<()> {
    let content = subtitle_document(records, total_duration);
    tokio::fs::write(path.as_ref(), content).await?;
    info!(
        "💾 Wrote {} subtitle blocks to {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Write a plain-text transcript to disk.
pub async fn save_plain_text<P: AsRef<Path>>(
    records: &[AnnotationRecord],
    mode: PlainTextMode,
    path: P,
) -> Result<()> {
    tokio::fs::write(path.as_ref(), plain_text(records, mode)).await?;
    info!("💾 Wrote transcript to {}", path.as_ref().display());
    Ok(())
}

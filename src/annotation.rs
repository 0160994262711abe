use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::timecode::{parse_timecode, TimecodeInput};

/// One timestamped unit of model output.
///
/// The variant is decided once, when a batch is accepted from the annotation
/// source; downstream consumers match on [`AnnotationBody`] instead of
/// re-inspecting field presence. `seconds` caches the parsed timecode so the
/// index never re-parses on lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Timecode exactly as the annotation source produced it.
    pub time: TimecodeInput,
    /// Canonical seconds, parsed once at the entry boundary.
    pub seconds: f64,
    pub body: AnnotationBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationBody {
    Text { text: String },
    Objects { text: String, objects: Vec<String> },
    Value { value: f64 },
}

impl AnnotationRecord {
    pub fn text(time: impl Into<TimecodeInput>, text: impl Into<String>) -> Self {
        Self::with_body(time.into(), AnnotationBody::Text { text: text.into() })
    }

    pub fn objects(
        time: impl Into<TimecodeInput>,
        text: impl Into<String>,
        objects: Vec<String>,
    ) -> Self {
        Self::with_body(
            time.into(),
            AnnotationBody::Objects {
                text: text.into(),
                objects,
            },
        )
    }

    pub fn value(time: impl Into<TimecodeInput>, value: f64) -> Self {
        Self::with_body(time.into(), AnnotationBody::Value { value })
    }

    fn with_body(time: TimecodeInput, body: AnnotationBody) -> Self {
        let seconds = parse_timecode(&time);
        Self {
            time,
            seconds,
            body,
        }
    }

    /// Display text for the caption overlay.
    pub fn caption(&self) -> String {
        match &self.body {
            AnnotationBody::Text { text } => text.clone(),
            AnnotationBody::Objects { text, .. } => text.clone(),
            AnnotationBody::Value { value } => format!("{}", value),
        }
    }
}

/// Record shape as it arrives on the wire from the annotation source.
///
/// Field presence is the discriminant: `objects` wins over plain text, and a
/// `value` with no `text` is a numeric datapoint. Untagged match order
/// matters here.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRecord {
    Objects {
        time: TimecodeInput,
        text: String,
        objects: Vec<String>,
    },
    Text {
        time: TimecodeInput,
        text: String,
    },
    Value {
        time: TimecodeInput,
        value: f64,
    },
}

impl From<RawRecord> for AnnotationRecord {
    fn from(raw: RawRecord) -> Self {
        match raw {
            RawRecord::Objects {
                time,
                text,
                objects,
            } => AnnotationRecord::objects(time, text, objects),
            RawRecord::Text { time, text } => AnnotationRecord::text(time, text),
            RawRecord::Value { time, value } => AnnotationRecord::value(time, value),
        }
    }
}

/// Decode a batch of records from the annotation source's JSON.
///
/// The source is expected to return one ordered batch sorted ascending by
/// time; ordering is the upstream contract and is not re-validated here.
pub fn records_from_value(value: serde_json::Value) -> Result<Vec<AnnotationRecord>> {
    let raw: Vec<RawRecord> = serde_json::from_value(value)
        .map_err(|e| anyhow!("annotation batch did not match any record shape: {}", e))?;
    Ok(raw.into_iter().map(AnnotationRecord::from).collect())
}

/// Time-ordered annotation records with logarithmic active-record lookup.
///
/// Records are replaced wholesale on each successful analysis; the index
/// never mutates or re-sorts the sequence it is handed.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    records: Vec<AnnotationRecord>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held records. Callers supply ascending-sorted input.
    pub fn set_records(&mut self, records: Vec<AnnotationRecord>) {
        self.records = records;
    }

    /// Index of the active record at `position`: the rightmost record with
    /// `seconds <= position`, or `None` if the set is empty or every record
    /// starts later. Runs on every playback tick, so this is a binary
    /// search, not a scan. Coincident timestamps resolve to the last record
    /// at that time.
    pub fn active_index_at(&self, position: f64) -> Option<usize> {
        let upper = self.records.partition_point(|r| r.seconds <= position);
        upper.checked_sub(1)
    }

    /// Active record at `position`, if any.
    pub fn active_record_at(&self, position: f64) -> Option<&AnnotationRecord> {
        self.active_index_at(position)
            .and_then(|i| self.records.get(i))
    }

    /// Positional access, used by marker-click navigation. Markers render in
    /// original sequence order.
    pub fn record_at(&self, index: usize) -> Option<&AnnotationRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

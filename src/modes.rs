use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What record shape a mode asks the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordShape {
    /// `{time, text}` records.
    Text,
    /// `{time, text, objects}` records.
    Objects,
    /// `{time, value}` records.
    Value,
    /// Free-form prose, no timecodes expected.
    FreeText,
}

/// Analysis modes the user can request for an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisMode {
    /// Dense time-stamped captions of everything seen and heard.
    Captions,
    /// Most important moments, short description each.
    KeyMoments,
    /// Captions plus the list of objects visible at each moment.
    Objects,
    /// A numeric reading (e.g. excitement level) sampled over time.
    Chart,
    /// One-paragraph summary, no timecodes.
    Summary,
    /// User-supplied prompt; records expected back as plain captions.
    Custom(String),
}

impl AnalysisMode {
    pub fn label(&self) -> &str {
        match self {
            AnalysisMode::Captions => "captions",
            AnalysisMode::KeyMoments => "key-moments",
            AnalysisMode::Objects => "objects",
            AnalysisMode::Chart => "chart",
            AnalysisMode::Summary => "summary",
            AnalysisMode::Custom(_) => "custom",
        }
    }

    pub fn expects(&self) -> RecordShape {
        match self {
            AnalysisMode::Captions | AnalysisMode::KeyMoments | AnalysisMode::Custom(_) => {
                RecordShape::Text
            }
            AnalysisMode::Objects => RecordShape::Objects,
            AnalysisMode::Chart => RecordShape::Value,
            AnalysisMode::Summary => RecordShape::FreeText,
        }
    }

    /// Prompt sent upstream with the media handle. Each mode asks for exactly
    /// one record shape per batch.
    pub fn prompt(&self) -> String {
        match self {
            AnalysisMode::Captions => {
                "Caption this media. Call set_timecodes once with a dense, \
                 time-ordered list of captions for everything seen and heard."
                    .to_string()
            }
            AnalysisMode::KeyMoments => {
                "Identify the key moments in this media. Call set_timecodes \
                 once with a time-ordered list, one short description each."
                    .to_string()
            }
            AnalysisMode::Objects => {
                "Caption this media and list the objects visible at each \
                 moment. Call set_timecodes_with_objects once with a \
                 time-ordered list."
                    .to_string()
            }
            AnalysisMode::Chart => {
                "Rate the intensity of this media over time on a scale of 1 \
                 to 10. Call set_timecodes_with_numeric_values once with a \
                 time-ordered list of readings."
                    .to_string()
            }
            AnalysisMode::Summary => {
                "Summarize this media in one short paragraph.".to_string()
            }
            AnalysisMode::Custom(prompt) => format!(
                "Call set_timecodes once using the following instructions: {}",
                prompt
            ),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "captions" => Ok(AnalysisMode::Captions),
            "key-moments" => Ok(AnalysisMode::KeyMoments),
            "objects" => Ok(AnalysisMode::Objects),
            "chart" => Ok(AnalysisMode::Chart),
            "summary" => Ok(AnalysisMode::Summary),
            other => Err(format!(
                "unknown mode '{}' (expected captions, key-moments, objects, chart, or summary)",
                other
            )),
        }
    }
}

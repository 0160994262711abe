/// Media Annotator
///
/// Interactive media-annotation core: requests time-stamped annotations of a
/// video or audio file from a generative model, indexes them against the
/// playback timeline, and exports them as subtitles or plain text.

pub mod annotation;
pub mod annotator;
pub mod config;
pub mod export;
pub mod modes;
pub mod player;
pub mod timecode;
pub mod upload;

// Re-export main types for easy access
pub use crate::annotation::{records_from_value, AnnotationBody, AnnotationIndex, AnnotationRecord};
pub use crate::annotator::{
    AnalysisOutcome, AnnotationSession, AnnotationSource, AnnotatorConfig, AnnotatorError,
    GeminiAnnotator, ModelReply,
};
pub use crate::config::{Config, ExportConfig};
pub use crate::export::{plain_text, subtitle_document, PlainTextMode};
pub use crate::modes::{AnalysisMode, RecordShape};
pub use crate::player::{MediaElement, NullMediaElement, PlaybackController, PlaybackPhase};
pub use crate::timecode::{
    format_clock, format_subtitle_timestamp, parse_timecode, parse_timecode_str, TimecodeInput,
};
pub use crate::upload::{FileState, MediaHandle, MediaUploader, UploadConfig};

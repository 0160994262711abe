use tracing::debug;

use crate::annotation::{AnnotationIndex, AnnotationRecord};
use crate::timecode::{parse_timecode, TimecodeInput};

/// Commands the controller issues to the host's playback element.
///
/// The controller never decodes media; it only reacts to the element's
/// signals ([`PlaybackController::load_metadata`],
/// [`PlaybackController::on_position_tick`]) and drives it back through this
/// trait.
pub trait MediaElement: Send {
    fn seek(&mut self, position: f64);
    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);
}

/// No-op element for headless use (CLI, tests).
#[derive(Debug, Default)]
pub struct NullMediaElement;

impl MediaElement for NullMediaElement {
    fn seek(&mut self, _position: f64) {}
    fn set_volume(&mut self, _volume: f64) {}
    fn set_muted(&mut self, _muted: bool) {}
}

/// Playback lifecycle. `Scrubbing` remembers whether to resume playing when
/// the user releases the seek control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Ready,
    Playing,
    Scrubbing { resume_playing: bool },
}

/// Owns playback position state and keeps the displayed caption consistent
/// with the annotation index on every position change.
///
/// Single-threaded and callback-driven: native playback ticks and scrub
/// pointer events both land here, and the scrubbing phase is the sole
/// arbitration between them. Each operation checks and mutates state within
/// one call, so no further locking is needed.
pub struct PlaybackController {
    element: Box<dyn MediaElement>,
    index: AnnotationIndex,
    phase: PlaybackPhase,
    duration: f64,
    position: f64,
    caption: Option<usize>,
    volume: f64,
    muted: bool,
}

impl PlaybackController {
    pub fn new(element: Box<dyn MediaElement>) -> Self {
        Self {
            element,
            index: AnnotationIndex::new(),
            phase: PlaybackPhase::Idle,
            duration: 0.0,
            position: 0.0,
            caption: None,
            volume: 1.0,
            muted: false,
        }
    }

    /// Replace the annotation set wholesale (a new analysis result) and
    /// re-derive the caption at the current position.
    pub fn set_annotations(&mut self, records: Vec<AnnotationRecord>) {
        self.index.set_records(records);
        self.refresh_caption();
    }

    pub fn annotations(&self) -> &AnnotationIndex {
        &self.index
    }

    /// Media metadata arrived: duration is now known.
    pub fn load_metadata(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        if self.phase == PlaybackPhase::Idle {
            self.phase = PlaybackPhase::Ready;
        }
        self.position = self.position.clamp(0.0, self.duration);
        self.refresh_caption();
    }

    /// The media source changed: full reset back to idle.
    pub fn reset_for_new_source(&mut self) {
        self.phase = PlaybackPhase::Idle;
        self.duration = 0.0;
        self.position = 0.0;
        self.caption = None;
        self.index.set_records(Vec::new());
    }

    pub fn toggle_play(&mut self) {
        self.phase = match self.phase {
            PlaybackPhase::Ready => PlaybackPhase::Playing,
            PlaybackPhase::Playing => PlaybackPhase::Ready,
            other => other,
        };
    }

    /// Native playback tick. Ignored while the user is scrubbing, so the
    /// displayed time never fights the pointer.
    pub fn on_position_tick(&mut self, position: f64) {
        match self.phase {
            PlaybackPhase::Idle | PlaybackPhase::Scrubbing { .. } => {}
            PlaybackPhase::Ready | PlaybackPhase::Playing => {
                self.position = position.clamp(0.0, self.duration);
                self.refresh_caption();
            }
        }
    }

    /// User grabbed the seek control. Position updates now come from
    /// [`Self::scrub_to`] until released.
    pub fn begin_scrub(&mut self) {
        if self.phase == PlaybackPhase::Idle {
            return;
        }
        let resume_playing = self.phase == PlaybackPhase::Playing;
        self.phase = PlaybackPhase::Scrubbing { resume_playing };
    }

    /// Pointer moved while scrubbing.
    pub fn scrub_to(&mut self, position: f64) {
        if let PlaybackPhase::Scrubbing { .. } = self.phase {
            self.position = position.clamp(0.0, self.duration);
            self.refresh_caption();
        }
    }

    /// User released the seek control: commit the position to the element
    /// and return to the prior play/pause state.
    pub fn end_scrub(&mut self) {
        if let PlaybackPhase::Scrubbing { resume_playing } = self.phase {
            self.element.seek(self.position);
            self.phase = if resume_playing {
                PlaybackPhase::Playing
            } else {
                PlaybackPhase::Ready
            };
            self.refresh_caption();
        }
    }

    /// Jump to `target` seconds, clamped to the media duration. The caption
    /// updates immediately rather than waiting for the next native tick.
    pub fn seek(&mut self, target: f64) {
        self.position = target.clamp(0.0, self.duration);
        self.element.seek(self.position);
        self.refresh_caption();
        debug!("⏩ Seek to {:.3}s", self.position);
    }

    /// Parse a timecode (marker label, table cell) and seek to it.
    pub fn jump_to_timecode(&mut self, timecode: &TimecodeInput) {
        self.seek(parse_timecode(timecode));
    }

    /// Marker-click navigation: seek to the record at `index` in sequence
    /// order.
    pub fn jump_to_record(&mut self, index: usize) {
        if let Some(seconds) = self.index.record_at(index).map(|r| r.seconds) {
            self.seek(seconds);
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
        self.element.set_volume(self.volume);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.element.set_muted(muted);
    }

    /// Playback progress in `[0, 1]`. Degrades to 0 while duration is
    /// unknown; never divides by zero.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            0.0
        } else {
            self.position / self.duration
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// The record currently showing, if any.
    pub fn caption(&self) -> Option<&AnnotationRecord> {
        self.caption.and_then(|i| self.index.record_at(i))
    }

    fn refresh_caption(&mut self) {
        self.caption = self.index.active_index_at(self.position);
    }
}

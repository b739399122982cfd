use crate::collection::Collection;
use crate::cursor;
use serde::Serialize;
use ts_rs::TS;

/// The title overlay is fully faded by 2% progress.
const INTRO_FADE_RATE: f64 = 50.0;

/// Heads-up display state for the record currently being read.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct HudView {
    pub record_index: Option<usize>,
    pub ordinal: Option<u32>,
    pub label: Option<String>,
    pub group: Option<String>,
    pub progress_pct: f64,
    pub intro_opacity: f64,
}

impl HudView {
    pub fn empty() -> Self {
        Self {
            record_index: None,
            ordinal: None,
            label: None,
            group: None,
            progress_pct: 0.0,
            intro_opacity: 1.0,
        }
    }

    pub fn derive(progress: f64, collection: &Collection) -> Self {
        let progress = if progress.is_finite() { progress } else { 0.0 };
        let record_index = cursor::current_index(progress, collection.len());
        let record = record_index.and_then(|idx| collection.get(idx));
        Self {
            record_index,
            ordinal: record.map(|r| r.ordinal),
            label: record.map(|r| r.label.clone()),
            group: record.map(|r| r.group.clone()),
            progress_pct: progress.clamp(0.0, 1.0) * 100.0,
            intro_opacity: (1.0 - progress * INTRO_FADE_RATE).clamp(0.0, 1.0),
        }
    }

    /// Whether a front end needs to redraw the HUD text.
    pub fn record_changed(&self, other: &HudView) -> bool {
        self.record_index != other.record_index || self.label != other.label
    }
}

//! Per-phase timing record for one session. A record, not a log: later
//! phases overwrite earlier readings, and nothing reads these for control
//! decisions; they exist for the report's processing-journey section.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ModelFetch,
    ImageUpload,
    ImageProcessing,
    LlmProcessing,
    TotalProcessing,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::ModelFetch => "Model Fetch",
            Phase::ImageUpload => "Image Upload",
            Phase::ImageProcessing => "Image Processing",
            Phase::LlmProcessing => "LLM Processing",
            Phase::TotalProcessing => "Total Processing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingTimes {
    pub model_fetch: Option<PhaseTiming>,
    pub image_upload: Option<PhaseTiming>,
    pub image_processing: Option<PhaseTiming>,
    pub llm_processing: Option<PhaseTiming>,
    pub total_processing: Option<PhaseTiming>,
}

impl ProcessingTimes {
    pub fn record(&mut self, phase: Phase, start: DateTime<Local>, end: DateTime<Local>) {
        let timing = PhaseTiming {
            start,
            end,
            duration_ms: (end - start).num_milliseconds(),
        };
        *self.slot(phase) = Some(timing);
    }

    /// For durations reported by the backend rather than measured locally.
    pub fn record_duration(&mut self, phase: Phase, duration_ms: i64) {
        let now = Local::now();
        *self.slot(phase) = Some(PhaseTiming {
            start: now,
            end: now,
            duration_ms,
        });
    }

    fn slot(&mut self, phase: Phase) -> &mut Option<PhaseTiming> {
        match phase {
            Phase::ModelFetch => &mut self.model_fetch,
            Phase::ImageUpload => &mut self.image_upload,
            Phase::ImageProcessing => &mut self.image_processing,
            Phase::LlmProcessing => &mut self.llm_processing,
            Phase::TotalProcessing => &mut self.total_processing,
        }
    }

    /// Recorded phases in fixed display order.
    pub fn entries(&self) -> Vec<(Phase, &PhaseTiming)> {
        [
            (Phase::ModelFetch, &self.model_fetch),
            (Phase::ImageUpload, &self.image_upload),
            (Phase::ImageProcessing, &self.image_processing),
            (Phase::LlmProcessing, &self.llm_processing),
            (Phase::TotalProcessing, &self.total_processing),
        ]
        .into_iter()
        .filter_map(|(phase, slot)| slot.as_ref().map(|t| (phase, t)))
        .collect()
    }
}

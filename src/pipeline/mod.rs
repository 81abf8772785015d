//! Upload pipeline and result aggregator.
//!
//! One batch is one user-initiated operation over one or more images. Images
//! are pushed through the backend with a bounded, order-preserving
//! concurrency limit (default 1, i.e. strictly sequential); a failed image
//! surfaces as the session's current error but neither aborts the batch nor
//! drops results already collected. There is no cancellation: a started
//! batch runs to completion.

pub mod timing;

pub use timing::{Phase, PhaseTiming, ProcessingTimes};

use crate::api::{BackendClient, LLMAnalysis};
use crate::error::{CheckAiError, ProcessingError, Result};
use crate::scanner::ImageInfo;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};

/// Everything the report needs about one processed image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub file_name: String,
    /// Data URL of the uploaded image, kept for embedding into the report.
    pub image_src: String,
    pub ocr_tesseract: Option<String>,
    pub ocr_easyocr: Option<String>,
    pub llm_analyses: Vec<LLMAnalysis>,
}

/// Ordered, append-only collection of results for the current batch, plus
/// the single surfaced error and the timing record. Fully reset when a new
/// batch begins; no deduplication, identity is array position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub results: Vec<CheckResult>,
    pub error: Option<ProcessingError>,
    pub times: ProcessingTimes,
}

impl Session {
    /// Starting a new operation clears previous results and the previous
    /// error. An error recorded during a batch persists after the batch
    /// until the next call to this.
    pub fn begin_batch(&mut self) {
        self.results.clear();
        self.error = None;
    }

    /// Last error wins.
    pub fn record_error(&mut self, err: &CheckAiError) {
        self.error = Some(ProcessingError::from(err));
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }
}

/// Phase spans measured inside `submit_image`, applied to the session's
/// timing record by the batch driver.
#[derive(Debug, Clone)]
pub struct SubmitTimings {
    pub upload: (DateTime<Local>, DateTime<Local>),
    pub processing: (DateTime<Local>, DateTime<Local>),
    pub llm_ms: Option<i64>,
}

impl SubmitTimings {
    pub fn apply(&self, times: &mut ProcessingTimes) {
        times.record(Phase::ImageUpload, self.upload.0, self.upload.1);
        times.record(Phase::ImageProcessing, self.processing.0, self.processing.1);
        if let Some(ms) = self.llm_ms {
            times.record_duration(Phase::LlmProcessing, ms);
        }
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Submits a single check image. Rejects an empty model selection before
/// touching the disk or the network.
pub async fn submit_image(
    client: &BackendClient,
    image: &ImageInfo,
    selected_models: &[String],
) -> Result<(CheckResult, SubmitTimings)> {
    if selected_models.is_empty() {
        return Err(CheckAiError::Setup(
            "no model selected; pick at least one model before uploading".into(),
        ));
    }

    let upload_start = Local::now();
    let bytes = tokio::fs::read(&image.path).await.map_err(|e| {
        CheckAiError::ImageUpload(format!("failed to read {}: {}", image.path.display(), e))
    })?;
    let image_src = encode_data_url(image.mime_type(), &bytes);
    let upload_end = Local::now();

    let processing_start = Local::now();
    let response = client
        .analyze_check(&image.file_name, bytes, image.mime_type(), selected_models)
        .await?;
    let processing_end = Local::now();

    let timings = SubmitTimings {
        upload: (upload_start, upload_end),
        processing: (processing_start, processing_end),
        llm_ms: response.processing_time.map(|secs| (secs * 1000.0) as i64),
    };

    let result = CheckResult {
        file_name: image.file_name.clone(),
        image_src,
        ocr_tesseract: response.raw_ocr_tesseract,
        ocr_easyocr: response.raw_ocr_easyocr,
        llm_analyses: response.llm_analyses,
    };

    Ok((result, timings))
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// In-flight request limit; 1 reproduces the strictly sequential loop.
    pub concurrency: usize,
    pub verbose: bool,
    pub progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            verbose: false,
            progress: false,
        }
    }
}

/// Runs a batch. Per-image failures are recorded into the session (last one
/// wins) without stopping later images; the returned error is only for
/// conditions that prevent the batch from running at all.
pub async fn process_batch(
    client: &BackendClient,
    images: &[ImageInfo],
    selected_models: &[String],
    session: &mut Session,
    options: &BatchOptions,
) -> Result<()> {
    session.begin_batch();

    if selected_models.is_empty() {
        let err = CheckAiError::Setup(
            "no model selected; pick at least one model before uploading".into(),
        );
        session.record_error(&err);
        return Err(err);
    }

    let progress = if options.progress {
        ProgressBar::new(images.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let batch_start = Local::now();
    let concurrency = options.concurrency.max(1);

    let mut outcomes = stream::iter(
        images
            .iter()
            .map(|image| async move { (image, submit_image(client, image, selected_models).await) }),
    )
    .buffered(concurrency);

    while let Some((image, outcome)) = outcomes.next().await {
        match outcome {
            Ok((result, timings)) => {
                timings.apply(&mut session.times);
                if options.verbose {
                    progress.println(format!(
                        "  ✔ {} ({} model analyses)",
                        image.file_name,
                        result.llm_analyses.len()
                    ));
                }
                session.push(result);
            }
            Err(err) => {
                progress.println(format!("  ❌ {}: {}", image.file_name, err));
                session.record_error(&err);
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    session
        .times
        .record(Phase::TotalProcessing, batch_start, Local::now());

    Ok(())
}

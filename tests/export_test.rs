//! PDF report generation tests.

use check_ai_rust::api::{CheckDetails, CheckSide, LLMAnalysis};
use check_ai_rust::cli::PdfQuality;
use check_ai_rust::export;
use check_ai_rust::pipeline::{CheckResult, Phase, ProcessingTimes, Session};
use chrono::Local;
use serde_json::Value;
use tempfile::tempdir;

/// 1x1 PNG data URL, standing in for a scanned check.
const PNG_1X1_DATA_URL: &str =
    "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

fn analysis_fixture(model: &str) -> LLMAnalysis {
    let mut details = CheckDetails {
        iban: Some("TR330006100519786457841326".into()),
        receiver: Some("Jane Doe".into()),
        amount_number: Some(Value::from(1500.5)),
        amount_text: Some("one thousand five hundred".into()),
        date: Some("2026-03-01".into()),
        bank_name: Some("Ziraat".into()),
        side: Some(CheckSide::Front),
        ..Default::default()
    };
    details.extra.insert("branch_code".into(), Value::from("0042"));

    LLMAnalysis {
        model_name: model.to_string(),
        analysis: Some(details),
        error: None,
    }
}

fn result_fixture(index: usize) -> CheckResult {
    CheckResult {
        file_name: format!("check_{}.png", index),
        image_src: PNG_1X1_DATA_URL.to_string(),
        ocr_tesseract: Some("ZIRAAT BANKASI\nTL 1.500,50\nJane Doe".to_string()),
        ocr_easyocr: Some("ZIRAAT BANKASI TL 1500,50".to_string()),
        llm_analyses: vec![
            analysis_fixture("mistral:7b"),
            LLMAnalysis {
                model_name: "llama2:7b".into(),
                analysis: None,
                error: Some("Request timeout".into()),
            },
        ],
    }
}

fn session_fixture(count: usize) -> Session {
    let mut times = ProcessingTimes::default();
    let now = Local::now();
    times.record(Phase::ImageUpload, now, now);
    times.record(Phase::ImageProcessing, now, now);
    times.record(Phase::TotalProcessing, now, now);

    Session {
        results: (1..=count).map(result_fixture).collect(),
        error: None,
        times,
    }
}

#[test]
fn report_is_written_and_non_empty() {
    let dir = tempdir().expect("tempdir");
    let session = session_fixture(3);

    let path = export::export_report(
        &session,
        dir.path(),
        "Check Analysis Report",
        PdfQuality::Medium,
    )
    .expect("report generation");

    assert!(path.exists(), "report file missing");
    let bytes = std::fs::read(&path).expect("read report");
    assert!(bytes.len() > 0, "report is empty");
    assert!(bytes.starts_with(b"%PDF"), "not a PDF header");

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("check_report_"));
    assert!(name.ends_with(".pdf"));
}

#[test]
fn empty_session_still_renders() {
    let dir = tempdir().expect("tempdir");
    let session = Session::default();

    let path = export::export_report(&session, dir.path(), "Empty", PdfQuality::Medium)
        .expect("empty report");
    assert!(path.exists());
}

#[test]
fn long_ocr_text_paginates_without_error() {
    let dir = tempdir().expect("tempdir");
    let mut session = session_fixture(1);
    let long_text = "HESAP NO 123456 TUTAR 1.500,50 TL KESIDE TARIHI 01/03/2026\n".repeat(200);
    session.results[0].ocr_tesseract = Some(long_text);

    let path = export::export_report(&session, dir.path(), "Long OCR", PdfQuality::Low)
        .expect("multi-page report");
    let bytes = std::fs::read(&path).expect("read report");
    assert!(bytes.len() > 0);
}

#[test]
fn all_quality_presets_render() {
    let dir = tempdir().expect("tempdir");
    let session = session_fixture(1);

    for quality in [PdfQuality::Low, PdfQuality::Medium, PdfQuality::High] {
        let out = dir.path().join(format!("report_{:?}.pdf", quality));
        let path = export::export_report(&session, &out, "Quality", quality)
            .unwrap_or_else(|e| panic!("quality {:?} failed: {:?}", quality, e));
        assert!(path.exists(), "missing output for {:?}", quality);
    }
}

#[test]
fn broken_image_src_fails_without_leaving_a_file() {
    let dir = tempdir().expect("tempdir");
    let mut session = session_fixture(1);
    session.results[0].image_src = "data:image/png;base64,not-base64!!!".to_string();

    let result = export::export_report(&session, dir.path(), "Broken", PdfQuality::Medium);
    assert!(result.is_err());

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .collect();
    assert!(leftovers.is_empty(), "partial file left behind");
}

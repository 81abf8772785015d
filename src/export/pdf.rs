//! Paginated PDF report: cover, processing journey, check image, raw OCR
//! blocks, and one subsection per model analysis.
//!
//! Layout is a running vertical cursor with greedy forward-fill: before a
//! block of estimated height is placed, a single look-ahead check decides
//! whether it still fits above the bottom margin, and starts a new page if
//! not. No multi-block look-ahead, no balancing across pages.

use crate::api::{CheckSide, LLMAnalysis};
use crate::cli::PdfQuality;
use crate::error::{CheckAiError, Result};
use crate::export::format::{coerce_value, format_key};
use crate::pipeline::Session;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Local;
use printpdf::image_crate;
use printpdf::image_crate::codecs::jpeg::{JpegDecoder, JpegEncoder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Rgb,
};
use std::io::Cursor;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const IMAGE_DPI: f32 = 300.0;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const SUBHEAD_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const SMALL_SIZE: f32 = 9.0;

const PT_TO_MM: f32 = 0.352_778;

const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const GRAY: (f32, f32, f32) = (0.45, 0.45, 0.45);
const ATTENTION_RED: (f32, f32, f32) = (0.80, 0.15, 0.15);

/// Raw OCR blocks are independently truncated before wrapping.
const MAX_OCR_CHARS: usize = 4000;

/// The pagination rule, separated from drawing so it can be tested on bare
/// block heights. The cursor `y` is measured from the top edge in mm.
#[derive(Debug, Clone)]
pub struct Paginator {
    y: f32,
    page_height: f32,
    margin: f32,
    pages: usize,
}

impl Paginator {
    pub fn new(page_height: f32, margin: f32) -> Self {
        Self {
            y: margin,
            page_height,
            margin,
            pages: 1,
        }
    }

    /// Look-ahead of exactly one block: breaks the page iff the block's
    /// bottom edge would pass `page_height - margin`. Returns whether a
    /// break happened.
    pub fn ensure(&mut self, block_height: f32) -> bool {
        if self.y + block_height > self.page_height - self.margin {
            self.pages += 1;
            self.y = self.margin;
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, height: f32) {
        self.y += height;
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn pages(&self) -> usize {
        self.pages
    }
}

fn line_height(font_size: f32) -> f32 {
    font_size * PT_TO_MM * 1.45
}

/// Character budget per wrapped line at the given size, from the average
/// Helvetica glyph advance. An estimate, but a stable one.
fn max_chars(font_size: f32) -> usize {
    ((CONTENT_WIDTH_MM / (font_size * PT_TO_MM * 0.52)) as usize).max(16)
}

/// Word wrap with hard breaks for words longer than the budget. Existing
/// newlines are respected.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        if raw_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                for chunk in chars.chunks(max_chars) {
                    lines.push(chunk.iter().collect());
                }
                continue;
            }

            let needed = if current.is_empty() { word_len } else { word_len + 1 };
            if current.chars().count() + needed > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

fn parse_data_url(data_url: &str) -> Result<Vec<u8>> {
    let payload = data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .unwrap_or(data_url);
    BASE64
        .decode(payload)
        .map_err(|e| CheckAiError::PdfGeneration(format!("invalid image data URL: {}", e)))
}

/// Prepared content of one per-model subsection.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSection {
    pub model_name: String,
    pub error: Option<String>,
    pub has_analysis: bool,
    pub side: Option<CheckSide>,
    /// `(formatted key, coerced value)` for every non-null, non-empty field.
    pub fields: Vec<(String, String)>,
}

/// Maps one `LLMAnalysis` onto its rendered lines. A per-model error is
/// partial-success data, not a pipeline failure; it renders inline. The
/// both-none case renders as "no data", distinct from an error.
pub fn build_model_section(analysis: &LLMAnalysis) -> ModelSection {
    if let Some(error) = &analysis.error {
        return ModelSection {
            model_name: analysis.model_name.clone(),
            error: Some(error.clone()),
            has_analysis: false,
            side: None,
            fields: Vec::new(),
        };
    }

    match &analysis.analysis {
        None => ModelSection {
            model_name: analysis.model_name.clone(),
            error: None,
            has_analysis: false,
            side: None,
            fields: Vec::new(),
        },
        Some(details) => {
            let side = details.side.filter(|s| *s != CheckSide::Unknown);
            let fields = details
                .display_fields()
                .into_iter()
                .filter_map(|(key, value)| {
                    coerce_value(&value).map(|rendered| (format_key(&key), rendered))
                })
                .collect();

            ModelSection {
                model_name: analysis.model_name.clone(),
                error: None,
                has_analysis: true,
                side,
                fields,
            }
        }
    }
}

struct ReportWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    pager: Paginator,
    font: IndirectFontRef,
    bold: IndirectFontRef,
}

impl ReportWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| CheckAiError::PdfGeneration(format!("font error: {:?}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| CheckAiError::PdfGeneration(format!("font error: {:?}", e)))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            pager: Paginator::new(PAGE_HEIGHT_MM, MARGIN_MM),
            font,
            bold,
        })
    }

    fn break_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
    }

    fn ensure(&mut self, block_height: f32) {
        if self.pager.ensure(block_height) {
            self.break_page();
        }
    }

    fn set_color(&self, (r, g, b): (f32, f32, f32)) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.line_colored(text, size, bold, BLACK);
    }

    fn line_colored(&mut self, text: &str, size: f32, bold: bool, color: (f32, f32, f32)) {
        let height = line_height(size);
        self.ensure(height);
        self.set_color(color);

        let baseline = PAGE_HEIGHT_MM - self.pager.y() - height * 0.75;
        let font = if bold { &self.bold } else { &self.font };
        self.layer.use_text(text, size, Mm(MARGIN_MM), Mm(baseline), font);

        if color != BLACK {
            self.set_color(BLACK);
        }
        self.pager.advance(height);
    }

    fn wrapped(&mut self, text: &str, size: f32) {
        for line in wrap_text(text, max_chars(size)) {
            self.line(&line, size, false);
        }
    }

    fn gap(&mut self, height: f32) {
        self.pager.advance(height);
    }

    /// Embeds a data-URL image scaled to the content width, preserving
    /// aspect ratio, capped so it always fits a single page.
    fn image_block(&mut self, image_src: &str, quality: PdfQuality) -> Result<()> {
        let bytes = parse_data_url(image_src)?;
        let decoded = image_crate::load_from_memory(&bytes)
            .map_err(|e| CheckAiError::PdfGeneration(format!("image decode failed: {}", e)))?;

        let mut rgb = decoded.to_rgb8();
        if rgb.width() > quality.max_width() {
            rgb = image_crate::DynamicImage::ImageRgb8(rgb)
                .resize(
                    quality.max_width(),
                    u32::MAX,
                    image_crate::imageops::FilterType::Triangle,
                )
                .to_rgb8();
        }
        let (px_w, px_h) = rgb.dimensions();

        // Re-encode so the PDF carries a DCT stream at the preset quality
        // instead of raw pixels.
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality.jpeg_quality())
            .encode_image(&rgb)
            .map_err(|e| CheckAiError::PdfGeneration(format!("image encode failed: {}", e)))?;
        let decoder = JpegDecoder::new(Cursor::new(jpeg.as_slice()))
            .map_err(|e| CheckAiError::PdfGeneration(format!("image re-read failed: {}", e)))?;
        let pdf_image = Image::try_from(decoder)
            .map_err(|e| CheckAiError::PdfGeneration(format!("image embed failed: {:?}", e)))?;

        let natural_w_mm = px_w as f32 * 25.4 / IMAGE_DPI;
        let natural_h_mm = px_h as f32 * 25.4 / IMAGE_DPI;
        let max_h_mm = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM - 10.0;
        let scale = (CONTENT_WIDTH_MM / natural_w_mm).min(max_h_mm / natural_h_mm);
        let height_mm = natural_h_mm * scale;

        self.ensure(height_mm);
        let translate_y = PAGE_HEIGHT_MM - self.pager.y() - height_mm;
        pdf_image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_MM)),
                translate_y: Some(Mm(translate_y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        self.pager.advance(height_mm + 3.0);

        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| CheckAiError::PdfGeneration(format!("PDF save failed: {:?}", e)))
    }
}

fn render_model_section(writer: &mut ReportWriter, analysis: &LLMAnalysis) {
    let section = build_model_section(analysis);

    writer.line(&format!("Model: {}", section.model_name), SUBHEAD_SIZE, true);

    if let Some(error) = &section.error {
        for line in wrap_text(&format!("Error: {}", error), max_chars(BODY_SIZE)) {
            writer.line_colored(&line, BODY_SIZE, false, ATTENTION_RED);
        }
    } else if !section.has_analysis {
        writer.line_colored("No analysis returned.", BODY_SIZE, false, GRAY);
    } else {
        if let Some(side) = section.side {
            writer.line(&format!("Detected side: {}", side), BODY_SIZE, false);
        }
        if section.fields.is_empty() {
            writer.line_colored("No fields extracted.", BODY_SIZE, false, GRAY);
        }
        for (key, value) in &section.fields {
            writer.wrapped(&format!("{}: {}", key, value), BODY_SIZE);
        }
    }

    writer.gap(3.0);
}

/// Serializes the whole session into a paginated PDF and returns the bytes.
/// Nothing is written to disk here, so a failure cannot leave a partial
/// file behind.
pub fn render_report(session: &Session, title: &str, quality: PdfQuality) -> Result<Vec<u8>> {
    let mut writer = ReportWriter::new(title)?;

    // 1. Title and generation timestamp.
    writer.line(title, TITLE_SIZE, true);
    writer.line_colored(
        &format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        SMALL_SIZE,
        false,
        GRAY,
    );
    writer.gap(5.0);

    // 2. Processing journey.
    let entries = session.times.entries();
    if !entries.is_empty() {
        writer.line("Processing Journey", HEADING_SIZE, true);
        for (phase, timing) in entries {
            writer.line(
                &format!(
                    "{}: {:.2} s",
                    phase.label(),
                    timing.duration_ms as f64 / 1000.0
                ),
                BODY_SIZE,
                false,
            );
        }
        writer.gap(5.0);
    }

    if session.results.is_empty() {
        writer.line("No results in this session.", BODY_SIZE, false);
        return writer.finish();
    }

    for (index, result) in session.results.iter().enumerate() {
        writer.line(
            &format!("Check {}: {}", index + 1, result.file_name),
            HEADING_SIZE,
            true,
        );
        writer.gap(2.0);

        // 3. The check image itself.
        writer.image_block(&result.image_src, quality)?;

        // 4. Raw OCR output, one block per engine.
        let ocr_blocks = [
            ("Tesseract", &result.ocr_tesseract),
            ("EasyOCR", &result.ocr_easyocr),
        ];
        for (engine, text) in ocr_blocks {
            if let Some(text) = text {
                if !text.trim().is_empty() {
                    writer.line(&format!("Raw OCR ({})", engine), SUBHEAD_SIZE, true);
                    writer.wrapped(&truncate_chars(text, MAX_OCR_CHARS), SMALL_SIZE);
                    writer.gap(3.0);
                }
            }
        }

        // 5. Per-model analyses.
        for analysis in &result.llm_analyses {
            render_model_section(&mut writer, analysis);
        }

        writer.gap(4.0);
    }

    writer.finish()
}

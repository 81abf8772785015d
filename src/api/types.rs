use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A model known to the local Ollama instance, as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    /// Parameter metadata (family, quantization, ...); advisory, shape varies
    /// between Ollama versions.
    #[serde(default)]
    pub details: Option<Value>,
}

/// Which side of the check the model believes it is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CheckSide {
    Front,
    Back,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for CheckSide {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Backend wording is advisory; unrecognized values degrade to Unknown.
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::to_lowercase).as_deref() {
            Some("front") => CheckSide::Front,
            Some("back") => CheckSide::Back,
            _ => CheckSide::Unknown,
        })
    }
}

impl std::fmt::Display for CheckSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckSide::Front => write!(f, "Front"),
            CheckSide::Back => write!(f, "Back"),
            CheckSide::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Structured extraction result for one check. The schema is advisory: any
/// field may be absent or null, and models are free to invent extra keys,
/// which land in `extra` and are displayed like the known ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,

    #[serde(default, alias = "account_holder", skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,

    // Amounts and check numbers arrive as strings or bare numbers depending
    // on the model, so they stay untyped until display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_number: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_number: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<CheckSide>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CheckDetails {
    /// Known fields in display order, then extra keys in name order. Values
    /// are raw JSON; null and empty entries are dropped by the renderer's
    /// coercion step. `side` is excluded here and called out separately.
    pub fn display_fields(&self) -> Vec<(String, Value)> {
        let mut fields = Vec::new();

        let string_fields = [
            ("iban", &self.iban),
            ("receiver", &self.receiver),
        ];
        for (key, value) in string_fields {
            if let Some(v) = value {
                fields.push((key.to_string(), Value::String(v.clone())));
            }
        }
        if let Some(v) = &self.amount_number {
            fields.push(("amount_number".to_string(), v.clone()));
        }
        if let Some(v) = &self.amount_text {
            fields.push(("amount_text".to_string(), Value::String(v.clone())));
        }
        if let Some(v) = &self.check_number {
            fields.push(("check_number".to_string(), v.clone()));
        }
        if let Some(v) = &self.date {
            fields.push(("date".to_string(), Value::String(v.clone())));
        }
        if let Some(v) = &self.bank_name {
            fields.push(("bank_name".to_string(), Value::String(v.clone())));
        }
        for (key, value) in &self.extra {
            fields.push((key.clone(), value.clone()));
        }

        fields
    }
}

/// One model's verdict. `analysis` and `error` are each optional; both-none
/// is a valid "no data" state distinct from a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMAnalysis {
    pub model_name: String,
    #[serde(default)]
    pub analysis: Option<CheckDetails>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response body of `POST /api/ocr-check`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckAnalysisResponse {
    #[serde(default)]
    pub raw_ocr_tesseract: Option<String>,
    #[serde(default)]
    pub raw_ocr_easyocr: Option<String>,
    #[serde(default)]
    pub llm_analyses: Vec<LLMAnalysis>,
    /// Seconds spent on the backend, LLM phase included.
    #[serde(default)]
    pub processing_time: Option<f64>,
}

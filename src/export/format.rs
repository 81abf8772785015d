//! Display formatting for analysis fields.

use serde_json::Value;

/// Turns a raw field key into its report label. "iban" in any casing becomes
/// "IBAN"; otherwise a space is inserted before each internal capital,
/// underscores become spaces, and every word is capitalized.
pub fn format_key(key: &str) -> String {
    if key.eq_ignore_ascii_case("iban") {
        return "IBAN".to_string();
    }

    let mut spaced = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch == '_' {
            spaced.push(' ');
        } else {
            if ch.is_uppercase() && i > 0 {
                spaced.push(' ');
            }
            spaced.push(ch);
        }
    }

    spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// String coercion for display. Null and blank strings mean "not extracted"
/// and yield None; everything else renders, non-strings as compact JSON.
pub fn coerce_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            if s.trim().is_empty() {
                None
            } else {
                Some(s.clone())
            }
        }
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_key_handles_known_field_names() {
        assert_eq!(format_key("amount_number"), "Amount Number");
        assert_eq!(format_key("iban"), "IBAN");
        assert_eq!(format_key("IBAN"), "IBAN");
        assert_eq!(format_key("checkNumber"), "Check Number");
    }

    #[test]
    fn format_key_trims_and_collapses_separators() {
        assert_eq!(format_key("bank_name"), "Bank Name");
        assert_eq!(format_key("_bank__name_"), "Bank Name");
        assert_eq!(format_key("amount_text"), "Amount Text");
        assert_eq!(format_key("date"), "Date");
    }

    #[test]
    fn format_key_is_idempotent_on_its_own_output() {
        let once = format_key("amount_number");
        assert_eq!(format_key(&once), "Amount Number");
    }

    #[test]
    fn coerce_value_drops_null_and_blank() {
        assert_eq!(coerce_value(&Value::Null), None);
        assert_eq!(coerce_value(&json!("")), None);
        assert_eq!(coerce_value(&json!("   ")), None);
    }

    #[test]
    fn coerce_value_stringifies_non_strings() {
        assert_eq!(coerce_value(&json!("TR33")), Some("TR33".to_string()));
        assert_eq!(coerce_value(&json!(1500.5)), Some("1500.5".to_string()));
        assert_eq!(coerce_value(&json!(778)), Some("778".to_string()));
        assert_eq!(coerce_value(&json!(true)), Some("true".to_string()));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One OCR'd document as returned by the document OCR service: an ordered
/// sequence of pages. Only the per-page `text` is consumed here; everything
/// else the service reports is kept verbatim so a cached result decodes back
/// to the same payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    #[serde(default)]
    pub pages: Vec<OcrPage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrPage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OcrResult {
    /// Concatenates the present, non-empty page texts with single spaces.
    /// A result without usable pages yields an empty string, which callers
    /// treat as a likely OCR failure.
    pub fn joined_text(&self) -> String {
        self.pages
            .iter()
            .filter_map(|page| page.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joined_text_skips_absent_pages() {
        let result: OcrResult = serde_json::from_value(json!({
            "pages": [
                { "text": "first page" },
                { "confidence": 0.4 },
                { "text": "  " },
                { "text": "second page" },
            ]
        }))
        .unwrap();
        assert_eq!(result.joined_text(), "first page second page");
    }

    #[test]
    fn empty_result_joins_to_empty_string() {
        assert_eq!(OcrResult::default().joined_text(), "");
    }

    #[test]
    fn unknown_metadata_survives_a_roundtrip() {
        let payload = json!({
            "api_version": "1.1",
            "pages": [ { "text": "hello", "width": 612, "height": 792 } ]
        });
        let result: OcrResult = serde_json::from_value(payload.clone()).unwrap();
        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["api_version"], "1.1");
        assert_eq!(back["pages"][0]["width"], 612);
    }
}

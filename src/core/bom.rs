//! Bill of materials model and the manual-entry parser.
//!
//! When the AI gateway is unavailable the bill of materials can be pasted as
//! JSON text. The parser checks the same schema the gateway enforces and
//! reports a tagged error instead of leaking raw parser failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One line entry of a bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomItem {
    pub item: String,
    pub quantity: u32,
    pub description: String,
    pub vendor: String,
}

/// Errors from parsing manually entered bill-of-materials text.
#[derive(Debug, Error)]
pub enum BomParseError {
    /// The text is not valid JSON at all.
    #[error("invalid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Valid JSON, but the top level is not an array.
    #[error("invalid format: expected a JSON array of material items")]
    NotAnArray,

    /// One entry does not match the item schema.
    #[error("material item {index} is malformed: {source}")]
    BadItem {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse manual bill-of-materials text into item records.
///
/// Every entry must carry `item`, `quantity`, `description` and `vendor`
/// with the right types; `quantity` must be a non-negative integer.
pub fn parse_bom_json(text: &str) -> Result<Vec<BomItem>, BomParseError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(BomParseError::Syntax)?;

    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        _ => return Err(BomParseError::NotAnArray),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).map_err(|source| BomParseError::BadItem { index, source })
        })
        .collect()
}

/// Render items as the indented JSON shown in the manual-entry editor.
pub fn to_editable_json(items: &[BomItem]) -> String {
    serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
}

/// Flatten items into the one-per-line form used in the order-sheet prompt.
pub fn to_prompt_lines(items: &[BomItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- {} (Qty: {}): {} [Vendor: {}]",
                item.item, item.quantity, item.description, item.vendor
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_well_formed_array() {
        let text = r#"[{"item":"Panel","quantity":10,"description":"400W mono","vendor":"Acme"}]"#;
        let items = parse_bom_json(text).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item, "Panel");
        assert_eq!(items[0].quantity, 10);
        assert_eq!(items[0].vendor, "Acme");
    }

    #[test]
    fn test_parse_rejects_top_level_object() {
        let err = parse_bom_json(r#"{"item":"x"}"#).unwrap_err();
        assert!(matches!(err, BomParseError::NotAnArray));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = parse_bom_json("not json").unwrap_err();
        assert!(matches!(err, BomParseError::Syntax(_)));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let text = r#"[{"item":"Panel","quantity":10,"description":"400W mono"}]"#;
        let err = parse_bom_json(text).unwrap_err();
        assert!(matches!(err, BomParseError::BadItem { index: 0, .. }));
    }

    #[test]
    fn test_parse_rejects_non_integer_quantity() {
        let text =
            r#"[{"item":"Panel","quantity":"ten","description":"400W mono","vendor":"Acme"}]"#;
        let err = parse_bom_json(text).unwrap_err();
        assert!(matches!(err, BomParseError::BadItem { index: 0, .. }));
    }

    #[test]
    fn test_prompt_lines_format() {
        let items = vec![BomItem {
            item: "Inverter".to_string(),
            quantity: 1,
            description: "8kW hybrid".to_string(),
            vendor: "VoltCo".to_string(),
        }];

        assert_eq!(to_prompt_lines(&items), "- Inverter (Qty: 1): 8kW hybrid [Vendor: VoltCo]");
    }

    #[test]
    fn test_editable_json_round_trips() {
        let items = vec![BomItem {
            item: "Racking rail".to_string(),
            quantity: 12,
            description: "4m anodized".to_string(),
            vendor: "RoofWorks".to_string(),
        }];

        let parsed = parse_bom_json(&to_editable_json(&items)).unwrap();
        assert_eq!(parsed, items);
    }
}

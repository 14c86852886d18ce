use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::prediction::{LabeledPrediction, interpret_prediction};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub name: String,
    pub url: String,
    pub binary: LabeledPrediction,
    pub multiclass: LabeledPrediction,
}

#[derive(Debug, Deserialize)]
struct RawHistoryEntry {
    #[serde(default)]
    url: String,
    #[serde(default)]
    prediction: String,
}

#[derive(Debug, Deserialize)]
struct StoredPrediction {
    #[serde(default)]
    binary: Vec<f64>,
    #[serde(default)]
    multiclass: Vec<f64>,
}

/// The server stores predictions as a Python dict repr, e.g.
/// `{'binary': [0.1, 0.9], 'multiclass': [...]}`. Swapping the quotes makes it JSON.
pub fn repair_prediction_literal(raw: &str) -> String {
    raw.replace('\'', "\"")
}

pub fn parse_stored_prediction(raw: &str) -> Result<(LabeledPrediction, LabeledPrediction)> {
    let repaired = repair_prediction_literal(raw);
    let stored: StoredPrediction =
        serde_json::from_str(repaired.trim()).context("invalid stored prediction")?;
    Ok((
        interpret_prediction(&stored.binary),
        interpret_prediction(&stored.multiclass),
    ))
}

/// Decodes the `images` mapping of a history response, ordered by image name.
/// Entries with an unreadable prediction are dropped.
pub fn parse_history_images(images: &Value) -> Result<Vec<HistoryEntry>> {
    if images.is_null() {
        return Ok(Vec::new());
    }
    let raw: BTreeMap<String, RawHistoryEntry> =
        serde_json::from_value(images.clone()).context("invalid history images")?;

    let mut entries = Vec::with_capacity(raw.len());
    for (name, item) in raw {
        match parse_stored_prediction(&item.prediction) {
            Ok((binary, multiclass)) => entries.push(HistoryEntry {
                name,
                url: item.url,
                binary,
                multiclass,
            }),
            Err(err) => tracing::warn!(%name, error = %err, "skipping history entry"),
        }
    }
    Ok(entries)
}

/// Full history response body (`{"result": ..., "images": {...}}`).
pub fn parse_history_json(raw: &str) -> Result<Vec<HistoryEntry>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid history json")?;
    parse_history_images(root.get("images").unwrap_or(&Value::Null))
}

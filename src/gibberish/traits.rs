// Optional ML stage for the gibberish classifier (C4). Absent when no
// model directory is configured, or when loading the local ONNX model
// fails — either way C4 falls back to rule + statistical stages only
// (fail-open; a missing classifier never blocks otherwise-valid content).

use anyhow::Result;
use async_trait::async_trait;

/// Confidence that `text` belongs to the "gibberish" label, in `[0, 1]`.
#[async_trait]
pub trait GibberishModel: Send + Sync {
    async fn gibberish_confidence(&self, text: &str) -> Result<f64>;
}

// Local ONNX gibberish classifier, feature-gated behind `ml-classifier`.
//
// A single-label sequence classifier run through ort, with tokenization and
// inference offloaded to spawn_blocking so the async runtime stays
// responsive. Absent this feature, or when the model directory is missing,
// C4 runs rule and statistical stages only.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::traits::GibberishModel;

pub struct OnnxGibberishModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxGibberishModel {
    /// Load the ONNX model and tokenizer from `model_dir`.
    ///
    /// Expects `model_quantized.onnx` and `tokenizer.json` in the directory.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model_quantized.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() || !tokenizer_path.exists() {
            anyhow::bail!(
                "Gibberish model files not found in {}",
                model_dir.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!("Loaded ONNX gibberish model from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

#[async_trait]
impl GibberishModel for OnnxGibberishModel {
    async fn gibberish_confidence(&self, text: &str) -> Result<f64> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let shape = [1i64, ids.len() as i64];

            let input_ids = Tensor::from_array((shape, ids)).context("input_ids tensor")?;
            let attention_mask =
                Tensor::from_array((shape, mask)).context("attention_mask tensor")?;

            let logit = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;
                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids,
                        "attention_mask" => attention_mask
                    })
                    .context("ONNX inference failed")?;
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;
                data[0]
            };

            Ok(1.0 / (1.0 + (-logit as f64).exp()))
        })
        .await
        .context("gibberish inference task panicked")?
    }
}

//! Embedding providers: a transformer model loaded with candle, and a
//! hashing fallback that is always available. Both produce L2-normalized
//! vectors of a fixed dimensionality; which one is active is decided at
//! configuration time and recorded in the provider id.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use recall_core::config::EmbeddingSettings;
use recall_core::traits::EmbeddingProvider;

pub mod device;
pub mod pool;
pub mod tokenize;

/// Transformer-backed provider. Mean-pools the final hidden states under
/// the attention mask and L2-normalizes the result.
pub struct ModelEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
    max_len: usize,
}

impl ModelEmbedder {
    pub fn load(settings: &EmbeddingSettings) -> Result<Self> {
        let model_dir = resolve_model_dir(settings)?;
        let device = device::select_device();

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!(
                "Failed to load tokenizer from {}: {}",
                tokenizer_path.display(),
                e
            )
        })?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig =
            serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)?;
        let weights_map: std::collections::HashMap<String, Tensor> =
            weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let dim = config.hidden_size;
        let model = XLMRobertaModel::new(&config, vb)?;

        let model_name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string());
        let id = format!("local:{}:d{}", model_name, dim);
        info!(model = %id, dir = %model_dir.display(), "embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            id,
            dim,
            max_len: settings.max_len,
        })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) =
            tokenize::tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((1, self.max_len), DType::I64, &self.device)?;
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = pool::masked_mean_l2(&hidden, &attention_mask)?;
        let emb: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        anyhow::ensure!(
            emb.len() == self.dim,
            "embedding dim mismatch: got {} expected {}",
            emb.len(),
            self.dim
        );
        Ok(emb)
    }
}

impl EmbeddingProvider for ModelEmbedder {
    fn model_id(&self) -> &str {
        &self.id
    }
    fn dim(&self) -> usize {
        self.dim
    }
    fn max_len(&self) -> usize {
        self.max_len
    }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}

/// Hashing fallback: buckets tokens with XxHash64 and weights by term
/// frequency, then L2-normalizes. Deterministic, dependency-free at
/// runtime, and much weaker semantically than the model — its id prefix
/// marks vectors for later re-embedding.
pub struct HashEmbedder {
    dim: usize,
    max_len: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize, max_len: usize) -> Self {
        let id = format!("hash:xxh64:d{}", dim);
        Self { dim, max_len, id }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|s| !s.is_empty())
            .take(self.max_len)
            .map(|s| s.to_lowercase())
            .collect();
        let mut v = vec![0f32; self.dim];
        if tokens.is_empty() {
            // Degenerate text yields the zero vector; similarity search
            // rejects it rather than dividing by a zero norm.
            return v;
        }

        let total = tokens.len() as f32;
        for token in &tokens {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign * (1.0 + (token.len() as f32).ln()) / total;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn model_id(&self) -> &str {
        &self.id
    }
    fn dim(&self) -> usize {
        self.dim
    }
    fn max_len(&self) -> usize {
        self.max_len
    }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Select a provider from settings. `provider = "hash"` forces the fallback;
/// otherwise the transformer model is loaded, degrading to the fallback when
/// the model directory is missing or unreadable.
pub fn select_provider(settings: &EmbeddingSettings) -> Box<dyn EmbeddingProvider> {
    if settings.provider.eq_ignore_ascii_case("hash") {
        debug!(dim = settings.dim, "using hash embedding provider");
        return Box::new(HashEmbedder::new(settings.dim, settings.max_len));
    }
    match ModelEmbedder::load(settings) {
        Ok(m) => Box::new(m),
        Err(e) => {
            warn!(error = %e, "embedding model unavailable, falling back to hash provider");
            Box::new(HashEmbedder::new(settings.dim, settings.max_len))
        }
    }
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    if let Some(dir) = &settings.model_dir {
        let p = recall_core::config::expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
        return Err(anyhow!("model directory {} does not exist", p.display()));
    }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(anyhow!("no embedding model directory configured"))
}

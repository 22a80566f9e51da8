//! receipt-embed
//!
//! `Embedder` implementations: a candle-backed MiniLM sentence encoder and a
//! hashing embedder for tests and offline development.

pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod tokenize;

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use receipt_core::config::{expand_path, resolve_with_base, EmbeddingSettings};
use receipt_core::traits::Embedder;

pub use hash::HashEmbedder;
pub use model::MiniLmEmbedder;
pub use pool::masked_mean_l2;

const DEFAULT_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";

/// Pick the embedder the settings ask for. `APP_USE_FAKE_EMBEDDINGS=1` forces
/// the hashing embedder regardless of configuration.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if settings.use_fake || env_fake {
        info!(dim = settings.dimension, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(settings.dimension)));
    }
    let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
    let model = MiniLmEmbedder::load(&model_dir, settings.max_len)?;
    if model.dim() != settings.dimension {
        return Err(anyhow!("model {} has dimension {}, configuration expects {}", model.model_id(), model.dim(), settings.dimension));
    }
    Ok(Box::new(model))
}

/// Locate the model directory: `APP_MODEL_DIR`, `MODEL_DIR`, the configured
/// path, then `models/all-MiniLM-L6-v2` here or one level up.
pub fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() { info!(var, dir = %p.display(), "using model dir"); return Ok(p); }
        }
    }
    if let Some(dir) = configured {
        let p = resolve_with_base(&cwd, dir);
        if p.exists() { info!(dir = %p.display(), "using configured model dir"); return Ok(p); }
        return Err(anyhow!("configured model directory {} does not exist", p.display()));
    }
    for candidate in [Path::new(DEFAULT_MODEL_DIR).to_path_buf(), Path::new("..").join(DEFAULT_MODEL_DIR)] {
        let p = cwd.join(candidate);
        if p.exists() { info!(dir = %p.display(), "using model dir"); return Ok(p); }
    }
    Err(anyhow!("Could not locate the all-MiniLM-L6-v2 model directory; set embedding.model_dir or APP_MODEL_DIR"))
}

//! ELECTRA encoder with a sequence-classification head.
//!
//! The ELECTRA discriminator shares the BERT encoder layout when its
//! embedding size equals its hidden size, so the encoder is built with
//! `candle_transformers`' BERT implementation under the `electra.` prefix.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{linear, Dropout, Linear, ModuleT, VarBuilder, VarMap};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use sotong_core::Tier;

use crate::error::TrainError;

pub const CONFIG_FILE: &str = "config.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

const ENCODER_PREFIX: &str = "electra";

/// The head-related fields of `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadConfig {
    pub hidden_size: usize,
    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob: f64,
    #[serde(default)]
    pub classifier_dropout: Option<f64>,
}

fn default_dropout() -> f64 {
    0.1
}

impl HeadConfig {
    fn dropout(&self) -> f32 {
        #[allow(clippy::cast_possible_truncation)]
        let p = self.classifier_dropout.unwrap_or(self.hidden_dropout_prob) as f32;
        p
    }
}

pub struct ElectraClassifier {
    encoder: BertModel,
    dense: Linear,
    out_proj: Linear,
    dropout: Dropout,
}

impl ElectraClassifier {
    /// Creates the encoder and a freshly initialized head whose variables
    /// live in the `VarBuilder`'s backing store.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::Candle`] if a variable cannot be created.
    pub fn new(
        vb: VarBuilder,
        encoder_config: &BertConfig,
        head: &HeadConfig,
    ) -> Result<Self, TrainError> {
        let encoder = BertModel::load(vb.pp(ENCODER_PREFIX), encoder_config)?;
        let classifier = vb.pp("classifier");
        let dense = linear(head.hidden_size, head.hidden_size, classifier.pp("dense"))?;
        let out_proj = linear(head.hidden_size, Tier::COUNT, classifier.pp("out_proj"))?;
        Ok(Self {
            encoder,
            dense,
            out_proj,
            dropout: Dropout::new(head.dropout()),
        })
    }

    /// Logits of shape `(batch, 5)`. Dropout is active only when `train`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::Candle`] on shape or device mismatches.
    pub fn forward_t(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
        train: bool,
    ) -> Result<Tensor, TrainError> {
        let hidden = self
            .encoder
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let x = self.dropout.forward_t(&cls, train)?;
        let x = self.dense.forward(&x)?.gelu_erf()?;
        let x = self.dropout.forward_t(&x, train)?;
        Ok(self.out_proj.forward(&x)?)
    }
}

/// A classifier ready for fine-tuning, with its trainable variables.
pub struct LoadedModel {
    pub model: ElectraClassifier,
    pub varmap: VarMap,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, TrainError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            TrainError::MissingModelFile {
                path: path.display().to_string(),
            }
        } else {
            TrainError::Io {
                path: path.display().to_string(),
                source,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| TrainError::ModelConfig {
        path: path.display().to_string(),
        source,
    })
}

/// Builds the classifier from `model_dir` and overlays the pretrained
/// encoder weights.
///
/// # Errors
///
/// Returns [`TrainError::MissingModelFile`] when `config.json` or
/// `model.safetensors` is absent, [`TrainError::ModelConfig`] when the
/// config cannot be parsed, and [`TrainError::Candle`] when the checkpoint
/// shapes do not fit the model.
pub fn load_pretrained(model_dir: &Path, device: &Device) -> Result<LoadedModel, TrainError> {
    let config_path = model_dir.join(CONFIG_FILE);
    let encoder_config: BertConfig = read_json(&config_path)?;
    let head: HeadConfig = read_json(&config_path)?;

    let weights = model_dir.join(WEIGHTS_FILE);
    if !weights.is_file() {
        return Err(TrainError::MissingModelFile {
            path: weights.display().to_string(),
        });
    }

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let model = ElectraClassifier::new(vb, &encoder_config, &head)?;

    let checkpoint = candle_core::safetensors::load(&weights, device)?;
    let missing = overlay_weights(&varmap, &checkpoint)?;
    if missing.is_empty() {
        tracing::info!(path = %weights.display(), "pretrained weights loaded");
    } else {
        tracing::info!(
            path = %weights.display(),
            fresh = missing.len(),
            "pretrained weights loaded; variables not in the checkpoint start fresh"
        );
        for name in &missing {
            tracing::debug!(%name, "freshly initialized");
        }
    }

    Ok(LoadedModel { model, varmap })
}

/// Checkpoint names to try for a variable. Older checkpoints name layer
/// norm parameters `gamma`/`beta`.
fn checkpoint_names(var_name: &str) -> Vec<String> {
    let mut names = vec![var_name.to_string()];
    if let Some(stem) = var_name.strip_suffix(".weight") {
        names.push(format!("{stem}.gamma"));
    } else if let Some(stem) = var_name.strip_suffix(".bias") {
        names.push(format!("{stem}.beta"));
    }
    names
}

/// Copies every checkpoint tensor whose name matches a variable into that
/// variable. Returns the sorted names of variables left untouched.
///
/// # Errors
///
/// Returns [`TrainError::Candle`] if a matched tensor has the wrong shape.
pub fn overlay_weights(
    varmap: &VarMap,
    checkpoint: &HashMap<String, Tensor>,
) -> Result<Vec<String>, TrainError> {
    let data = varmap
        .data()
        .lock()
        .map_err(|_| TrainError::Candle(candle_core::Error::Msg("variable store poisoned".into())))?;

    let mut missing = Vec::new();
    for (name, var) in data.iter() {
        let found = checkpoint_names(name)
            .into_iter()
            .find_map(|candidate| checkpoint.get(&candidate));
        match found {
            Some(tensor) => var.set(&tensor.to_dtype(var.dtype())?)?,
            None => missing.push(name.clone()),
        }
    }
    missing.sort();
    Ok(missing)
}

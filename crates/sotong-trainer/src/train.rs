//! Fine-tuning loop: per-epoch training with clipping and linear decay,
//! validation after each epoch, final report and parameter save.

use std::path::PathBuf;

use candle_core::{Device, Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sotong_core::{AppConfig, Tier};

use crate::data::{encode_records, load_records, load_tokenizer, stratified_split, Batch, Encoded};
use crate::error::TrainError;
use crate::metrics::{accuracy, ClassificationReport, ConfusionMatrix};
use crate::model::{load_pretrained, ElectraClassifier, TOKENIZER_FILE};
use crate::schedule::LinearSchedule;

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub model_dir: PathBuf,
    pub output_path: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    pub max_len: usize,
    pub learning_rate: f64,
    pub max_grad_norm: f64,
    pub val_ratio: f64,
    pub seed: u64,
}

impl TrainConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            data_path: config.labeled_path.clone(),
            model_dir: config.model_dir.clone(),
            output_path: config.model_output_path.clone(),
            epochs: config.train_epochs,
            batch_size: config.train_batch_size,
            max_len: config.train_max_len,
            learning_rate: config.train_learning_rate,
            max_grad_norm: 1.0,
            val_ratio: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    pub train_loss: f64,
    /// Not measured during training; always 0.
    pub train_accuracy: f64,
    pub val_accuracy: f64,
}

#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub history: Vec<EpochStats>,
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
    pub output_path: PathBuf,
}

/// Scales all gradients so their global L2 norm is at most `max_norm`.
/// Returns the norm before clipping.
///
/// # Errors
///
/// Returns [`TrainError::Candle`] on tensor failures.
pub fn clip_grad_norm(
    grads: &mut candle_core::backprop::GradStore,
    vars: &[Var],
    max_norm: f64,
) -> Result<f64, TrainError> {
    let mut sum_sq = 0.0f64;
    for var in vars {
        if let Some(g) = grads.get(var.as_tensor()) {
            sum_sq += f64::from(g.sqr()?.sum_all()?.to_scalar::<f32>()?);
        }
    }
    let norm = sum_sq.sqrt();
    if norm > max_norm {
        let scale = max_norm / (norm + 1e-6);
        for var in vars {
            if let Some(g) = grads.get(var.as_tensor()) {
                let clipped = g.affine(scale, 0.0)?;
                grads.insert(var.as_tensor(), clipped);
            }
        }
    }
    Ok(norm)
}

fn arg_max_tiers(logits: &Tensor) -> Result<Vec<Tier>, TrainError> {
    let ids = logits.argmax(1)?.to_vec1::<u32>()?;
    ids.into_iter()
        .map(|id| {
            Tier::from_label(i64::from(id))
                .map_err(|e| TrainError::Candle(candle_core::Error::Msg(e.to_string())))
        })
        .collect()
}

struct Trainer<'a> {
    model: &'a ElectraClassifier,
    vars: Vec<Var>,
    optimizer: AdamW,
    schedule: LinearSchedule,
    step: usize,
    max_grad_norm: f64,
    device: &'a Device,
}

impl Trainer<'_> {
    fn train_epoch(
        &mut self,
        data: &[Encoded],
        order: &[usize],
        batch_size: usize,
    ) -> Result<f64, TrainError> {
        let mut total_loss = 0.0;
        let mut batches = 0usize;
        for chunk in order.chunks(batch_size) {
            let batch = Batch::from_indices(data, chunk, self.device)?;
            let logits = self.model.forward_t(
                &batch.input_ids,
                &batch.token_type_ids,
                &batch.attention_mask,
                true,
            )?;
            let loss = candle_nn::loss::cross_entropy(&logits, &batch.labels)?;

            let mut grads = loss.backward()?;
            clip_grad_norm(&mut grads, &self.vars, self.max_grad_norm)?;
            self.optimizer.set_learning_rate(self.schedule.lr(self.step));
            self.optimizer.step(&grads)?;
            self.step += 1;

            total_loss += f64::from(loss.to_scalar::<f32>()?);
            batches += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        let avg = if batches == 0 { 0.0 } else { total_loss / batches as f64 };
        Ok(avg)
    }

    fn evaluate(
        &self,
        data: &[Encoded],
        indices: &[usize],
        batch_size: usize,
    ) -> Result<(Vec<Tier>, Vec<Tier>), TrainError> {
        let mut actual = Vec::with_capacity(indices.len());
        let mut predicted = Vec::with_capacity(indices.len());
        for chunk in indices.chunks(batch_size) {
            let batch = Batch::from_indices(data, chunk, self.device)?;
            let logits = self
                .model
                .forward_t(
                    &batch.input_ids,
                    &batch.token_type_ids,
                    &batch.attention_mask,
                    false,
                )?;
            predicted.extend(arg_max_tiers(&logits)?);
            actual.extend(batch.tiers);
        }
        Ok((actual, predicted))
    }
}

/// Runs the whole fine-tuning job described by `config`.
///
/// # Errors
///
/// Any failure aborts the run: missing inputs or model files, invalid
/// labels, too little data to split, tensor errors and save failures.
pub fn run_training(config: &TrainConfig) -> Result<TrainSummary, TrainError> {
    let device = Device::cuda_if_available(0)?;
    tracing::info!(?device, "training device selected");

    let records = load_records(&config.data_path)?;
    let tokenizer = load_tokenizer(&config.model_dir.join(TOKENIZER_FILE), config.max_len)?;
    let data = encode_records(&tokenizer, &records)?;

    let labels: Vec<Tier> = data.iter().map(|e| e.label).collect();
    let (mut train_idx, val_idx) = stratified_split(&labels, config.val_ratio, config.seed);
    if train_idx.is_empty() || val_idx.is_empty() {
        return Err(TrainError::NotEnoughData(format!(
            "{} records give {} training and {} validation rows",
            data.len(),
            train_idx.len(),
            val_idx.len()
        )));
    }
    tracing::info!(
        train = train_idx.len(),
        validation = val_idx.len(),
        "dataset split"
    );

    let loaded = load_pretrained(&config.model_dir, &device)?;
    let vars = loaded.varmap.all_vars();
    let optimizer = AdamW::new(
        vars.clone(),
        ParamsAdamW {
            lr: config.learning_rate,
            ..ParamsAdamW::default()
        },
    )?;
    let steps_per_epoch = train_idx.len().div_ceil(config.batch_size);
    let mut trainer = Trainer {
        model: &loaded.model,
        vars,
        optimizer,
        schedule: LinearSchedule::new(config.learning_rate, steps_per_epoch * config.epochs),
        step: 0,
        max_grad_norm: config.max_grad_norm,
        device: &device,
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut history = Vec::with_capacity(config.epochs);
    let mut last_eval = (Vec::new(), Vec::new());

    for epoch in 1..=config.epochs {
        train_idx.shuffle(&mut rng);
        let train_loss = trainer.train_epoch(&data, &train_idx, config.batch_size)?;
        let (actual, predicted) = trainer.evaluate(&data, &val_idx, config.batch_size)?;
        let val_accuracy = accuracy(&actual, &predicted);

        tracing::info!(
            epoch,
            epochs = config.epochs,
            train_loss,
            train_accuracy = 0.0,
            val_accuracy,
            "epoch finished"
        );
        history.push(EpochStats {
            epoch,
            train_loss,
            train_accuracy: 0.0,
            val_accuracy,
        });
        last_eval = (actual, predicted);
    }

    let (actual, predicted) = last_eval;
    let report = ClassificationReport::new(&actual, &predicted);
    let confusion = ConfusionMatrix::new(&actual, &predicted);

    save_parameters(&loaded.varmap, &config.output_path)?;
    tracing::info!(path = %config.output_path.display(), "model parameters saved");

    Ok(TrainSummary {
        history,
        report,
        confusion,
        output_path: config.output_path.clone(),
    })
}

fn save_parameters(varmap: &VarMap, path: &std::path::Path) -> Result<(), TrainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| TrainError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    varmap.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarBuilder;
    use candle_transformers::models::bert::Config as BertConfig;
    use sotong_core::{write_csv, LabeledRecord};

    use crate::fixtures::{tiny_config, TINY_TOKENIZER};
    use crate::model::{HeadConfig, CONFIG_FILE, WEIGHTS_FILE};

    /// Writes `config.json`, `tokenizer.json` and freshly initialized
    /// `model.safetensors` into `dir`.
    fn write_tiny_model_dir(dir: &std::path::Path) {
        let config = tiny_config();
        std::fs::write(dir.join(CONFIG_FILE), config.to_string()).unwrap();
        std::fs::write(dir.join(TOKENIZER_FILE), TINY_TOKENIZER).unwrap();

        let encoder: BertConfig = serde_json::from_value(config.clone()).unwrap();
        let head: HeadConfig = serde_json::from_value(config).unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let _model = ElectraClassifier::new(vb, &encoder, &head).unwrap();
        varmap.save(dir.join(WEIGHTS_FILE)).unwrap();
    }

    #[test]
    fn clipping_bounds_global_norm() {
        let a = Var::new(&[1f32, 2.0], &Device::Cpu).unwrap();
        let b = Var::new(&[2f32], &Device::Cpu).unwrap();
        // loss = 3*sum(a) + 4*sum(b): grads are [3, 3] and [4], norm sqrt(34).
        let loss = (a.as_tensor().affine(3.0, 0.0).unwrap().sum_all().unwrap()
            + b.as_tensor().affine(4.0, 0.0).unwrap().sum_all().unwrap())
        .unwrap();
        let mut grads = loss.backward().unwrap();
        let vars = vec![a.clone(), b.clone()];

        let before = clip_grad_norm(&mut grads, &vars, 1.0).unwrap();
        assert!((before - 34f64.sqrt()).abs() < 1e-5);

        let after: f64 = vars
            .iter()
            .map(|v| {
                let g = grads.get(v.as_tensor()).unwrap();
                f64::from(g.sqr().unwrap().sum_all().unwrap().to_scalar::<f32>().unwrap())
            })
            .sum::<f64>()
            .sqrt();
        assert!(after <= 1.0 + 1e-5);
        assert!((after - 1.0).abs() < 1e-4);
    }

    #[test]
    fn clipping_leaves_small_gradients_alone() {
        let a = Var::new(&[1f32], &Device::Cpu).unwrap();
        let loss = a.as_tensor().affine(0.5, 0.0).unwrap().sum_all().unwrap();
        let mut grads = loss.backward().unwrap();

        clip_grad_norm(&mut grads, &[a.clone()], 1.0).unwrap();

        let g = grads.get(a.as_tensor()).unwrap().to_vec1::<f32>().unwrap();
        assert!((g[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn arg_max_maps_to_tiers() {
        let logits = Tensor::new(
            &[[0.1f32, 0.9, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0, 2.0]],
            &Device::Cpu,
        )
        .unwrap();
        assert_eq!(
            arg_max_tiers(&logits).unwrap(),
            vec![Tier::TechnicalFailure, Tier::General]
        );
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let varmap = VarMap::new();
        let vb = candle_nn::VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let _ = candle_nn::linear(2, 2, vb.pp("head")).unwrap();
        let path = dir.path().join("models").join("out.safetensors");

        save_parameters(&varmap, &path).unwrap();

        let loaded = candle_core::safetensors::load(&path, &Device::Cpu).unwrap();
        assert!(loaded.contains_key("head.weight"));
    }

    #[test]
    fn missing_labeled_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainConfig {
            data_path: dir.path().join("absent.csv"),
            model_dir: dir.path().to_path_buf(),
            output_path: dir.path().join("out.safetensors"),
            epochs: 1,
            batch_size: 2,
            max_len: 8,
            learning_rate: 5e-5,
            max_grad_norm: 1.0,
            val_ratio: 0.2,
            seed: 42,
        };
        assert!(matches!(run_training(&config), Err(TrainError::Dataset(_))));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn runs_epochs_and_saves_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("model");
        std::fs::create_dir_all(&model_dir).unwrap();
        write_tiny_model_dir(&model_dir);

        let data_path = dir.path().join("labeled.csv");
        let mut records: Vec<LabeledRecord> = (0..5)
            .map(|_| LabeledRecord {
                content: "서버 오류".to_string(),
                label: Tier::TechnicalFailure,
            })
            .collect();
        records.extend((0..5).map(|_| LabeledRecord {
            content: "화질 개선".to_string(),
            label: Tier::FeatureRequest,
        }));
        write_csv(&data_path, &LabeledRecord::COLUMNS, &records).unwrap();

        let config = TrainConfig {
            data_path,
            model_dir,
            output_path: dir.path().join("out").join("model.safetensors"),
            epochs: 2,
            batch_size: 4,
            max_len: 8,
            learning_rate: 5e-5,
            max_grad_norm: 1.0,
            val_ratio: 0.2,
            seed: 42,
        };
        let summary = run_training(&config).unwrap();

        assert_eq!(summary.history.len(), 2);
        assert_eq!(summary.history[1].epoch, 2);
        assert!(summary.history.iter().all(|e| e.train_loss.is_finite()));
        // One validation row per tier: round(0.2 * 5) = 1.
        assert_eq!(summary.report.macro_avg.support, 2);
        let confusion_total: usize = summary.confusion.0.iter().flatten().sum();
        assert_eq!(confusion_total, 2);
        assert!(summary.output_path.is_file());

        let saved = candle_core::safetensors::load(&summary.output_path, &Device::Cpu).unwrap();
        assert!(saved.contains_key("classifier.out_proj.weight"));
    }
}

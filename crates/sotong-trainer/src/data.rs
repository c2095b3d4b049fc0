//! Labeled data loading, tokenization, stratified split and batching.

use std::path::Path;

use candle_core::{Device, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sotong_core::{read_csv, LabeledRecord, Tier};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::error::TrainError;

/// Loads the labeled file and drops records with blank content.
///
/// # Errors
///
/// Returns [`TrainError::Dataset`] if the file is missing or a label is not
/// a tier number.
pub fn load_records(path: &Path) -> Result<Vec<LabeledRecord>, TrainError> {
    let records: Vec<LabeledRecord> = read_csv(path)?;
    let before = records.len();
    let kept: Vec<LabeledRecord> = records
        .into_iter()
        .filter(|r| !r.content.trim().is_empty())
        .collect();
    if kept.len() < before {
        tracing::warn!(dropped = before - kept.len(), "records with blank content dropped");
    }
    Ok(kept)
}

/// Loads `tokenizer.json` with truncation and fixed padding to `max_len`.
///
/// # Errors
///
/// Returns [`TrainError::MissingModelFile`] if the file does not exist and
/// [`TrainError::Tokenizer`] if it cannot be parsed or configured.
pub fn load_tokenizer(path: &Path, max_len: usize) -> Result<Tokenizer, TrainError> {
    if !path.is_file() {
        return Err(TrainError::MissingModelFile {
            path: path.display().to_string(),
        });
    }
    let tokenizer = Tokenizer::from_file(path).map_err(TrainError::tokenizer)?;
    configure_tokenizer(tokenizer, max_len)
}

pub(crate) fn configure_tokenizer(
    mut tokenizer: Tokenizer,
    max_len: usize,
) -> Result<Tokenizer, TrainError> {
    let pad_token = "[PAD]".to_string();
    let pad_id = tokenizer.token_to_id(&pad_token).unwrap_or(0);
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::Fixed(max_len),
        pad_id,
        pad_token,
        ..PaddingParams::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..TruncationParams::default()
        }))
        .map_err(TrainError::tokenizer)?;
    Ok(tokenizer)
}

/// One tokenized record, every vector exactly `max_len` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub token_type_ids: Vec<u32>,
    pub label: Tier,
}

/// Tokenizes every record.
///
/// # Errors
///
/// Returns [`TrainError::Tokenizer`] if encoding fails.
pub fn encode_records(
    tokenizer: &Tokenizer,
    records: &[LabeledRecord],
) -> Result<Vec<Encoded>, TrainError> {
    let texts: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
    let encodings = tokenizer
        .encode_batch(texts, true)
        .map_err(TrainError::tokenizer)?;

    Ok(encodings
        .into_iter()
        .zip(records)
        .map(|(enc, record)| Encoded {
            input_ids: enc.get_ids().to_vec(),
            attention_mask: enc.get_attention_mask().to_vec(),
            token_type_ids: enc.get_type_ids().to_vec(),
            label: record.label,
        })
        .collect())
}

/// Splits indices `0..labels.len()` into (train, validation), keeping each
/// tier's share of the validation set close to `val_ratio`.
///
/// Within a tier the order is shuffled with a generator seeded by `seed`.
/// Both lists come back sorted.
#[must_use]
pub fn stratified_split(labels: &[Tier], val_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut val = Vec::new();

    for tier in Tier::ALL {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == tier)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let n_val = ((members.len() as f64) * val_ratio).round() as usize;
        let n_val = n_val.min(members.len());
        val.extend_from_slice(&members[..n_val]);
        train.extend_from_slice(&members[n_val..]);
    }

    train.sort_unstable();
    val.sort_unstable();
    (train, val)
}

/// Tensors for one batch, all on the target device.
pub struct Batch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
    pub labels: Tensor,
    pub tiers: Vec<Tier>,
}

impl Batch {
    /// Stacks the records at `indices` into `(batch, max_len)` tensors.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::Candle`] if a tensor cannot be created.
    pub fn from_indices(
        data: &[Encoded],
        indices: &[usize],
        device: &Device,
    ) -> Result<Self, TrainError> {
        let rows: Vec<&Encoded> = indices.iter().map(|&i| &data[i]).collect();
        let tiers: Vec<Tier> = rows.iter().map(|r| r.label).collect();
        let labels: Vec<u32> = tiers.iter().map(|t| u32::from(t.label())).collect();

        Ok(Self {
            input_ids: stack(&rows, device, |r| &r.input_ids)?,
            attention_mask: stack(&rows, device, |r| &r.attention_mask)?,
            token_type_ids: stack(&rows, device, |r| &r.token_type_ids)?,
            labels: Tensor::from_vec(labels, rows.len(), device)?,
            tiers,
        })
    }
}

fn stack(
    rows: &[&Encoded],
    device: &Device,
    pick: impl Fn(&Encoded) -> &Vec<u32>,
) -> Result<Tensor, TrainError> {
    let seq_len = rows.first().map_or(0, |r| pick(r).len());
    let flat: Vec<u32> = rows.iter().flat_map(|r| pick(r).iter().copied()).collect();
    Ok(Tensor::from_vec(flat, (rows.len(), seq_len), device)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use sotong_core::write_csv;

    use crate::fixtures::TINY_TOKENIZER;

    fn record(content: &str, label: Tier) -> LabeledRecord {
        LabeledRecord {
            content: content.to_string(),
            label,
        }
    }

    #[test]
    fn load_records_drops_blank_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        write_csv(
            &path,
            &LabeledRecord::COLUMNS,
            &[
                record("서버 오류", Tier::TechnicalFailure),
                record("  ", Tier::General),
            ],
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, Tier::TechnicalFailure);
    }

    #[test]
    fn load_records_rejects_out_of_range_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        std::fs::write(&path, "content,label\n서버 오류,7\n").unwrap();

        assert!(matches!(load_records(&path), Err(TrainError::Dataset(_))));
    }

    #[test]
    fn encoding_pads_and_truncates_to_max_len() {
        let tokenizer = Tokenizer::from_str(TINY_TOKENIZER).unwrap();
        let tokenizer = configure_tokenizer(tokenizer, 4).unwrap();

        let encoded = encode_records(
            &tokenizer,
            &[
                record("서버 오류", Tier::TechnicalFailure),
                record("화질 개선 서버 오류 화질", Tier::FeatureRequest),
            ],
        )
        .unwrap();

        assert_eq!(encoded[0].input_ids, vec![2, 3, 0, 0]);
        assert_eq!(encoded[0].attention_mask, vec![1, 1, 0, 0]);
        assert_eq!(encoded[1].input_ids, vec![4, 5, 2, 3]);
        assert_eq!(encoded[1].attention_mask, vec![1, 1, 1, 1]);
        assert_eq!(encoded[1].label, Tier::FeatureRequest);
    }

    #[test]
    fn missing_tokenizer_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_tokenizer(&dir.path().join("tokenizer.json"), 8);
        assert!(matches!(result, Err(TrainError::MissingModelFile { .. })));
    }

    #[test]
    fn split_is_stratified_and_disjoint() {
        let mut labels = vec![Tier::TechnicalFailure; 50];
        labels.extend(vec![Tier::General; 10]);
        let (train, val) = stratified_split(&labels, 0.2, 42);

        assert_eq!(train.len() + val.len(), 60);
        let failures = val.iter().filter(|&&i| labels[i] == Tier::TechnicalFailure).count();
        let general = val.iter().filter(|&&i| labels[i] == Tier::General).count();
        assert_eq!(failures, 10);
        assert_eq!(general, 2);
        assert!(train.iter().all(|i| !val.contains(i)));
    }

    #[test]
    fn split_is_reproducible() {
        let labels: Vec<Tier> = (0..40).map(|i| Tier::ALL[i % Tier::COUNT]).collect();
        assert_eq!(
            stratified_split(&labels, 0.2, 42),
            stratified_split(&labels, 0.2, 42)
        );
    }

    #[test]
    fn batch_stacks_rows() {
        let data = vec![
            Encoded {
                input_ids: vec![2, 3, 0],
                attention_mask: vec![1, 1, 0],
                token_type_ids: vec![0, 0, 0],
                label: Tier::TechnicalFailure,
            },
            Encoded {
                input_ids: vec![4, 0, 0],
                attention_mask: vec![1, 0, 0],
                token_type_ids: vec![0, 0, 0],
                label: Tier::General,
            },
        ];
        let batch = Batch::from_indices(&data, &[1, 0], &Device::Cpu).unwrap();

        assert_eq!(batch.input_ids.dims(), &[2, 3]);
        assert_eq!(
            batch.input_ids.to_vec2::<u32>().unwrap(),
            vec![vec![4, 0, 0], vec![2, 3, 0]]
        );
        assert_eq!(batch.labels.to_vec1::<u32>().unwrap(), vec![4, 1]);
        assert_eq!(batch.tiers, vec![Tier::General, Tier::TechnicalFailure]);
    }
}

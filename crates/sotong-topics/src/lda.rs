//! Latent Dirichlet allocation fitted with batch variational Bayes.
//!
//! Each pass runs the per-document E-step over the whole corpus, replaces
//! the topic-word variational parameters with `eta + sufficient statistics`,
//! and takes one damped Newton step on the document-topic prior `alpha`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sotong_core::Topic;

use crate::dictionary::{BagOfWords, Dictionary};
use crate::special::{digamma, dirichlet_expectation, trigamma};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LdaConfig {
    pub num_topics: usize,
    pub passes: usize,
    pub seed: u64,
    /// Upper bound on per-document E-step iterations.
    pub iterations: usize,
    /// Mean absolute change in a document's gamma below which its E-step stops.
    pub gamma_threshold: f64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            num_topics: 5,
            passes: 20,
            seed: 42,
            iterations: 50,
            gamma_threshold: 0.001,
        }
    }
}

/// A fitted model: topic-word parameters `lambda` (K x V) and the learned
/// asymmetric prior `alpha` (K).
#[derive(Debug, Clone)]
pub struct LdaModel {
    lambda: Vec<Vec<f64>>,
    alpha: Vec<f64>,
    eta: f64,
}

impl LdaModel {
    /// Fits `config.num_topics` topics to `corpus`, whose ids index a
    /// vocabulary of `num_terms` tokens.
    #[must_use]
    pub fn train(corpus: &[BagOfWords], num_terms: usize, config: &LdaConfig) -> Self {
        let k = config.num_topics.max(1);
        #[allow(clippy::cast_precision_loss)]
        let initial = 1.0 / k as f64;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let lambda = (0..k)
            .map(|_| {
                (0..num_terms)
                    .map(|_| rng.random_range(0.9..1.1))
                    .collect()
            })
            .collect();

        let mut model = Self {
            lambda,
            alpha: vec![initial; k],
            eta: initial,
        };

        for pass in 0..config.passes {
            let exp_elog_beta = model.exp_elog_beta();
            let mut sstats = vec![vec![0.0; num_terms]; k];
            let mut gammas = Vec::with_capacity(corpus.len());

            for doc in corpus {
                let gamma = model.infer_document(doc, &exp_elog_beta, &mut sstats, config);
                gammas.push(gamma);
            }

            for (row, stats) in model.lambda.iter_mut().zip(&sstats) {
                for (l, s) in row.iter_mut().zip(stats) {
                    *l = model.eta + s;
                }
            }

            #[allow(clippy::cast_precision_loss)]
            let rho = (1.0 + pass as f64).powf(-0.5);
            model.update_alpha(&gammas, rho);
            tracing::debug!(pass, alpha = ?model.alpha, "lda pass finished");
        }

        model
    }

    #[must_use]
    pub fn num_topics(&self) -> usize {
        self.alpha.len()
    }

    #[must_use]
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    /// `exp(E[log beta])` per topic, from the current `lambda`.
    fn exp_elog_beta(&self) -> Vec<Vec<f64>> {
        self.lambda
            .iter()
            .map(|row| {
                dirichlet_expectation(row)
                    .into_iter()
                    .map(f64::exp)
                    .collect()
            })
            .collect()
    }

    /// Variational E-step for one document. Returns its gamma and adds its
    /// expected topic-word counts to `sstats`.
    fn infer_document(
        &self,
        doc: &BagOfWords,
        exp_elog_beta: &[Vec<f64>],
        sstats: &mut [Vec<f64>],
        config: &LdaConfig,
    ) -> Vec<f64> {
        let k = self.alpha.len();
        let total: u32 = doc.iter().map(|&(_, c)| c).sum();
        #[allow(clippy::cast_precision_loss)]
        let mut gamma: Vec<f64> = self
            .alpha
            .iter()
            .map(|a| a + f64::from(total) / k as f64)
            .collect();
        if doc.is_empty() {
            return gamma;
        }

        let mut exp_elog_theta = exp_dirichlet(&gamma);
        let mut phinorm = phi_norm(doc, &exp_elog_theta, exp_elog_beta);

        for _ in 0..config.iterations {
            let last = gamma.clone();
            for t in 0..k {
                let dot: f64 = doc
                    .iter()
                    .zip(&phinorm)
                    .map(|(&(w, c), norm)| f64::from(c) / norm * exp_elog_beta[t][w])
                    .sum();
                gamma[t] = self.alpha[t] + exp_elog_theta[t] * dot;
            }
            exp_elog_theta = exp_dirichlet(&gamma);
            phinorm = phi_norm(doc, &exp_elog_theta, exp_elog_beta);

            #[allow(clippy::cast_precision_loss)]
            let mean_change =
                gamma.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum::<f64>() / k as f64;
            if mean_change < config.gamma_threshold {
                break;
            }
        }

        for (t, stats) in sstats.iter_mut().enumerate() {
            for (&(w, c), norm) in doc.iter().zip(&phinorm) {
                stats[w] += exp_elog_theta[t] * f64::from(c) / norm * exp_elog_beta[t][w];
            }
        }
        gamma
    }

    /// One Newton step on the Dirichlet prior, damped by `rho`. The step is
    /// rejected if it would make any component non-positive.
    fn update_alpha(&mut self, gammas: &[Vec<f64>], rho: f64) {
        if gammas.is_empty() {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = gammas.len() as f64;
        let k = self.alpha.len();

        let mut logphat = vec![0.0; k];
        for gamma in gammas {
            for (acc, e) in logphat.iter_mut().zip(dirichlet_expectation(gamma)) {
                *acc += e / n;
            }
        }

        let alpha_sum: f64 = self.alpha.iter().sum();
        let gradf: Vec<f64> = self
            .alpha
            .iter()
            .zip(&logphat)
            .map(|(&a, &lp)| n * (digamma(alpha_sum) - digamma(a) + lp))
            .collect();
        let c = n * trigamma(alpha_sum);
        let q: Vec<f64> = self.alpha.iter().map(|&a| -n * trigamma(a)).collect();
        let b = gradf.iter().zip(&q).map(|(g, q)| g / q).sum::<f64>()
            / (1.0 / c + q.iter().map(|q| 1.0 / q).sum::<f64>());

        let updated: Vec<f64> = self
            .alpha
            .iter()
            .zip(gradf.iter().zip(&q))
            .map(|(&a, (g, q))| a + rho * (-(g - b) / q))
            .collect();
        if updated.iter().all(|&a| a > 0.0 && a.is_finite()) {
            self.alpha = updated;
        } else {
            tracing::warn!("alpha update rejected; keeping previous prior");
        }
    }

    /// Normalized word weights of topic `topic`, heaviest first, at most `n`.
    #[must_use]
    pub fn topic_terms(&self, topic: usize, n: usize) -> Vec<(usize, f64)> {
        let Some(row) = self.lambda.get(topic) else {
            return Vec::new();
        };
        let total: f64 = row.iter().sum();
        let mut terms: Vec<(usize, f64)> = row
            .iter()
            .enumerate()
            .map(|(id, &l)| (id, l / total))
            .collect();
        terms.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        terms.truncate(n);
        terms
    }

    /// Every topic in id order with its top `n` words.
    #[must_use]
    pub fn topics(&self, dictionary: &Dictionary, n: usize) -> Vec<Topic> {
        (0..self.num_topics())
            .map(|topic_id| Topic {
                topic_id,
                words: self
                    .topic_terms(topic_id, n)
                    .into_iter()
                    .filter_map(|(id, w)| dictionary.token(id).map(|t| (t.to_string(), w)))
                    .collect(),
            })
            .collect()
    }
}

fn exp_dirichlet(alpha: &[f64]) -> Vec<f64> {
    dirichlet_expectation(alpha).into_iter().map(f64::exp).collect()
}

fn phi_norm(doc: &BagOfWords, exp_elog_theta: &[f64], exp_elog_beta: &[Vec<f64>]) -> Vec<f64> {
    doc.iter()
        .map(|&(w, _)| {
            exp_elog_theta
                .iter()
                .zip(exp_elog_beta)
                .map(|(theta, beta)| theta * beta[w])
                .sum::<f64>()
                + 1e-100
        })
        .collect()
}

#[cfg(test)]
#[path = "lda_test.rs"]
mod tests;

//! Validation metrics: accuracy, per-tier classification report and
//! confusion matrix.

use std::fmt;

use sotong_core::Tier;

/// Fraction of positions where `predicted` equals `actual`. 0 when empty.
#[must_use]
pub fn accuracy(actual: &[Tier], predicted: &[Tier]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = actual
        .iter()
        .zip(predicted)
        .filter(|(a, p)| a == p)
        .count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = correct as f64 / actual.len() as f64;
    ratio
}

/// Counts indexed `[actual][predicted]` by tier label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix(pub [[usize; Tier::COUNT]; Tier::COUNT]);

impl ConfusionMatrix {
    #[must_use]
    pub fn new(actual: &[Tier], predicted: &[Tier]) -> Self {
        let mut counts = [[0usize; Tier::COUNT]; Tier::COUNT];
        for (a, p) in actual.iter().zip(predicted) {
            counts[usize::from(a.label())][usize::from(p.label())] += 1;
        }
        Self(counts)
    }

    #[must_use]
    pub fn get(&self, actual: Tier, predicted: Tier) -> usize {
        self.0[usize::from(actual.label())][usize::from(predicted.label())]
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>12}", "")?;
        for tier in Tier::ALL {
            write!(f, "{:>8}", tier.label())?;
        }
        writeln!(f)?;
        for tier in Tier::ALL {
            write!(f, "{:>12}", tier.class_name())?;
            for count in self.0[usize::from(tier.label())] {
                write!(f, "{count:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-tier precision, recall and F1 with accuracy and averages.
///
/// Undefined ratios (no predictions or no support) count as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; Tier::COUNT],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let r = num as f64 / den as f64;
        r
    }
}

impl ClassificationReport {
    #[must_use]
    pub fn new(actual: &[Tier], predicted: &[Tier]) -> Self {
        let matrix = ConfusionMatrix::new(actual, predicted);
        let classes = Tier::ALL.map(|tier| {
            let tp = matrix.get(tier, tier);
            let predicted_as: usize = Tier::ALL.iter().map(|a| matrix.get(*a, tier)).sum();
            let support: usize = Tier::ALL.iter().map(|p| matrix.get(tier, *p)).sum();
            let precision = ratio(tp, predicted_as);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                precision,
                recall,
                f1,
                support,
            }
        });

        let total: usize = classes.iter().map(|c| c.support).sum();
        #[allow(clippy::cast_precision_loss)]
        let (n, total_f) = (Tier::COUNT as f64, total as f64);
        let sum = |f: fn(&ClassMetrics) -> f64| classes.iter().map(f).sum::<f64>();
        #[allow(clippy::cast_precision_loss)]
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total_f
            }
        };

        Self {
            classes,
            accuracy: accuracy(actual, predicted),
            macro_avg: ClassMetrics {
                precision: sum(|c| c.precision) / n,
                recall: sum(|c| c.recall) / n,
                f1: sum(|c| c.f1) / n,
                support: total,
            },
            weighted_avg: ClassMetrics {
                precision: weighted(|c| c.precision),
                recall: weighted(|c| c.recall),
                f1: weighted(|c| c.f1),
                support: total,
            },
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (tier, m) in Tier::ALL.iter().zip(&self.classes) {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                tier.class_name(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

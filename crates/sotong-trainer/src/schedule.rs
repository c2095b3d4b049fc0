//! Learning-rate schedule: linear decay from the base rate to zero, no warmup.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSchedule {
    base_lr: f64,
    total_steps: usize,
}

impl LinearSchedule {
    #[must_use]
    pub fn new(base_lr: f64, total_steps: usize) -> Self {
        Self {
            base_lr,
            total_steps,
        }
    }

    /// Rate to use for optimizer step `step` (0-based). Reaches exactly 0 at
    /// `total_steps` and stays there.
    #[must_use]
    pub fn lr(&self, step: usize) -> f64 {
        if self.total_steps == 0 || step >= self.total_steps {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let remaining = (self.total_steps - step) as f64 / self.total_steps as f64;
        self.base_lr * remaining
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

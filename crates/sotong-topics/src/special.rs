//! Digamma and trigamma for positive arguments.
//!
//! Both shift the argument to at least 10 with the recurrence and then use
//! the asymptotic expansion, whose truncation error is below 1e-13 there.

const SHIFT: f64 = 10.0;

pub(crate) fn digamma(mut x: f64) -> f64 {
    let mut acc = 0.0;
    while x < SHIFT {
        acc -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    acc + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

pub(crate) fn trigamma(mut x: f64) -> f64 {
    let mut acc = 0.0;
    while x < SHIFT {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let inv = 1.0 / x;
    let f = inv * inv;
    acc + inv
        + f / 2.0
        + inv * f * (1.0 / 6.0 - f * (1.0 / 30.0 - f * (1.0 / 42.0 - f * (1.0 / 30.0 - f * 5.0 / 66.0))))
}

/// `E[log theta]` for `theta ~ Dirichlet(alpha)`.
pub(crate) fn dirichlet_expectation(alpha: &[f64]) -> Vec<f64> {
    let total = digamma(alpha.iter().sum());
    alpha.iter().map(|&a| digamma(a) - total).collect()
}

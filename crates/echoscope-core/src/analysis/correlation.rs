use serde::Serialize;

/// Why a correlation coefficient could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// Fewer than two aligned observations.
    TooShort,
    /// One side is constant.
    ZeroVariance,
    /// The two sides differ in length.
    LengthMismatch,
    /// Arithmetic overflowed to a non-finite value.
    NonFinite,
}

/// Pearson correlation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Correlation {
    Defined(f64),
    Undefined(UndefinedReason),
}

impl Correlation {
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Defined(value) => Some(value),
            Self::Undefined(_) => None,
        }
    }

    /// Scoring policy: an undefined correlation contributes zero.
    pub const fn or_zero(self) -> f64 {
        match self {
            Self::Defined(value) => value,
            Self::Undefined(_) => 0.0,
        }
    }
}

/// Delays `values` by `shift` steps: the tail is dropped and the first `shift`
/// positions are zero. Output length equals input length.
pub fn shift_forward(values: &[f64], shift: usize) -> Vec<f64> {
    let len = values.len();
    let lead = shift.min(len);
    let mut shifted = Vec::with_capacity(len);
    shifted.resize(lead, 0.0);
    shifted.extend_from_slice(&values[..len - lead]);
    shifted
}

/// Pearson linear correlation coefficient of two equal-length samples.
pub fn pearson(x: &[f64], y: &[f64]) -> Correlation {
    if x.len() != y.len() {
        return Correlation::Undefined(UndefinedReason::LengthMismatch);
    }
    if x.len() < 2 {
        return Correlation::Undefined(UndefinedReason::TooShort);
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if !(cov.is_finite() && var_x.is_finite() && var_y.is_finite()) {
        return Correlation::Undefined(UndefinedReason::NonFinite);
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return Correlation::Undefined(UndefinedReason::ZeroVariance);
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if r.is_finite() {
        Correlation::Defined(r.clamp(-1.0, 1.0))
    } else {
        Correlation::Undefined(UndefinedReason::NonFinite)
    }
}

/// Correlates `target` against `reference` delayed by `shift` steps.
pub fn phase_correlation(target: &[f64], reference: &[f64], shift: usize) -> Correlation {
    pearson(target, &shift_forward(reference, shift))
}

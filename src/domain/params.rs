use crate::error::{Result, VfmError};

/// Candidate adjustment factors ordered from highest to lowest
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSteps(Vec<f64>);

impl FactorSteps {
    pub fn new(factors: Vec<f64>) -> Self {
        Self(factors)
    }

    /// Five symmetric steps `[r, r/2, 0, -r/2, -r]` for a range in percent
    ///
    /// A range of 20 gives `[0.2, 0.1, 0.0, -0.1, -0.2]`. The end points 0
    /// and 100 are taken as 1 and 99 so the steps stay distinct and no step
    /// drops the amount to zero.
    pub fn from_range_percent(range_percent: f64) -> Self {
        let effective = if range_percent == 0.0 {
            1.0
        } else if range_percent == 100.0 {
            99.0
        } else {
            range_percent
        };
        let max = effective / 100.0;
        let min = -max;
        Self(vec![max, max / 2.0, 0.0, min / 2.0, min])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Magnitude of the steepest step, the bound of the stepless strategy
    pub fn max_range(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }
}

/// How humus values are turned into adjustment factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistributionMode {
    /// Area-quantile blend over a fixed set of factor steps
    #[default]
    Steps,
    /// Linear in the humus value, re-centred on the area-weighted mean
    Stepless,
}

/// Numeric inputs of the assembly step
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationParameters {
    /// Base fertilization amount, applied where the factor is 0
    pub base_amount: f64,
    pub steps: FactorSteps,
    pub mode: DistributionMode,
    /// Give cells inside the field without a reading the base amount
    pub interpolate_missing: bool,
}

impl ApplicationParameters {
    /// Five-step parameters for a base amount and a range in percent
    pub fn new(base_amount: f64, range_percent: f64) -> Self {
        Self {
            base_amount,
            steps: FactorSteps::from_range_percent(range_percent),
            mode: DistributionMode::Steps,
            interpolate_missing: true,
        }
    }

    pub fn with_mode(mut self, mode: DistributionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_steps(mut self, steps: FactorSteps) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_interpolation(mut self, interpolate_missing: bool) -> Self {
        self.interpolate_missing = interpolate_missing;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_amount.is_finite() && self.base_amount > 0.0) {
            return Err(VfmError::InvalidParameter(format!(
                "base amount must be positive, got {}",
                self.base_amount
            )));
        }
        if self.steps.as_slice().iter().any(|f| !f.is_finite()) {
            return Err(VfmError::InvalidParameter(
                "factor steps must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

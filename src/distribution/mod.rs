//! Humus value to fertilization factor strategies

pub mod key;
pub mod stepless;
pub mod steps;

pub use key::{HumusAreaMap, HumusKey, RateTable};
pub use stepless::distribute_stepless;
pub use steps::{distribute_steps, redistribute_factor};

use crate::domain::{ApplicationParameters, DistributionMode};

/// Build the rate table for `map` with the strategy selected in `params`
///
/// The stepless strategy uses the first (largest) step as its range.
pub fn distribute(map: &HumusAreaMap, params: &ApplicationParameters) -> RateTable {
    match params.mode {
        DistributionMode::Steps => distribute_steps(map, params.steps.as_slice()),
        DistributionMode::Stepless => distribute_stepless(map, params.steps.max_range()),
    }
}

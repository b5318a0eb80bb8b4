mod bid;
mod params;
mod play;

pub use bid::BidPlanner;
pub use params::HeuristicParams;
pub use play::{PlayPlanner, ScoredCard};

use euchre_core::model::card::MAX_POWER;

/// Card power scaled into `[0, 1]`.
pub(crate) fn normalized_power(power: u8) -> f64 {
    f64::from(power) / f64::from(MAX_POWER)
}

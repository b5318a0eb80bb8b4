pub mod bot;
pub mod policy;

pub use bot::{BidPlanner, HeuristicParams, PlayPlanner};
pub use policy::HeuristicPolicy;

mod heuristic;

pub use heuristic::HeuristicPolicy;

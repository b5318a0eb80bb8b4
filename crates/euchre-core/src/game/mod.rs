pub mod events;
pub mod match_state;
pub mod seat;
pub mod serialization;
pub mod table;

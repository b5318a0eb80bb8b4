use super::match_state::MatchState;
use crate::model::deck::DealError;
use crate::model::player::PlayerPosition;
use crate::model::score::TARGET_SCORE;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSnapshot {
    pub seed: u64,
    pub round_number: u32,
    pub dealer: PlayerPosition,
    pub scores: [u32; 2],
    /// Trump of the round in progress when captured, for observers. Not used
    /// by [`MatchSnapshot::restore`], which redeals the round from the start.
    #[serde(default)]
    pub trump: Option<Suit>,
    #[serde(default = "default_target")]
    pub target: u32,
}

fn default_target() -> u32 {
    TARGET_SCORE
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        MatchSnapshot {
            seed: state.seed(),
            round_number: state.round_number(),
            dealer: state.dealer(),
            scores: *state.scores().standings(),
            trump: state.round().trump(),
            target: state.scores().target(),
        }
    }

    /// Rebuilds the match at the start of the captured round.
    pub fn restore(self) -> Result<MatchState, DealError> {
        MatchState::from_snapshot(&self)
    }

    pub fn to_json(state: &MatchState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::MatchSnapshot;
    use crate::game::match_state::MatchState;
    use crate::model::player::PlayerPosition;

    #[test]
    fn snapshot_serializes_to_json() {
        let state = MatchState::with_seed(PlayerPosition::North, 99).unwrap();
        let json = MatchSnapshot::to_json(&state).unwrap();
        assert!(json.contains("\"seed\": 99"));
        assert!(json.contains("\"round_number\": 1"));
        assert!(json.contains("\"trump\": null"));
    }

    #[test]
    fn snapshot_roundtrip_restores_seed_scores_and_deal() {
        let mut state = MatchState::with_seed(PlayerPosition::North, 123).unwrap();
        state.start_next_round().unwrap();
        state.scores_mut().set_totals([4, 7]);
        let snapshot = MatchSnapshot::capture(&state);
        let restored = snapshot.clone().restore().unwrap();
        assert_eq!(restored.seed(), 123);
        assert_eq!(restored.scores().standings(), &snapshot.scores);
        assert_eq!(restored.dealer(), PlayerPosition::East);
        assert_eq!(restored.round_number(), 2);
        assert_eq!(restored.round().kitty(), state.round().kitty());
    }

    #[test]
    fn restore_reopens_bidding_even_when_trump_was_called() {
        let mut state = MatchState::with_seed(PlayerPosition::South, 41).unwrap();
        let round = state.round_mut();
        round.accept_trump(PlayerPosition::West, true).unwrap();
        let discard = round.hand(PlayerPosition::South).cards()[0];
        round.exchange(discard).unwrap();

        let snapshot = MatchSnapshot::capture(&state);
        assert!(snapshot.trump.is_some());

        let restored = snapshot.restore().unwrap();
        assert_eq!(restored.round().trump(), None);
        assert!(restored.round().bidding().is_some());
        assert_eq!(restored.round().to_act(), Some(PlayerPosition::West));
    }

    #[test]
    fn snapshot_from_json_fills_optional_fields() {
        let minimal = r#"{
            "seed": 7,
            "round_number": 3,
            "dealer": "South",
            "scores": [2, 9]
        }"#;

        let snapshot = MatchSnapshot::from_json(minimal).unwrap();
        assert_eq!(snapshot.round_number, 3);
        assert_eq!(snapshot.scores, [2, 9]);
        assert_eq!(snapshot.trump, None);
        assert_eq!(snapshot.target, 10);
    }
}

use crate::model::deck::{DealError, Deck};
use crate::model::player::PlayerPosition;
use crate::model::round::RoundState;
use crate::model::score::{HandScore, ScoreBoard, TARGET_SCORE};
use crate::model::team::Team;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Debug, Clone)]
pub struct MatchState {
    scores: ScoreBoard,
    dealer: PlayerPosition,
    round_number: u32,
    current_round: RoundState,
    round_scored: bool,
    rng: StdRng,
    seed: u64,
}

impl MatchState {
    pub fn with_seed(dealer: PlayerPosition, seed: u64) -> Result<Self, DealError> {
        Self::with_seed_round_dealer(seed, 1, dealer, TARGET_SCORE)
    }

    /// Rebuilds the match as it stood at the start of `round_number`. Earlier
    /// shuffles are replayed so the deck matches an uninterrupted run.
    pub fn with_seed_round_dealer(
        seed: u64,
        round_number: u32,
        dealer: PlayerPosition,
        target: u32,
    ) -> Result<Self, DealError> {
        let normalized_round = round_number.max(1);
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 1..normalized_round {
            let _ = Deck::shuffled(&mut rng);
        }

        let deck = Deck::shuffled(&mut rng);
        let current_round = RoundState::deal(&deck, dealer)?;

        Ok(Self {
            scores: ScoreBoard::with_target(target),
            dealer,
            round_number: normalized_round,
            current_round,
            round_scored: false,
            rng,
            seed,
        })
    }

    /// Starts a match from an already dealt first round. Later rounds are
    /// shuffled from `seed`.
    pub fn with_round(round: RoundState, seed: u64, target: u32) -> Self {
        Self {
            scores: ScoreBoard::with_target(target),
            dealer: round.dealer(),
            round_number: 1,
            current_round: round,
            round_scored: false,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn from_snapshot(
        snapshot: &crate::game::serialization::MatchSnapshot,
    ) -> Result<Self, DealError> {
        let mut state = MatchState::with_seed_round_dealer(
            snapshot.seed,
            snapshot.round_number,
            snapshot.dealer,
            snapshot.target,
        )?;
        state.scores_mut().set_totals(snapshot.scores);
        Ok(state)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn scores_mut(&mut self) -> &mut ScoreBoard {
        &mut self.scores
    }

    pub fn round(&self) -> &RoundState {
        &self.current_round
    }

    pub fn round_mut(&mut self) -> &mut RoundState {
        &mut self.current_round
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    pub fn is_match_over(&self) -> bool {
        self.scores.is_match_over()
    }

    pub fn winner(&self) -> Option<Team> {
        self.scores.winner()
    }

    pub fn is_round_ready_for_scoring(&self) -> bool {
        !self.round_scored
            && self.current_round.is_complete()
            && self.current_round.makers().is_some()
    }

    /// Credits the finished round to the scoreboard. Returns `None` while the
    /// round is still in progress.
    pub fn score_round(&mut self) -> Option<(Team, HandScore)> {
        if !self.is_round_ready_for_scoring() {
            return None;
        }
        let makers = self.current_round.makers()?;
        let maker_tricks = self.current_round.team_tricks(makers);
        self.round_scored = true;
        Some(
            self.scores
                .apply_hand(makers, maker_tricks, self.current_round.is_alone()),
        )
    }

    /// Moves the deal one seat clockwise and deals a fresh round.
    pub fn start_next_round(&mut self) -> Result<(), DealError> {
        let next_dealer = self.dealer.next();
        let deck = Deck::shuffled(&mut self.rng);
        self.current_round = RoundState::deal(&deck, next_dealer)?;
        self.round_scored = false;
        self.dealer = next_dealer;
        self.round_number += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MatchState;
    use crate::model::player::PlayerPosition;
    use crate::model::suit::Suit;
    use crate::model::team::Team;

    fn play_out(state: &mut MatchState) {
        let round = state.round_mut();
        for seat in [
            PlayerPosition::East,
            PlayerPosition::South,
            PlayerPosition::West,
            PlayerPosition::North,
        ] {
            round.accept_trump(seat, false).unwrap();
        }
        let exposed = round.exposed_card().unwrap().suit;
        let named = Suit::ALL.into_iter().find(|s| *s != exposed).unwrap();
        round.name_trump(PlayerPosition::East, Some(named)).unwrap();
        round.declare_alone(PlayerPosition::East, false).unwrap();
        while let Some(seat) = round.to_act() {
            let card = round.legal_cards(seat)[0];
            round.play_card(seat, card).unwrap();
        }
    }

    #[test]
    fn new_match_starts_at_round_one() {
        let state = MatchState::with_seed(PlayerPosition::North, 0).unwrap();
        assert_eq!(state.round_number(), 1);
        assert_eq!(state.dealer(), PlayerPosition::North);
        assert_eq!(state.scores().standings(), &[0, 0]);
        assert!(!state.is_round_ready_for_scoring());
    }

    #[test]
    fn scoring_then_next_round_rotates_dealer() {
        let mut state = MatchState::with_seed(PlayerPosition::North, 5).unwrap();
        play_out(&mut state);
        assert!(state.is_round_ready_for_scoring());
        let (team, result) = state.score_round().unwrap();
        assert_eq!(state.scores().score(team), result.points);
        assert_eq!(state.scores().score(team.other()), 0);
        assert_eq!(state.score_round(), None, "a round scores once");

        state.start_next_round().unwrap();
        assert_eq!(state.round_number(), 2);
        assert_eq!(state.dealer(), PlayerPosition::East);
        assert_eq!(state.round().dealer(), PlayerPosition::East);
        assert_eq!(state.round().to_act(), Some(PlayerPosition::South));
        assert_eq!(state.score_round(), None);
    }

    #[test]
    fn same_seed_replays_the_same_deals() {
        let mut a = MatchState::with_seed(PlayerPosition::West, 77).unwrap();
        let mut b = MatchState::with_seed(PlayerPosition::West, 77).unwrap();
        a.start_next_round().unwrap();
        b.start_next_round().unwrap();
        for seat in PlayerPosition::LOOP {
            assert_eq!(a.round().hand(seat), b.round().hand(seat));
        }

        let resumed = MatchState::with_seed_round_dealer(77, 2, PlayerPosition::North, 10).unwrap();
        assert_eq!(resumed.round().kitty(), a.round().kitty());
        assert!(!resumed.is_match_over());
        assert_eq!(resumed.winner(), None::<Team>);
    }
}

use crate::game::events::GameEvent;
use crate::game::table::TableError;
use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::round::RoundState;
use crate::model::score::ScoreBoard;
use crate::model::suit::Suit;
use crate::model::team::Team;
use crate::model::trick::Play;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Kind of decision-maker behind a seat. Reported for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatKind {
    Human,
    Heuristic,
    ExternalSearch,
}

impl SeatKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SeatKind::Human => "human",
            SeatKind::Heuristic => "heuristic",
            SeatKind::ExternalSearch => "external_search",
        }
    }
}

impl fmt::Display for SeatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one seat is allowed to see when asked for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub seat: PlayerPosition,
    pub hand: Vec<Card>,
    pub dealer: PlayerPosition,
    pub exposed: Option<Card>,
    pub trump: Option<Suit>,
    pub caller: Option<PlayerPosition>,
    pub alone: bool,
    pub sitting_out: Option<PlayerPosition>,
    pub trick_leader: Option<PlayerPosition>,
    pub lead_suit: Option<Suit>,
    pub trick: Vec<Play>,
    pub tricks_completed: usize,
    pub tricks_won: [u8; 4],
    pub scores: [u32; 2],
    pub round_number: u32,
}

impl SeatView {
    pub fn capture(
        round: &RoundState,
        seat: PlayerPosition,
        scores: &ScoreBoard,
        round_number: u32,
    ) -> Self {
        let trick = round.current_trick();
        Self {
            seat,
            hand: round.hand(seat).cards().to_vec(),
            dealer: round.dealer(),
            exposed: round.exposed_card(),
            trump: round.trump(),
            caller: round.caller(),
            alone: round.is_alone(),
            sitting_out: round.sitting_out(),
            trick_leader: trick.map(|t| t.leader()),
            lead_suit: trick.and_then(|t| t.lead_suit()),
            trick: trick.map(|t| t.plays().to_vec()).unwrap_or_default(),
            tricks_completed: round.tricks_completed(),
            tricks_won: round.all_tricks_won(),
            scores: *scores.standings(),
            round_number,
        }
    }

    pub fn team(&self) -> Team {
        self.seat.team()
    }

    pub fn partner(&self) -> PlayerPosition {
        self.seat.partner()
    }

    pub fn is_leading(&self) -> bool {
        self.trick.is_empty()
    }

    pub fn card_of(&self, seat: PlayerPosition) -> Option<Card> {
        self.trick
            .iter()
            .find(|play| play.position == seat)
            .map(|play| play.card)
    }

    pub fn team_score(&self, team: Team) -> u32 {
        self.scores[team.index()]
    }
}

/// Decision interface for one seat at the table.
///
/// Every call is synchronous. The table validates each answer; an illegal
/// answer is reported through [`Seat::rejected`] and the same decision is
/// requested again.
pub trait Seat {
    fn kind(&self) -> SeatKind;

    /// Whether to order up the turned card's suit.
    fn accept_trump(&mut self, view: &SeatView, exposed: Card) -> bool;

    /// Suit to name after the turned card went down, or `None` to pass.
    /// When `forced` is set the dealer is stuck and must name a suit.
    fn choose_trump(&mut self, view: &SeatView, exposed: Card, forced: bool) -> Option<Suit>;

    /// Dealer's discard after picking up `exposed`. Must come from the hand
    /// held before the pickup.
    fn choose_discard(&mut self, view: &SeatView, exposed: Card) -> Card;

    fn choose_play(&mut self, view: &SeatView, legal: &[Card]) -> Card;

    fn go_alone(&mut self, view: &SeatView) -> bool;

    fn rejected(&mut self, _view: &SeatView, _error: &TableError) {}

    fn notify(&mut self, _view: &SeatView, _event: &GameEvent) {}
}

impl<S: Seat + ?Sized> Seat for Box<S> {
    fn kind(&self) -> SeatKind {
        (**self).kind()
    }

    fn accept_trump(&mut self, view: &SeatView, exposed: Card) -> bool {
        (**self).accept_trump(view, exposed)
    }

    fn choose_trump(&mut self, view: &SeatView, exposed: Card, forced: bool) -> Option<Suit> {
        (**self).choose_trump(view, exposed, forced)
    }

    fn choose_discard(&mut self, view: &SeatView, exposed: Card) -> Card {
        (**self).choose_discard(view, exposed)
    }

    fn choose_play(&mut self, view: &SeatView, legal: &[Card]) -> Card {
        (**self).choose_play(view, legal)
    }

    fn go_alone(&mut self, view: &SeatView) -> bool {
        (**self).go_alone(view)
    }

    fn rejected(&mut self, view: &SeatView, error: &TableError) {
        (**self).rejected(view, error)
    }

    fn notify(&mut self, view: &SeatView, event: &GameEvent) {
        (**self).notify(view, event)
    }
}

#[cfg(test)]
mod tests {
    use super::{SeatKind, SeatView};
    use crate::model::card::Card;
    use crate::model::deck::Deck;
    use crate::model::player::PlayerPosition;
    use crate::model::round::RoundState;
    use crate::model::score::ScoreBoard;

    #[test]
    fn view_exposes_only_own_hand() {
        let deck = Deck::shuffled_with_seed(11);
        let round = RoundState::deal(&deck, PlayerPosition::North).unwrap();
        let view = SeatView::capture(&round, PlayerPosition::South, &ScoreBoard::new(), 1);
        assert_eq!(view.hand, round.hand(PlayerPosition::South).cards());
        assert_eq!(view.exposed, round.exposed_card());
        assert_eq!(view.trump, None);
        assert!(view.is_leading());
        assert_eq!(view.partner(), PlayerPosition::North);

        let json = serde_json::to_string(&view).unwrap();
        for seat in [PlayerPosition::North, PlayerPosition::East, PlayerPosition::West] {
            for card in round.hand(seat).iter() {
                let label: Card = *card;
                let encoded = serde_json::to_string(&label).unwrap();
                if Some(label) != view.exposed {
                    assert!(!json.contains(&encoded), "{label} leaked into view");
                }
            }
        }
    }

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(SeatKind::ExternalSearch.to_string(), "external_search");
        assert_eq!(
            serde_json::to_string(&SeatKind::Heuristic).unwrap(),
            "\"heuristic\""
        );
    }
}

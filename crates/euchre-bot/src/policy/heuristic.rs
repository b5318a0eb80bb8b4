use crate::bot::{BidPlanner, HeuristicParams, PlayPlanner};
use euchre_core::game::seat::{Seat, SeatKind, SeatView};
use euchre_core::game::table::TableError;
use euchre_core::model::card::Card;
use euchre_core::model::rank::Rank;
use euchre_core::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, event};

/// Seat driven by [`BidPlanner`] and [`PlayPlanner`].
pub struct HeuristicPolicy {
    params: HeuristicParams,
    rng: StdRng,
}

impl HeuristicPolicy {
    pub fn new(params: HeuristicParams, rng: StdRng) -> Self {
        Self { params, rng }
    }

    pub fn with_seed(params: HeuristicParams, seed: u64) -> Self {
        Self::new(params, StdRng::seed_from_u64(seed))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_seed(HeuristicParams::default(), seed)
    }

    pub fn params(&self) -> &HeuristicParams {
        &self.params
    }
}

impl Seat for HeuristicPolicy {
    fn kind(&self) -> SeatKind {
        SeatKind::Heuristic
    }

    fn accept_trump(&mut self, view: &SeatView, exposed: Card) -> bool {
        let accepted = BidPlanner::should_accept(&view.hand, exposed, &self.params, &mut self.rng);
        event!(
            target: "euchre_bot::heuristic",
            Level::DEBUG,
            seat = %view.seat,
            exposed = %exposed,
            trump_count = BidPlanner::trump_count(&view.hand, exposed.suit),
            chance = BidPlanner::acceptance_chance(&view.hand, exposed, &self.params),
            accepted,
            "accept_decision"
        );
        accepted
    }

    fn choose_trump(&mut self, view: &SeatView, exposed: Card, forced: bool) -> Option<Suit> {
        let named = BidPlanner::choose_trump(&view.hand, exposed, forced, &self.params);
        let strength = BidPlanner::strongest_suit(&view.hand, exposed.suit)
            .map(|(_, strength)| strength)
            .unwrap_or(0);
        event!(
            target: "euchre_bot::heuristic",
            Level::DEBUG,
            seat = %view.seat,
            forced,
            strength,
            threshold = self.params.name_threshold,
            named = ?named,
            "name_decision"
        );
        named
    }

    fn choose_discard(&mut self, view: &SeatView, exposed: Card) -> Card {
        let discard = BidPlanner::choose_discard(&view.hand, exposed).unwrap_or(exposed);
        event!(
            target: "euchre_bot::heuristic",
            Level::DEBUG,
            seat = %view.seat,
            exposed = %exposed,
            discard = %discard,
            "discard_decision"
        );
        discard
    }

    fn choose_play(&mut self, view: &SeatView, legal: &[Card]) -> Card {
        let (chosen, reason) = match PlayPlanner::choose(legal, view, &self.params) {
            Some(card) => (card, "heuristic_play"),
            None => (fallback_card(view, legal), "fallback_first_legal"),
        };
        log_play_decision(view, legal, chosen, reason);
        chosen
    }

    fn go_alone(&mut self, view: &SeatView) -> bool {
        let Some(trump) = view.trump else {
            return false;
        };
        BidPlanner::should_go_alone(&view.hand, trump, &self.params)
    }

    fn rejected(&mut self, view: &SeatView, error: &TableError) {
        event!(
            target: "euchre_bot::heuristic",
            Level::WARN,
            seat = %view.seat,
            error = %error,
            "decision_rejected"
        );
    }
}

fn fallback_card(view: &SeatView, legal: &[Card]) -> Card {
    legal
        .first()
        .or_else(|| view.hand.first())
        .copied()
        .unwrap_or(Card::new(Rank::Nine, Suit::Clubs))
}

fn log_play_decision(view: &SeatView, legal: &[Card], chosen: Card, reason: &str) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    let legal_preview = legal
        .iter()
        .map(|card| card.to_string())
        .collect::<Vec<_>>()
        .join(",");

    event!(
        target: "euchre_bot::heuristic",
        Level::DEBUG,
        seat = %view.seat,
        trump = ?view.trump,
        lead = ?view.lead_suit,
        legal_count = legal.len(),
        legal_moves = %legal_preview,
        chosen = %chosen,
        trick_cards = view.trick.len(),
        reason,
        "play_decision"
    );
}

#[cfg(test)]
mod tests {
    use super::HeuristicPolicy;
    use crate::bot::HeuristicParams;
    use euchre_core::game::seat::Seat;
    use euchre_core::game::seat::SeatView;
    use euchre_core::model::card::Card;
    use euchre_core::model::deck::Deck;
    use euchre_core::model::player::PlayerPosition;
    use euchre_core::model::round::RoundState;
    use euchre_core::model::score::ScoreBoard;

    fn opening_view(seed: u64) -> (RoundState, SeatView) {
        let deck = Deck::shuffled_with_seed(seed);
        let round = RoundState::deal(&deck, PlayerPosition::North).unwrap();
        let view = SeatView::capture(&round, PlayerPosition::East, &ScoreBoard::new(), 1);
        (round, view)
    }

    #[test]
    fn same_seed_gives_same_acceptance_sequence() {
        let (round, view) = opening_view(3);
        let exposed = round.exposed_card().unwrap();
        let mut a = HeuristicPolicy::seeded(17);
        let mut b = HeuristicPolicy::seeded(17);
        for _ in 0..50 {
            assert_eq!(a.accept_trump(&view, exposed), b.accept_trump(&view, exposed));
        }
    }

    #[test]
    fn discard_comes_from_the_hand() {
        let (round, view) = opening_view(12);
        let exposed = round.exposed_card().unwrap();
        let mut policy = HeuristicPolicy::seeded(1);
        let discard = policy.choose_discard(&view, exposed);
        assert!(view.hand.contains(&discard));
    }

    #[test]
    fn forced_naming_always_returns_another_suit() {
        for seed in 0..20 {
            let (round, view) = opening_view(seed);
            let exposed = round.exposed_card().unwrap();
            let mut policy = HeuristicPolicy::seeded(seed);
            let named = policy.choose_trump(&view, exposed, true);
            assert!(named.is_some());
            assert_ne!(named, Some(exposed.suit));
        }
    }

    #[test]
    fn never_goes_alone_by_default() {
        let (_, mut view) = opening_view(5);
        view.trump = Some(view.hand[0].suit);
        let mut policy = HeuristicPolicy::with_seed(HeuristicParams::default(), 0);
        assert!(!policy.go_alone(&view));
        assert_eq!(policy.params().go_alone_min_trump, None);
    }

    #[test]
    fn play_falls_back_without_trump() {
        let (_, view) = opening_view(9);
        let legal: Vec<Card> = view.hand.clone();
        let mut policy = HeuristicPolicy::seeded(2);
        assert_eq!(policy.choose_play(&view, &legal), legal[0]);
    }
}

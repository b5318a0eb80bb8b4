use super::params::HeuristicParams;
use euchre_core::model::card::Card;
use euchre_core::model::suit::Suit;
use rand::Rng;

/// Trump-calling decisions made from the seat's own cards.
pub struct BidPlanner;

impl BidPlanner {
    pub fn trump_count(hand: &[Card], trump: Suit) -> usize {
        hand.iter().filter(|card| card.is_trump(trump)).count()
    }

    pub fn acceptance_chance(hand: &[Card], exposed: Card, params: &HeuristicParams) -> f64 {
        params.acceptance_for(Self::trump_count(hand, exposed.suit))
    }

    /// Orders up with a probability that grows with the trump already held.
    pub fn should_accept<R: Rng + ?Sized>(
        hand: &[Card],
        exposed: Card,
        params: &HeuristicParams,
        rng: &mut R,
    ) -> bool {
        let chance = Self::acceptance_chance(hand, exposed, params);
        rng.gen_range(0.0..1.0) < chance
    }

    /// Summed power of the hand if `trump` were called.
    pub fn suit_strength(hand: &[Card], trump: Suit) -> u32 {
        hand.iter()
            .map(|card| u32::from(card.power(trump, None)))
            .sum()
    }

    /// Strongest suit other than the turned-down one. Ties keep the earlier
    /// suit in Clubs, Diamonds, Hearts, Spades order.
    pub fn strongest_suit(hand: &[Card], excluded: Suit) -> Option<(Suit, u32)> {
        let mut best: Option<(Suit, u32)> = None;
        for suit in Suit::ALL.into_iter().filter(|suit| *suit != excluded) {
            let strength = Self::suit_strength(hand, suit);
            match best {
                Some((_, best_strength)) if strength <= best_strength => {}
                _ => best = Some((suit, strength)),
            }
        }
        best
    }

    pub fn choose_trump(
        hand: &[Card],
        exposed: Card,
        forced: bool,
        params: &HeuristicParams,
    ) -> Option<Suit> {
        let (suit, strength) = Self::strongest_suit(hand, exposed.suit)?;
        if forced || strength >= params.name_threshold {
            Some(suit)
        } else {
            None
        }
    }

    /// Weakest card should `exposed`'s suit become trump. Ties keep the
    /// earlier card.
    pub fn choose_discard(hand: &[Card], exposed: Card) -> Option<Card> {
        let trump = exposed.suit;
        let mut weakest: Option<Card> = None;
        for card in hand {
            match weakest {
                Some(current) if card.power(trump, None) >= current.power(trump, None) => {}
                _ => weakest = Some(*card),
            }
        }
        weakest
    }

    pub fn should_go_alone(hand: &[Card], trump: Suit, params: &HeuristicParams) -> bool {
        params
            .go_alone_min_trump
            .is_some_and(|minimum| Self::trump_count(hand, trump) >= minimum)
    }
}

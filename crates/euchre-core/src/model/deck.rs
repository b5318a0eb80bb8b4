use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::array;
use thiserror::Error;

pub const DECK_SIZE: usize = 24;
pub const HAND_SIZE: usize = 5;
pub const KITTY_SIZE: usize = DECK_SIZE - HAND_SIZE * 4;

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

/// Result of dealing a deck: five cards per seat and the kitty.
#[derive(Debug, Clone)]
pub struct Deal {
    pub hands: [Hand; 4],
    pub kitty: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DealError {
    #[error("deck holds {found} cards but a deal needs {expected}")]
    WrongSize { expected: usize, found: usize },
    #[error("card {0} appears more than once in the deck")]
    Duplicate(Card),
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL.iter().copied() {
            for rank in Rank::ORDERED.iter().copied() {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    /// Builds a deck in a fixed order. Used by tests and replays.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Deals one card at a time to each seat, starting left of the dealer,
    /// until every seat holds five. The remaining four cards form the kitty,
    /// the first of which is the card turned up for bidding.
    pub fn deal(&self, dealer: PlayerPosition) -> Result<Deal, DealError> {
        if self.cards.len() != DECK_SIZE {
            return Err(DealError::WrongSize {
                expected: DECK_SIZE,
                found: self.cards.len(),
            });
        }
        for (index, card) in self.cards.iter().enumerate() {
            if self.cards[..index].contains(card) {
                return Err(DealError::Duplicate(*card));
            }
        }

        let mut hands: [Hand; 4] = array::from_fn(|_| Hand::new());
        let mut cards = self.cards.iter().copied();
        for _ in 0..HAND_SIZE {
            let mut seat = dealer.next();
            for _ in 0..4 {
                if let Some(card) = cards.next() {
                    hands[seat.index()].add(card);
                }
                seat = seat.next();
            }
        }
        let kitty: Vec<Card> = cards.collect();

        Ok(Deal { hands, kitty })
    }
}

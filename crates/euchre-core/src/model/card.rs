use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Power of the Jack of trump.
pub const RIGHT_BOWER_POWER: u8 = 100;
/// Power of the Jack of trump's colour twin.
pub const LEFT_BOWER_POWER: u8 = 95;
/// Upper bound of every power value; strategies normalise against it.
pub const MAX_POWER: u8 = RIGHT_BOWER_POWER;

const TRUMP_BASE: u8 = 65;
const LEAD_BASE: u8 = 30;
const RANK_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn is_right_bower(self, trump: Suit) -> bool {
        self.rank == Rank::Jack && self.suit == trump
    }

    pub fn is_left_bower(self, trump: Suit) -> bool {
        self.rank == Rank::Jack && self.suit == trump.twin()
    }

    /// Suit used for following and for deciding the suit of a trick.
    pub fn effective_suit(self, trump: Suit) -> Suit {
        if self.is_left_bower(trump) {
            trump
        } else {
            self.suit
        }
    }

    pub fn is_trump(self, trump: Suit) -> bool {
        self.effective_suit(trump) == trump
    }

    /// Strength of this card inside a trick. Only meaningful for comparing
    /// cards played under the same trump and lead.
    ///
    /// Bands, highest first: right bower, left bower, remaining trump,
    /// cards of the led suit, everything else. Inside a band cards keep the
    /// natural rank order so that even losing cards stay comparable.
    pub fn power(self, trump: Suit, lead: Option<Suit>) -> u8 {
        if self.is_right_bower(trump) {
            return RIGHT_BOWER_POWER;
        }
        if self.is_left_bower(trump) {
            return LEFT_BOWER_POWER;
        }
        let step = trump_step(self.rank);
        if self.suit == trump {
            return TRUMP_BASE + step * RANK_STEP;
        }
        if lead == Some(self.suit) {
            return LEAD_BASE + self.rank.ordinal() * RANK_STEP;
        }
        self.rank.ordinal()
    }

    /// Parses labels such as `JS`, `10h` or `9c`.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        let suit = label.chars().last()?;
        let rank = &label[..label.len() - suit.len_utf8()];
        if rank.is_empty() {
            return None;
        }
        let suit = Suit::from_symbol(suit.encode_utf8(&mut [0u8; 4]))?;
        Some(Card::new(Rank::from_symbol(rank)?, suit))
    }
}

// Trump ranks skip the Jack, which is always a bower.
const fn trump_step(rank: Rank) -> u8 {
    match rank {
        Rank::Nine => 1,
        Rank::Ten => 2,
        Rank::Queen => 3,
        Rank::King => 4,
        Rank::Ace => 5,
        Rank::Jack => 6,
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

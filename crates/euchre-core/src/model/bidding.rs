use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage of the trump negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiddingPhase {
    /// Seats may order the turned-up card's suit as trump.
    Accept,
    /// Seats may name any other suit.
    Name,
    /// The dealer must name a suit ("stick the dealer").
    Force,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// The turned-up suit was accepted; the dealer picks the card up.
    OrderedUp,
    Named,
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub trump: Suit,
    pub caller: PlayerPosition,
    pub kind: CallKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    Passed,
    /// Every seat passed the current round; the next phase has begun.
    Advanced(BiddingPhase),
    Called(Call),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BiddingError {
    #[error("bidding is not in the {expected:?} phase (currently {actual:?})")]
    WrongPhase {
        expected: BiddingPhase,
        actual: BiddingPhase,
    },
    #[error("expected {expected} to bid but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{0} was turned down and cannot be named")]
    TurnedDownSuit(Suit),
    #[error("the dealer must name a trump suit")]
    DealerMustName,
    #[error("dealer does not hold {0}")]
    CardNotInHand(Card),
    #[error("only the caller {caller} may decide to go alone, not {actual}")]
    NotCaller {
        caller: PlayerPosition,
        actual: PlayerPosition,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bidding {
    dealer: PlayerPosition,
    exposed: Card,
    phase: BiddingPhase,
    turn: PlayerPosition,
    passes: u8,
    call: Option<Call>,
}

impl Bidding {
    pub fn new(dealer: PlayerPosition, exposed: Card) -> Self {
        Self {
            dealer,
            exposed,
            phase: BiddingPhase::Accept,
            turn: dealer.next(),
            passes: 0,
            call: None,
        }
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    pub fn exposed(&self) -> Card {
        self.exposed
    }

    pub fn phase(&self) -> BiddingPhase {
        self.phase
    }

    pub fn call(&self) -> Option<Call> {
        self.call
    }

    /// Seat whose decision is outstanding.
    pub fn to_act(&self) -> Option<PlayerPosition> {
        match self.phase {
            BiddingPhase::Complete => None,
            _ => Some(self.turn),
        }
    }

    pub fn accept(
        &mut self,
        seat: PlayerPosition,
        accepted: bool,
    ) -> Result<BidOutcome, BiddingError> {
        self.expect_phase(BiddingPhase::Accept)?;
        self.expect_turn(seat)?;

        if accepted {
            return Ok(self.complete(seat, self.exposed.suit, CallKind::OrderedUp));
        }
        Ok(self.pass(BiddingPhase::Name))
    }

    /// Names a trump suit, or passes with `None`. During the forced round the
    /// dealer may not pass.
    pub fn name(
        &mut self,
        seat: PlayerPosition,
        suit: Option<Suit>,
    ) -> Result<BidOutcome, BiddingError> {
        if !matches!(self.phase, BiddingPhase::Name | BiddingPhase::Force) {
            return Err(BiddingError::WrongPhase {
                expected: BiddingPhase::Name,
                actual: self.phase,
            });
        }
        self.expect_turn(seat)?;

        match suit {
            Some(suit) if suit == self.exposed.suit => Err(BiddingError::TurnedDownSuit(suit)),
            Some(suit) => {
                let kind = if self.phase == BiddingPhase::Force {
                    CallKind::Forced
                } else {
                    CallKind::Named
                };
                Ok(self.complete(seat, suit, kind))
            }
            None if self.phase == BiddingPhase::Force => Err(BiddingError::DealerMustName),
            None => Ok(self.pass(BiddingPhase::Force)),
        }
    }

    fn pass(&mut self, next_phase: BiddingPhase) -> BidOutcome {
        self.passes += 1;
        if self.passes < 4 {
            self.turn = self.turn.next();
            return BidOutcome::Passed;
        }

        self.passes = 0;
        self.phase = next_phase;
        self.turn = match next_phase {
            BiddingPhase::Force => self.dealer,
            _ => self.dealer.next(),
        };
        BidOutcome::Advanced(next_phase)
    }

    fn complete(&mut self, caller: PlayerPosition, trump: Suit, kind: CallKind) -> BidOutcome {
        let call = Call {
            trump,
            caller,
            kind,
        };
        self.phase = BiddingPhase::Complete;
        self.call = Some(call);
        BidOutcome::Called(call)
    }

    fn expect_phase(&self, expected: BiddingPhase) -> Result<(), BiddingError> {
        if self.phase != expected {
            return Err(BiddingError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn expect_turn(&self, seat: PlayerPosition) -> Result<(), BiddingError> {
        if self.turn != seat {
            return Err(BiddingError::OutOfTurn {
                expected: self.turn,
                actual: seat,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BidOutcome, Bidding, BiddingError, BiddingPhase, CallKind};
    use crate::model::card::Card;
    use crate::model::player::PlayerPosition;
    use crate::model::suit::Suit;

    fn jack_of_spades() -> Card {
        Card::parse("JS").unwrap()
    }

    #[test]
    fn first_acceptance_orders_up_exposed_suit() {
        let mut bidding = Bidding::new(PlayerPosition::North, jack_of_spades());
        assert_eq!(bidding.to_act(), Some(PlayerPosition::East));
        let outcome = bidding.accept(PlayerPosition::East, true).unwrap();
        let BidOutcome::Called(call) = outcome else {
            panic!("expected a call, got {outcome:?}");
        };
        assert_eq!(call.trump, Suit::Spades);
        assert_eq!(call.caller, PlayerPosition::East);
        assert_eq!(call.kind, CallKind::OrderedUp);
        assert_eq!(bidding.phase(), BiddingPhase::Complete);
        assert_eq!(bidding.to_act(), None);
    }

    #[test]
    fn four_passes_move_to_naming_from_left_of_dealer() {
        let mut bidding = Bidding::new(PlayerPosition::South, jack_of_spades());
        let order = [
            PlayerPosition::West,
            PlayerPosition::North,
            PlayerPosition::East,
            PlayerPosition::South,
        ];
        for (i, seat) in order.iter().copied().enumerate() {
            let outcome = bidding.accept(seat, false).unwrap();
            if i < 3 {
                assert_eq!(outcome, BidOutcome::Passed);
            } else {
                assert_eq!(outcome, BidOutcome::Advanced(BiddingPhase::Name));
            }
        }
        assert_eq!(bidding.phase(), BiddingPhase::Name);
        assert_eq!(bidding.to_act(), Some(PlayerPosition::West));
    }

    #[test]
    fn naming_rejects_turned_down_suit() {
        let mut bidding = Bidding::new(PlayerPosition::North, jack_of_spades());
        for seat in [
            PlayerPosition::East,
            PlayerPosition::South,
            PlayerPosition::West,
            PlayerPosition::North,
        ] {
            bidding.accept(seat, false).unwrap();
        }
        assert_eq!(
            bidding.name(PlayerPosition::East, Some(Suit::Spades)),
            Err(BiddingError::TurnedDownSuit(Suit::Spades))
        );
        let outcome = bidding
            .name(PlayerPosition::East, Some(Suit::Hearts))
            .unwrap();
        assert!(matches!(
            outcome,
            BidOutcome::Called(call) if call.trump == Suit::Hearts && call.kind == CallKind::Named
        ));
    }

    #[test]
    fn dealer_is_stuck_after_two_rounds_of_passes() {
        let mut bidding = Bidding::new(PlayerPosition::West, jack_of_spades());
        let order = [
            PlayerPosition::North,
            PlayerPosition::East,
            PlayerPosition::South,
            PlayerPosition::West,
        ];
        for seat in order {
            bidding.accept(seat, false).unwrap();
        }
        for seat in order {
            bidding.name(seat, None).unwrap();
        }
        assert_eq!(bidding.phase(), BiddingPhase::Force);
        assert_eq!(bidding.to_act(), Some(PlayerPosition::West));
        assert_eq!(
            bidding.name(PlayerPosition::West, None),
            Err(BiddingError::DealerMustName)
        );
        let outcome = bidding
            .name(PlayerPosition::West, Some(Suit::Clubs))
            .unwrap();
        assert!(matches!(
            outcome,
            BidOutcome::Called(call)
                if call.caller == PlayerPosition::West && call.kind == CallKind::Forced
        ));
    }

    #[test]
    fn out_of_turn_and_wrong_phase_are_rejected() {
        let mut bidding = Bidding::new(PlayerPosition::North, jack_of_spades());
        assert!(matches!(
            bidding.accept(PlayerPosition::South, true),
            Err(BiddingError::OutOfTurn { .. })
        ));
        assert!(matches!(
            bidding.name(PlayerPosition::East, Some(Suit::Hearts)),
            Err(BiddingError::WrongPhase { .. })
        ));
    }
}

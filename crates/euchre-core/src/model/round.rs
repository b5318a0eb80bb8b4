use crate::model::bidding::{BidOutcome, Bidding, BiddingError, BiddingPhase, Call, CallKind};
use crate::model::card::Card;
use crate::model::deck::{Deal, DealError, Deck, HAND_SIZE, KITTY_SIZE};
use crate::model::hand::Hand;
use crate::model::legality::legal_cards;
use crate::model::player::PlayerPosition;
use crate::model::score::TRICKS_PER_HAND;
use crate::model::suit::Suit;
use crate::model::team::{Team, TeamRole};
use crate::model::trick::{Trick, TrickError};
use thiserror::Error;

/// State of a single hand of euchre, from the deal to the fifth trick.
#[derive(Debug, Clone)]
pub struct RoundState {
    hands: [Hand; 4],
    kitty: Vec<Card>,
    exposed: Option<Card>,
    dealer: PlayerPosition,
    phase: RoundPhase,
    call: Option<Call>,
    alone: bool,
    sitting_out: Option<PlayerPosition>,
    current_trick: Option<Trick>,
    trick_history: Vec<(Trick, PlayerPosition)>,
    tricks_won: [u8; 4],
}

#[derive(Debug, Clone)]
pub enum RoundPhase {
    Bidding(Bidding),
    /// Trump was ordered up; the dealer owes a discard for the turned-up card.
    DealerExchange(Call),
    /// Trump is fixed; the caller decides whether to play alone.
    GoAlone(Call),
    Playing,
    Complete,
}

impl RoundState {
    pub fn deal(deck: &Deck, dealer: PlayerPosition) -> Result<Self, DealError> {
        let Deal { hands, kitty } = deck.deal(dealer)?;
        Ok(Self::from_hands(hands, kitty, dealer))
    }

    /// Builds a round from explicit hands and kitty. The first kitty card is
    /// the one turned up for bidding.
    pub fn from_hands(hands: [Hand; 4], kitty: Vec<Card>, dealer: PlayerPosition) -> Self {
        let exposed = kitty.first().copied();
        let phase = match exposed {
            Some(exposed) => RoundPhase::Bidding(Bidding::new(dealer, exposed)),
            None => RoundPhase::Complete,
        };
        Self {
            hands,
            kitty,
            exposed,
            dealer,
            phase,
            call: None,
            alone: false,
            sitting_out: None,
            current_trick: None,
            trick_history: Vec::with_capacity(TRICKS_PER_HAND as usize),
            tricks_won: [0; 4],
        }
    }

    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    pub fn hand(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn kitty(&self) -> &[Card] {
        &self.kitty
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    /// Card turned up for bidding.
    pub fn exposed_card(&self) -> Option<Card> {
        self.exposed
    }

    pub fn bidding(&self) -> Option<&Bidding> {
        match &self.phase {
            RoundPhase::Bidding(bidding) => Some(bidding),
            _ => None,
        }
    }

    pub fn call(&self) -> Option<Call> {
        self.call
    }

    pub fn trump(&self) -> Option<Suit> {
        self.call.map(|call| call.trump)
    }

    pub fn caller(&self) -> Option<PlayerPosition> {
        self.call.map(|call| call.caller)
    }

    pub fn makers(&self) -> Option<Team> {
        self.caller().map(PlayerPosition::team)
    }

    pub fn role(&self, team: Team) -> Option<TeamRole> {
        self.makers().map(|makers| {
            if makers == team {
                TeamRole::Maker
            } else {
                TeamRole::Defender
            }
        })
    }

    pub fn is_alone(&self) -> bool {
        self.alone
    }

    pub fn sitting_out(&self) -> Option<PlayerPosition> {
        self.sitting_out
    }

    pub fn current_trick(&self) -> Option<&Trick> {
        self.current_trick.as_ref()
    }

    pub fn trick_history(&self) -> &[(Trick, PlayerPosition)] {
        &self.trick_history
    }

    pub fn tricks_completed(&self) -> usize {
        self.trick_history.len()
    }

    pub fn tricks_won(&self, seat: PlayerPosition) -> u8 {
        self.tricks_won[seat.index()]
    }

    pub fn all_tricks_won(&self) -> [u8; 4] {
        self.tricks_won
    }

    pub fn team_tricks(&self, team: Team) -> u8 {
        team.members()
            .iter()
            .map(|seat| self.tricks_won(*seat))
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, RoundPhase::Complete)
    }

    /// Seat whose decision the round is waiting for.
    pub fn to_act(&self) -> Option<PlayerPosition> {
        match &self.phase {
            RoundPhase::Bidding(bidding) => bidding.to_act(),
            RoundPhase::DealerExchange(_) => Some(self.dealer),
            RoundPhase::GoAlone(call) => Some(call.caller),
            RoundPhase::Playing => self.current_trick.as_ref().and_then(Trick::next_to_play),
            RoundPhase::Complete => None,
        }
    }

    /// Every card currently held, buried, or played this hand.
    pub fn accounted_cards(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .hands
            .iter()
            .flat_map(|hand| hand.iter().copied())
            .collect();
        cards.extend(self.kitty.iter().copied());
        for (trick, _) in &self.trick_history {
            cards.extend(trick.plays().iter().map(|play| play.card));
        }
        if let Some(trick) = &self.current_trick {
            cards.extend(trick.plays().iter().map(|play| play.card));
        }
        cards
    }

    pub fn accept_trump(
        &mut self,
        seat: PlayerPosition,
        accepted: bool,
    ) -> Result<BidOutcome, BiddingError> {
        let outcome = match &mut self.phase {
            RoundPhase::Bidding(bidding) => bidding.accept(seat, accepted)?,
            _ => return Err(not_bidding(BiddingPhase::Accept)),
        };
        self.after_bid(outcome);
        Ok(outcome)
    }

    pub fn name_trump(
        &mut self,
        seat: PlayerPosition,
        suit: Option<Suit>,
    ) -> Result<BidOutcome, BiddingError> {
        let outcome = match &mut self.phase {
            RoundPhase::Bidding(bidding) => bidding.name(seat, suit)?,
            _ => return Err(not_bidding(BiddingPhase::Name)),
        };
        self.after_bid(outcome);
        Ok(outcome)
    }

    /// Dealer gives up `discard` and takes the turned-up card. The discard is
    /// buried in the kitty in the turned-up card's place.
    pub fn exchange(&mut self, discard: Card) -> Result<Card, BiddingError> {
        let call = match &self.phase {
            RoundPhase::DealerExchange(call) => *call,
            _ => return Err(not_bidding(BiddingPhase::Complete)),
        };
        let dealer_hand = &mut self.hands[self.dealer.index()];
        if !dealer_hand.remove(discard) {
            return Err(BiddingError::CardNotInHand(discard));
        }
        let taken = std::mem::replace(&mut self.kitty[0], discard);
        dealer_hand.add(taken);
        self.phase = RoundPhase::GoAlone(call);
        Ok(taken)
    }

    /// Caller's go-alone decision. Starts trick play.
    pub fn declare_alone(
        &mut self,
        seat: PlayerPosition,
        alone: bool,
    ) -> Result<Option<PlayerPosition>, BiddingError> {
        let call = match &self.phase {
            RoundPhase::GoAlone(call) => *call,
            _ => return Err(not_bidding(BiddingPhase::Complete)),
        };
        if seat != call.caller {
            return Err(BiddingError::NotCaller {
                caller: call.caller,
                actual: seat,
            });
        }

        self.alone = alone;
        self.sitting_out = alone.then(|| call.caller.partner());
        self.current_trick = Some(Trick::new(self.dealer.next(), self.sitting_out));
        self.phase = RoundPhase::Playing;
        Ok(self.sitting_out)
    }

    pub fn legal_cards(&self, seat: PlayerPosition) -> Vec<Card> {
        let Some(trump) = self.trump() else {
            return Vec::new();
        };
        let lead = self.current_trick.as_ref().and_then(Trick::lead_suit);
        legal_cards(self.hand(seat), lead, trump)
    }

    pub fn play_card(
        &mut self,
        seat: PlayerPosition,
        card: Card,
    ) -> Result<PlayOutcome, PlayError> {
        if !matches!(self.phase, RoundPhase::Playing) {
            return Err(PlayError::NotInPlayPhase);
        }
        let (Some(trump), Some(trick)) = (self.trump(), self.current_trick.as_mut()) else {
            return Err(PlayError::NotInPlayPhase);
        };

        if self.sitting_out == Some(seat) {
            return Err(PlayError::SittingOut(seat));
        }

        if !self.hands[seat.index()].contains(card) {
            return Err(PlayError::CardNotInHand(card));
        }

        if let Some(expected) = trick.next_to_play()
            && expected != seat
        {
            return Err(PlayError::OutOfTurn {
                expected,
                actual: seat,
            });
        }

        if let Some(lead) = trick.lead_suit()
            && !legal_cards(&self.hands[seat.index()], Some(lead), trump).contains(&card)
        {
            return Err(PlayError::MustFollowSuit(lead));
        }

        trick.play(seat, card).map_err(PlayError::Trick)?;
        self.hands[seat.index()].remove(card);

        if !trick.is_complete() {
            return Ok(PlayOutcome::Played);
        }

        let winner = trick.winner(trump).ok_or(PlayError::Unresolved)?;
        self.tricks_won[winner.index()] += 1;
        let next = Trick::new(winner, self.sitting_out);
        let finished = std::mem::replace(trick, next);
        self.trick_history.push((finished, winner));

        if self.trick_history.len() == HAND_SIZE {
            self.current_trick = None;
            self.phase = RoundPhase::Complete;
            return Ok(PlayOutcome::RoundComplete { winner });
        }
        Ok(PlayOutcome::TrickCompleted { winner })
    }

    fn after_bid(&mut self, outcome: BidOutcome) {
        if let BidOutcome::Called(call) = outcome {
            self.call = Some(call);
            self.phase = match call.kind {
                CallKind::OrderedUp => RoundPhase::DealerExchange(call),
                CallKind::Named | CallKind::Forced => RoundPhase::GoAlone(call),
            };
        }
    }
}

fn not_bidding(expected: BiddingPhase) -> BiddingError {
    BiddingError::WrongPhase {
        expected,
        actual: BiddingPhase::Complete,
    }
}

/// Number of cards a fresh round accounts for.
pub const ROUND_CARDS: usize = HAND_SIZE * 4 + KITTY_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: PlayerPosition },
    RoundComplete { winner: PlayerPosition },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("round is not in the playing phase")]
    NotInPlayPhase,
    #[error("{0} is not in hand")]
    CardNotInHand(Card),
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("must follow {0}")]
    MustFollowSuit(Suit),
    #[error("{0} is sitting out this hand")]
    SittingOut(PlayerPosition),
    #[error("completed trick has no winner")]
    Unresolved,
    #[error(transparent)]
    Trick(#[from] TrickError),
}

#[cfg(test)]
mod tests {
    use super::{PlayError, PlayOutcome, ROUND_CARDS, RoundPhase, RoundState};
    use crate::model::bidding::{BidOutcome, BiddingError};
    use crate::model::card::Card;
    use crate::model::deck::Deck;
    use crate::model::hand::Hand;
    use crate::model::player::PlayerPosition;
    use crate::model::suit::Suit;
    use crate::model::team::{Team, TeamRole};
    use std::collections::HashSet;

    fn cards(labels: &[&str]) -> Vec<Card> {
        labels.iter().map(|l| Card::parse(l).unwrap()).collect()
    }

    /// North deals, East/South/West/North hold fixed hands, 9S turned up.
    fn fixed_round() -> RoundState {
        let hands = [
            Hand::with_cards(cards(&["9C", "10C", "9D", "10D", "9H"])),
            Hand::with_cards(cards(&["JS", "AS", "KS", "AC", "AD"])),
            Hand::with_cards(cards(&["QC", "KC", "QD", "KD", "10H"])),
            Hand::with_cards(cards(&["JC", "JD", "JH", "QH", "KH"])),
        ];
        let kitty = cards(&["9S", "10S", "QS", "AH"]);
        RoundState::from_hands(hands, kitty, PlayerPosition::North)
    }

    fn assert_conserved(round: &RoundState) {
        let all = round.accounted_cards();
        assert_eq!(all.len(), ROUND_CARDS);
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), ROUND_CARDS);
    }

    #[test]
    fn dealing_distributes_five_cards_per_player() {
        let deck = Deck::shuffled_with_seed(3);
        let round = RoundState::deal(&deck, PlayerPosition::West).unwrap();
        for seat in PlayerPosition::LOOP {
            assert_eq!(round.hand(seat).len(), 5, "{seat} should have 5 cards");
        }
        assert_eq!(round.kitty().len(), 4);
        assert_eq!(round.exposed_card(), Some(deck.cards()[20]));
        assert!(matches!(round.phase(), RoundPhase::Bidding(_)));
        assert_eq!(round.to_act(), Some(PlayerPosition::North));
        assert_conserved(&round);
    }

    #[test]
    fn ordering_up_requires_dealer_exchange() {
        let mut round = fixed_round();
        let outcome = round.accept_trump(PlayerPosition::East, true).unwrap();
        assert!(matches!(outcome, BidOutcome::Called(_)));
        assert!(matches!(round.phase(), RoundPhase::DealerExchange(_)));
        assert_eq!(round.to_act(), Some(PlayerPosition::North));

        let stranger = Card::parse("AS").unwrap();
        assert_eq!(
            round.exchange(stranger),
            Err(BiddingError::CardNotInHand(stranger))
        );

        let discard = Card::parse("9H").unwrap();
        let taken = round.exchange(discard).unwrap();
        assert_eq!(taken, Card::parse("9S").unwrap());
        assert!(round.hand(PlayerPosition::North).contains(taken));
        assert!(!round.hand(PlayerPosition::North).contains(discard));
        assert_eq!(round.kitty()[0], discard);
        assert_eq!(round.trump(), Some(Suit::Spades));
        assert_eq!(round.role(Team::EastWest), Some(TeamRole::Maker));
        assert_eq!(round.role(Team::NorthSouth), Some(TeamRole::Defender));
        assert_conserved(&round);
    }

    #[test]
    fn going_alone_sidelines_partner() {
        let mut round = fixed_round();
        round.accept_trump(PlayerPosition::East, true).unwrap();
        round.exchange(Card::parse("9H").unwrap()).unwrap();
        assert!(matches!(
            round.declare_alone(PlayerPosition::West, true),
            Err(BiddingError::NotCaller { .. })
        ));
        let out = round.declare_alone(PlayerPosition::East, true).unwrap();
        assert_eq!(out, Some(PlayerPosition::West));
        assert!(round.is_alone());
        assert_eq!(round.to_act(), Some(PlayerPosition::East));
        assert_eq!(
            round.play_card(PlayerPosition::West, Card::parse("JC").unwrap()),
            Err(PlayError::SittingOut(PlayerPosition::West))
        );
    }

    #[test]
    fn follow_suit_is_enforced_with_bowers() {
        let mut round = fixed_round();
        round.accept_trump(PlayerPosition::East, true).unwrap();
        round.exchange(Card::parse("9H").unwrap()).unwrap();
        round.declare_alone(PlayerPosition::East, false).unwrap();

        round
            .play_card(PlayerPosition::East, Card::parse("AC").unwrap())
            .unwrap();
        // South holds clubs and must follow.
        assert_eq!(
            round.play_card(PlayerPosition::South, Card::parse("QD").unwrap()),
            Err(PlayError::MustFollowSuit(Suit::Clubs))
        );
        round
            .play_card(PlayerPosition::South, Card::parse("QC").unwrap())
            .unwrap();
        // West's Jack of Clubs is a spade; West has no clubs and may trump.
        assert_eq!(
            round.legal_cards(PlayerPosition::West).len(),
            5,
            "west is void in clubs"
        );
        round
            .play_card(PlayerPosition::West, Card::parse("JC").unwrap())
            .unwrap();
        let outcome = round
            .play_card(PlayerPosition::North, Card::parse("9C").unwrap())
            .unwrap();
        assert_eq!(
            outcome,
            PlayOutcome::TrickCompleted {
                winner: PlayerPosition::West
            }
        );
        assert_eq!(round.tricks_won(PlayerPosition::West), 1);
        assert_eq!(round.to_act(), Some(PlayerPosition::West));
        assert_conserved(&round);
    }

    #[test]
    fn full_round_completes_after_five_tricks() {
        let mut round = fixed_round();
        round.accept_trump(PlayerPosition::East, false).unwrap();
        round.accept_trump(PlayerPosition::South, false).unwrap();
        round.accept_trump(PlayerPosition::West, false).unwrap();
        round.accept_trump(PlayerPosition::North, false).unwrap();
        round
            .name_trump(PlayerPosition::East, Some(Suit::Hearts))
            .unwrap();
        round.declare_alone(PlayerPosition::East, false).unwrap();

        let mut last = PlayOutcome::Played;
        while let Some(seat) = round.to_act() {
            let card = round.legal_cards(seat)[0];
            last = round.play_card(seat, card).unwrap();
            assert_conserved(&round);
        }
        assert!(matches!(last, PlayOutcome::RoundComplete { .. }));
        assert!(round.is_complete());
        let total: u8 = round.all_tricks_won().iter().sum();
        assert_eq!(total, 5);
        assert_eq!(
            round.team_tricks(Team::NorthSouth) + round.team_tricks(Team::EastWest),
            5
        );
        assert_eq!(round.kitty()[0], Card::parse("9S").unwrap());
    }
}

use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trick {
    leader: PlayerPosition,
    sitting_out: Option<PlayerPosition>,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub position: PlayerPosition,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{0} has already played this trick")]
    AlreadyPlayed(PlayerPosition),
    #[error("{0} is sitting out this hand")]
    SittingOut(PlayerPosition),
}

impl Trick {
    /// Starts a trick. A leader that is sitting out hands the lead to the
    /// next seat clockwise.
    pub fn new(leader: PlayerPosition, sitting_out: Option<PlayerPosition>) -> Self {
        let leader = if Some(leader) == sitting_out {
            leader.next()
        } else {
            leader
        };
        Self {
            leader,
            sitting_out,
            plays: Vec::with_capacity(4),
        }
    }

    pub fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub fn sitting_out(&self) -> Option<PlayerPosition> {
        self.sitting_out
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn active_seats(&self) -> usize {
        if self.sitting_out.is_some() { 3 } else { 4 }
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == self.active_seats()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    /// Printed suit of the first card played.
    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit)
    }

    pub fn card_of(&self, seat: PlayerPosition) -> Option<Card> {
        self.plays
            .iter()
            .find(|play| play.position == seat)
            .map(|play| play.card)
    }

    /// Seat expected to play next, or `None` once the trick is complete.
    pub fn next_to_play(&self) -> Option<PlayerPosition> {
        if self.is_complete() {
            return None;
        }
        Some(
            self.plays
                .last()
                .map(|play| play.position.next_active(self.sitting_out))
                .unwrap_or(self.leader),
        )
    }

    pub fn play(&mut self, position: PlayerPosition, card: Card) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }

        if self.sitting_out == Some(position) {
            return Err(TrickError::SittingOut(position));
        }

        if self.plays.iter().any(|play| play.position == position) {
            return Err(TrickError::AlreadyPlayed(position));
        }

        if let Some(expected) = self.next_to_play()
            && expected != position
        {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: position,
            });
        }

        self.plays.push(Play { position, card });
        Ok(())
    }

    /// Seat holding the strongest card so far. Equal power keeps the card
    /// that was played first.
    pub fn current_winner(&self, trump: Suit) -> Option<Play> {
        let lead = self.lead_suit();
        let mut best: Option<(Play, u8)> = None;
        for play in &self.plays {
            let power = play.card.power(trump, lead);
            match best {
                Some((_, best_power)) if power <= best_power => {}
                _ => best = Some((*play, power)),
            }
        }
        best.map(|(play, _)| play)
    }

    pub fn winner(&self, trump: Suit) -> Option<PlayerPosition> {
        if !self.is_complete() {
            return None;
        }
        self.current_winner(trump).map(|play| play.position)
    }
}

#[cfg(test)]
mod tests {
    use super::{Trick, TrickError};
    use crate::model::card::Card;
    use crate::model::player::PlayerPosition;
    use crate::model::suit::Suit;

    fn card(label: &str) -> Card {
        Card::parse(label).unwrap()
    }

    fn full_trick(leader: PlayerPosition, cards: [&str; 4]) -> Trick {
        let mut trick = Trick::new(leader, None);
        let mut seat = leader;
        for label in cards {
            trick.play(seat, card(label)).unwrap();
            seat = seat.next();
        }
        trick
    }

    #[test]
    fn plays_follow_turn_order() {
        let mut trick = Trick::new(PlayerPosition::North, None);
        assert!(trick.play(PlayerPosition::North, card("9C")).is_ok());
        assert!(matches!(
            trick.play(PlayerPosition::South, card("10C")),
            Err(TrickError::OutOfTurn { .. })
        ));
    }

    #[test]
    fn highest_led_card_wins_without_trump() {
        let trick = full_trick(PlayerPosition::North, ["10C", "QC", "9C", "AS"]);
        assert_eq!(trick.winner(Suit::Hearts), Some(PlayerPosition::East));
    }

    #[test]
    fn lowest_trump_beats_led_ace() {
        let trick = full_trick(PlayerPosition::North, ["AC", "KC", "9H", "QC"]);
        assert_eq!(trick.winner(Suit::Hearts), Some(PlayerPosition::South));
    }

    #[test]
    fn left_bower_beats_ace_of_trump() {
        let trick = full_trick(PlayerPosition::East, ["AS", "JC", "KS", "9S"]);
        assert_eq!(trick.winner(Suit::Spades), Some(PlayerPosition::South));
    }

    #[test]
    fn lead_suit_is_printed_suit_of_first_card() {
        let mut trick = Trick::new(PlayerPosition::North, None);
        trick.play(PlayerPosition::North, card("JC")).unwrap();
        assert_eq!(trick.lead_suit(), Some(Suit::Clubs));
    }

    #[test]
    fn sitting_out_seat_is_skipped() {
        let mut trick = Trick::new(PlayerPosition::North, Some(PlayerPosition::East));
        trick.play(PlayerPosition::North, card("9C")).unwrap();
        assert_eq!(trick.next_to_play(), Some(PlayerPosition::South));
        assert_eq!(
            trick.play(PlayerPosition::East, card("10C")),
            Err(TrickError::SittingOut(PlayerPosition::East))
        );
        trick.play(PlayerPosition::South, card("QC")).unwrap();
        trick.play(PlayerPosition::West, card("KC")).unwrap();
        assert!(trick.is_complete());
        assert_eq!(trick.winner(Suit::Hearts), Some(PlayerPosition::West));
        assert_eq!(
            trick.play(PlayerPosition::North, card("AC")),
            Err(TrickError::TrickComplete)
        );
    }

    #[test]
    fn sitting_out_leader_passes_lead_left() {
        let trick = Trick::new(PlayerPosition::West, Some(PlayerPosition::West));
        assert_eq!(trick.leader(), PlayerPosition::North);
    }

    #[test]
    fn winner_requires_complete_trick_and_is_stable() {
        let mut trick = Trick::new(PlayerPosition::North, None);
        trick.play(PlayerPosition::North, card("9D")).unwrap();
        assert_eq!(trick.winner(Suit::Clubs), None);
        let trick = full_trick(PlayerPosition::North, ["9D", "KD", "AH", "10D"]);
        let first = trick.winner(Suit::Clubs);
        assert_eq!(first, trick.winner(Suit::Clubs));
        assert_eq!(first, Some(PlayerPosition::East));
    }

    #[test]
    fn off_suit_aces_never_win() {
        let trick = full_trick(PlayerPosition::North, ["9D", "AH", "AC", "10D"]);
        assert_eq!(trick.winner(Suit::Spades), Some(PlayerPosition::West));
        let current = trick.current_winner(Suit::Spades).unwrap();
        assert_eq!(current.card, card("10D"));
    }
}

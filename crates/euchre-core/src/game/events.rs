use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::score::HandScore;
use crate::model::suit::Suit;
use crate::model::team::Team;
use serde::{Deserialize, Serialize};

/// State changes announced by the table as a match progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted {
        round_number: u32,
        dealer: PlayerPosition,
    },
    CardsDealt {
        exposed: Card,
    },
    TrumpAccepted {
        seat: PlayerPosition,
        trump: Suit,
    },
    /// The dealer picked up the turned card and buried `discard`.
    CardExchanged {
        dealer: PlayerPosition,
        taken: Card,
        discard: Card,
    },
    TrumpNamed {
        seat: PlayerPosition,
        trump: Suit,
        forced: bool,
    },
    PlayerPassed {
        seat: PlayerPosition,
    },
    TrumpSet {
        trump: Suit,
        caller: PlayerPosition,
    },
    WentAlone {
        seat: PlayerPosition,
        sitting_out: PlayerPosition,
    },
    CardPlayed {
        seat: PlayerPosition,
        card: Card,
    },
    TrickWon {
        seat: PlayerPosition,
        trick_number: usize,
    },
    ScoreUpdated {
        team: Team,
        result: HandScore,
        scores: [u32; 2],
    },
    RoundReset {
        next_dealer: PlayerPosition,
    },
    MatchWon {
        team: Team,
        scores: [u32; 2],
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::RoundStarted { .. } => "round_started",
            GameEvent::CardsDealt { .. } => "cards_dealt",
            GameEvent::TrumpAccepted { .. } => "trump_accepted",
            GameEvent::CardExchanged { .. } => "card_exchanged",
            GameEvent::TrumpNamed { .. } => "trump_named",
            GameEvent::PlayerPassed { .. } => "player_passed",
            GameEvent::TrumpSet { .. } => "trump_set",
            GameEvent::WentAlone { .. } => "went_alone",
            GameEvent::CardPlayed { .. } => "card_played",
            GameEvent::TrickWon { .. } => "trick_won",
            GameEvent::ScoreUpdated { .. } => "score_updated",
            GameEvent::RoundReset { .. } => "round_reset",
            GameEvent::MatchWon { .. } => "match_won",
        }
    }
}

/// Receiver for table events. Presentation layers and recorders implement it.
pub trait EventSink {
    fn publish(&mut self, event: &GameEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, _event: &GameEvent) {}
}

impl EventSink for Vec<GameEvent> {
    fn publish(&mut self, event: &GameEvent) {
        self.push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn publish(&mut self, event: &GameEvent) {
        (**self).publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{EventSink, GameEvent, NullSink};
    use crate::model::player::PlayerPosition;

    #[test]
    fn vec_sink_records_in_order() {
        let mut events: Vec<GameEvent> = Vec::new();
        events.publish(&GameEvent::PlayerPassed {
            seat: PlayerPosition::East,
        });
        events.publish(&GameEvent::RoundReset {
            next_dealer: PlayerPosition::South,
        });
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "player_passed");
        assert_eq!(events[1].name(), "round_reset");

        let mut null = NullSink;
        null.publish(&events[0]);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_string(&GameEvent::PlayerPassed {
            seat: PlayerPosition::West,
        })
        .unwrap();
        assert!(json.contains("\"event\":\"player_passed\""));
        assert!(json.contains("\"seat\":\"West\""));
    }
}

use crate::game::events::{EventSink, GameEvent, NullSink};
use crate::game::match_state::MatchState;
use crate::game::seat::{Seat, SeatKind, SeatView};
use crate::model::bidding::{BidOutcome, BiddingError, BiddingPhase, CallKind};
use crate::model::card::Card;
use crate::model::deck::DealError;
use crate::model::player::PlayerPosition;
use crate::model::round::{PlayError, PlayOutcome, RoundPhase, RoundState};
use crate::model::score::{HandScore, TARGET_SCORE};
use crate::model::suit::Suit;
use crate::model::team::Team;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

const TARGET: &str = "euchre_core::table";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub target_score: u32,
    /// Answers requested per decision before the table gives up on a seat.
    pub max_attempts: u32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            target_score: TARGET_SCORE,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("{seat} made an illegal play: {source}")]
    IllegalPlay {
        seat: PlayerPosition,
        #[source]
        source: PlayError,
    },
    #[error("{seat} made an invalid bid: {source}")]
    Bidding {
        seat: PlayerPosition,
        #[source]
        source: BiddingError,
    },
    #[error(transparent)]
    Deal(#[from] DealError),
    #[error("table has {found} seats but a match needs 4")]
    SeatCount { found: usize },
    #[error("no seat registered for {0}")]
    SeatMissing(PlayerPosition),
    #[error("round stopped before its tricks were complete")]
    IncompleteTrick,
    #[error("{seat} gave no acceptable answer after {attempts} attempts")]
    RetriesExhausted {
        seat: PlayerPosition,
        attempts: u32,
    },
    #[error("match is already over")]
    MatchOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round_number: u32,
    pub dealer: PlayerPosition,
    pub trump: Suit,
    pub caller: PlayerPosition,
    pub kind: CallKind,
    pub alone: bool,
    pub team_tricks: [u8; 2],
    pub scoring_team: Team,
    pub result: HandScore,
    pub scores: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: Team,
    pub scores: [u32; 2],
    pub rounds_played: u32,
    pub rounds: Vec<RoundSummary>,
}

/// Runs matches between four seats. Owns the canonical match state; seats
/// only ever see a [`SeatView`].
pub struct Table<E: EventSink = NullSink> {
    state: MatchState,
    seats: Vec<Box<dyn Seat>>,
    sink: E,
    config: TableConfig,
}

impl<E: EventSink> Table<E> {
    pub fn new(
        seats: Vec<Box<dyn Seat>>,
        sink: E,
        config: TableConfig,
        dealer: PlayerPosition,
        seed: u64,
    ) -> Result<Self, TableError> {
        let state = MatchState::with_seed_round_dealer(seed, 1, dealer, config.target_score)?;
        Self::with_state(state, seats, sink, config)
    }

    pub fn with_state(
        state: MatchState,
        seats: Vec<Box<dyn Seat>>,
        sink: E,
        config: TableConfig,
    ) -> Result<Self, TableError> {
        if seats.len() != 4 {
            return Err(TableError::SeatCount { found: seats.len() });
        }
        Ok(Self {
            state,
            seats,
            sink,
            config,
        })
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn into_sink(self) -> E {
        self.sink
    }

    pub fn seat_kinds(&self) -> Vec<SeatKind> {
        self.seats.iter().map(|seat| seat.kind()).collect()
    }

    /// Plays rounds until one team reaches the target score.
    pub fn play_match(&mut self) -> Result<MatchResult, TableError> {
        let mut rounds = Vec::new();
        while !self.state.is_match_over() {
            rounds.push(self.play_round()?);
        }
        let winner = self.state.winner().ok_or(TableError::MatchOver)?;
        Ok(MatchResult {
            winner,
            scores: *self.state.scores().standings(),
            rounds_played: rounds.len() as u32,
            rounds,
        })
    }

    /// Plays the current round: trump calling, five tricks, scoring. Deals the
    /// next round afterwards unless the match is over.
    pub fn play_round(&mut self) -> Result<RoundSummary, TableError> {
        if self.state.is_match_over() {
            return Err(TableError::MatchOver);
        }

        let round_number = self.state.round_number();
        let dealer = self.state.dealer();
        self.broadcast(GameEvent::RoundStarted {
            round_number,
            dealer,
        });
        if let Some(exposed) = self.state.round().exposed_card() {
            self.broadcast(GameEvent::CardsDealt { exposed });
        }

        self.run_bidding()?;
        self.run_go_alone()?;
        self.run_tricks()?;

        let round = self.state.round();
        let call = round.call().ok_or(TableError::IncompleteTrick)?;
        let team_tricks = [
            round.team_tricks(Team::NorthSouth),
            round.team_tricks(Team::EastWest),
        ];
        let alone = round.is_alone();
        let (scoring_team, result) = self.state.score_round().ok_or(TableError::IncompleteTrick)?;
        let scores = *self.state.scores().standings();

        event!(
            target: TARGET,
            Level::INFO,
            round = round_number,
            dealer = %dealer,
            trump = %call.trump,
            caller = %call.caller,
            alone,
            ns_tricks = team_tricks[0],
            ew_tricks = team_tricks[1],
            scoring_team = %scoring_team,
            points = result.points,
            ns_score = scores[0],
            ew_score = scores[1],
            "round_scored"
        );
        self.broadcast(GameEvent::ScoreUpdated {
            team: scoring_team,
            result,
            scores,
        });

        if let Some(winner) = self.state.winner() {
            self.broadcast(GameEvent::MatchWon {
                team: winner,
                scores,
            });
        } else {
            self.broadcast(GameEvent::RoundReset {
                next_dealer: dealer.next(),
            });
            self.state.start_next_round()?;
        }

        Ok(RoundSummary {
            round_number,
            dealer,
            trump: call.trump,
            caller: call.caller,
            kind: call.kind,
            alone,
            team_tricks,
            scoring_team,
            result,
            scores,
        })
    }

    fn run_bidding(&mut self) -> Result<(), TableError> {
        while let RoundPhase::Bidding(bidding) = self.state.round().phase() {
            let phase = bidding.phase();
            let exposed = bidding.exposed();
            let seat = bidding.to_act().ok_or(TableError::IncompleteTrick)?;

            let outcome = match phase {
                BiddingPhase::Accept => {
                    let (accepted, outcome) = self.resolve(
                        seat,
                        |handle, view| handle.accept_trump(view, exposed),
                        |round, accepted| round.accept_trump(seat, accepted).map_err(bid_error(seat)),
                    )?;
                    if accepted {
                        self.broadcast(GameEvent::TrumpAccepted {
                            seat,
                            trump: exposed.suit,
                        });
                    }
                    outcome
                }
                BiddingPhase::Name | BiddingPhase::Force => {
                    let forced = phase == BiddingPhase::Force;
                    let (named, outcome) = self.resolve(
                        seat,
                        |handle, view| handle.choose_trump(view, exposed, forced),
                        |round, suit| round.name_trump(seat, suit).map_err(bid_error(seat)),
                    )?;
                    if let Some(trump) = named {
                        self.broadcast(GameEvent::TrumpNamed {
                            seat,
                            trump,
                            forced,
                        });
                    }
                    outcome
                }
                BiddingPhase::Complete => return Err(TableError::IncompleteTrick),
            };

            match outcome {
                BidOutcome::Passed | BidOutcome::Advanced(_) => {
                    self.broadcast(GameEvent::PlayerPassed { seat });
                }
                BidOutcome::Called(call) => {
                    if call.kind == CallKind::OrderedUp {
                        self.run_exchange(exposed)?;
                    }
                    self.broadcast(GameEvent::TrumpSet {
                        trump: call.trump,
                        caller: call.caller,
                    });
                }
            }
        }
        Ok(())
    }

    fn run_exchange(&mut self, exposed: Card) -> Result<(), TableError> {
        let dealer = self.state.round().dealer();
        let (discard, taken) = self.resolve(
            dealer,
            |handle, view| handle.choose_discard(view, exposed),
            |round, discard| round.exchange(discard).map_err(bid_error(dealer)),
        )?;
        self.broadcast(GameEvent::CardExchanged {
            dealer,
            taken,
            discard,
        });
        Ok(())
    }

    fn run_go_alone(&mut self) -> Result<(), TableError> {
        let RoundPhase::GoAlone(call) = self.state.round().phase() else {
            return Err(TableError::IncompleteTrick);
        };
        let caller = call.caller;
        let (_, sitting_out) = self.resolve(
            caller,
            |handle, view| handle.go_alone(view),
            |round, alone| round.declare_alone(caller, alone).map_err(bid_error(caller)),
        )?;
        if let Some(sitting_out) = sitting_out {
            self.broadcast(GameEvent::WentAlone {
                seat: caller,
                sitting_out,
            });
        }
        Ok(())
    }

    fn run_tricks(&mut self) -> Result<(), TableError> {
        while let Some(seat) = self.state.round().to_act() {
            let legal = self.state.round().legal_cards(seat);
            let (card, outcome) = self.resolve(
                seat,
                |handle, view| handle.choose_play(view, &legal),
                |round, card| {
                    round
                        .play_card(seat, card)
                        .map_err(|source| TableError::IllegalPlay { seat, source })
                },
            )?;
            self.broadcast(GameEvent::CardPlayed { seat, card });

            match outcome {
                PlayOutcome::Played => {}
                PlayOutcome::TrickCompleted { winner } | PlayOutcome::RoundComplete { winner } => {
                    let trick_number = self.state.round().tricks_completed();
                    self.broadcast(GameEvent::TrickWon {
                        seat: winner,
                        trick_number,
                    });
                }
            }
        }

        if !self.state.round().is_complete() {
            return Err(TableError::IncompleteTrick);
        }
        Ok(())
    }

    /// Asks `seat` for an answer until `apply` accepts it or the attempt
    /// budget runs out. Rejected answers are reported back to the seat.
    fn resolve<T, R>(
        &mut self,
        seat: PlayerPosition,
        mut ask: impl FnMut(&mut dyn Seat, &SeatView) -> T,
        mut apply: impl FnMut(&mut RoundState, T) -> Result<R, TableError>,
    ) -> Result<(T, R), TableError>
    where
        T: Copy + std::fmt::Debug,
    {
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            let view = self.view_for(seat);
            let handle = self
                .seats
                .get_mut(seat.index())
                .ok_or(TableError::SeatMissing(seat))?;
            let answer = ask(handle.as_mut(), &view);
            match apply(self.state.round_mut(), answer) {
                Ok(result) => {
                    event!(
                        target: TARGET,
                        Level::DEBUG,
                        seat = %seat,
                        kind = %handle.kind(),
                        attempt,
                        answer = ?answer,
                        "decision_accepted"
                    );
                    return Ok((answer, result));
                }
                Err(error) => {
                    event!(
                        target: TARGET,
                        Level::WARN,
                        seat = %seat,
                        kind = %handle.kind(),
                        attempt,
                        answer = ?answer,
                        error = %error,
                        "decision_rejected"
                    );
                    handle.rejected(&view, &error);
                }
            }
        }
        Err(TableError::RetriesExhausted { seat, attempts })
    }

    fn view_for(&self, seat: PlayerPosition) -> SeatView {
        SeatView::capture(
            self.state.round(),
            seat,
            self.state.scores(),
            self.state.round_number(),
        )
    }

    fn broadcast(&mut self, game_event: GameEvent) {
        event!(
            target: TARGET,
            Level::DEBUG,
            round = self.state.round_number(),
            event = game_event.name(),
            detail = ?game_event,
            "table_event"
        );
        self.sink.publish(&game_event);
        for seat in PlayerPosition::LOOP {
            let view = self.view_for(seat);
            if let Some(handle) = self.seats.get_mut(seat.index()) {
                handle.notify(&view, &game_event);
            }
        }
    }
}

fn bid_error(seat: PlayerPosition) -> impl Fn(BiddingError) -> TableError {
    move |source| TableError::Bidding { seat, source }
}

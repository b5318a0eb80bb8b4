mod console;
mod external;
mod permutations;

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{AgentSetup, BenchmarkConfig, ResolvedOutputs, ValidationError};
use euchre_bot::HeuristicPolicy;
use euchre_core::game::events::{GameEvent, NullSink};
use euchre_core::game::seat::{Seat, SeatKind, SeatView};
use euchre_core::game::table::{MatchResult, Table, TableConfig, TableError};
use euchre_core::model::card::Card;
use euchre_core::model::player::PlayerPosition;
use euchre_core::model::score::ScoreKind;
use euchre_core::model::suit::Suit;
use euchre_core::model::team::Team;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

pub use console::ConsolePolicy;
pub use external::ExternalPolicy;
pub use permutations::{MAX_SEAT_PERMUTATIONS, SeatPermutations};

use external::FailureLog;
use permutations::partners;

const SEAT_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Plays every configured match under every seat permutation.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    seat_permutations: SeatPermutations,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub matches_played: usize,
    pub permutations: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
}

impl TournamentRunner {
    /// Build a runner. The configuration is validated again so overrides
    /// applied after loading cannot slip through.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        config.validate()?;
        let agents = config
            .agents
            .iter()
            .map(|agent| {
                agent.setup().map(|setup| AgentBlueprint {
                    name: agent.name.clone(),
                    setup,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        let seat_permutations = SeatPermutations::new(config.matches.permutations);

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
            seat_permutations,
        })
    }

    /// Execute the tournament, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let permutations = self.seat_permutations.as_slice();
        let mut rng = StdRng::seed_from_u64(self.config.matches.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for match_index in 0..self.config.matches.count {
            let base_seed = rng.next_u64();

            for (perm_index, perm) in permutations.iter().enumerate() {
                let outcome = self.play_match(match_index, perm_index, base_seed, perm)?;
                analytics.record_match(&outcome)?;
                rows_written += write_match_rows(
                    &mut writer,
                    &self.config,
                    match_index,
                    perm_index,
                    base_seed,
                    &outcome,
                )?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            matches_played: self.config.matches.count,
            permutations: permutations.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
        })
    }

    fn play_match(
        &self,
        match_index: usize,
        permutation_index: usize,
        base_seed: u64,
        permutation: &[usize; 4],
    ) -> Result<MatchOutcome, RunnerError> {
        let match_id = match_id(match_index, permutation_index);
        let failures = FailureLog::default();
        let mut metrics = Vec::with_capacity(4);
        let mut seats: Vec<Box<dyn Seat>> = Vec::with_capacity(4);

        for (seat_idx, agent_idx) in permutation.iter().enumerate() {
            let invalid = RunnerError::InvalidPermutation {
                index: seat_idx,
                agent_index: *agent_idx,
            };
            let seat = PlayerPosition::from_index(seat_idx).ok_or(invalid)?;
            let agent = self
                .agents
                .get(*agent_idx)
                .ok_or(RunnerError::InvalidPermutation {
                    index: seat_idx,
                    agent_index: *agent_idx,
                })?;
            let shared = SharedMetrics::default();
            metrics.push((seat, agent.name.clone(), shared.clone()));
            seats.push(Box::new(TimedSeat {
                inner: agent.spawn_seat(seat_seed(base_seed, seat), failures.clone()),
                metrics: shared,
                agent: agent.name.clone(),
                match_id: match_id.clone(),
                logging_enabled: self.logging_enabled,
            }));
        }

        let table_config = TableConfig {
            target_score: self.config.matches.target_score,
            ..TableConfig::default()
        };
        let mut table = Table::new(
            seats,
            NullSink,
            table_config,
            PlayerPosition::North,
            base_seed,
        )?;
        let result = table.play_match()?;
        drop(table);

        if let Some(message) = failures.borrow().first() {
            return Err(RunnerError::ExternalFailed {
                match_id,
                message: message.clone(),
            });
        }

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "euchre_bench::match",
                Level::INFO,
                run_id = %self.config.run_id,
                match_id = %match_id,
                winner = team_label(result.winner),
                north_south = result.scores[0],
                east_west = result.scores[1],
                rounds = result.rounds_played,
                "match_complete"
            );
        }

        let seating = metrics
            .iter()
            .map(|(seat, agent, _)| SeatSnapshot {
                seat: seat.label().to_string(),
                agent: agent.clone(),
            })
            .collect();

        let seat_results = metrics
            .into_iter()
            .map(|(seat, agent_name, shared)| {
                let (calls, euchred) = call_record(&result, seat);
                let team = seat.team();
                let summary = shared.borrow().finalize();
                SeatResult {
                    partner: self.agents[partners(permutation, seat).1].name.clone(),
                    agent_name,
                    seat,
                    team,
                    won: result.winner == team,
                    points_for: result.scores[team.index()],
                    points_against: result.scores[team.other().index()],
                    calls,
                    euchred,
                    metrics: summary,
                }
            })
            .collect();

        Ok(MatchOutcome {
            match_id,
            seating,
            seat_results,
            result,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn match_id(match_index: usize, permutation_index: usize) -> String {
    format!("M{match_index:05}_P{permutation_index:02}")
}

fn seat_seed(base_seed: u64, seat: PlayerPosition) -> u64 {
    base_seed.wrapping_add(SEAT_SEED_STRIDE.wrapping_mul(seat.index() as u64 + 1))
}

pub fn team_label(team: Team) -> &'static str {
    match team {
        Team::NorthSouth => "north_south",
        Team::EastWest => "east_west",
    }
}

/// Rounds in which `seat` fixed trump, and how many of those were euchred.
fn call_record(result: &MatchResult, seat: PlayerPosition) -> (u32, u32) {
    result
        .rounds
        .iter()
        .filter(|round| round.caller == seat)
        .fold((0, 0), |(calls, euchred), round| {
            let set = u32::from(round.result.kind == ScoreKind::Euchre);
            (calls + 1, euchred + set)
        })
}

fn write_match_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    match_index: usize,
    permutation_index: usize,
    match_seed: u64,
    outcome: &MatchOutcome,
) -> Result<usize, RunnerError> {
    let mut rows_written = 0usize;
    for seat_result in &outcome.seat_results {
        let row = MatchLogRow {
            run_id: &config.run_id,
            match_id: &outcome.match_id,
            match_index,
            permutation_index,
            match_seed,
            seat: seat_result.seat.label(),
            team: team_label(seat_result.team),
            agent: &seat_result.agent_name,
            partner: &seat_result.partner,
            seating: &outcome.seating,
            won: seat_result.won,
            points_for: seat_result.points_for,
            points_against: seat_result.points_against,
            rounds: outcome.result.rounds_played,
            calls: seat_result.calls,
            euchred: seat_result.euchred,
            decisions: seat_result.metrics.decisions,
            avg_ms_per_decision: seat_result.metrics.avg_ms_per_decision,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

pub struct MatchOutcome {
    pub match_id: String,
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
    pub result: MatchResult,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: String,
    pub agent: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub partner: String,
    pub seat: PlayerPosition,
    pub team: Team,
    pub won: bool,
    pub points_for: u32,
    pub points_against: u32,
    pub calls: u32,
    pub euchred: u32,
    pub metrics: DecisionSummary,
}

type SharedMetrics = Rc<RefCell<DecisionMetrics>>;

#[derive(Default)]
pub(crate) struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(&self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

/// Wraps an agent's seat to time every decision it makes.
struct TimedSeat {
    inner: Box<dyn Seat>,
    metrics: SharedMetrics,
    agent: String,
    match_id: String,
    logging_enabled: bool,
}

impl TimedSeat {
    fn timed<T>(&mut self, decide: impl FnOnce(&mut Box<dyn Seat>) -> T) -> (T, f64) {
        let start = Instant::now();
        let answer = decide(&mut self.inner);
        let elapsed_ms = self.metrics.borrow_mut().record(start.elapsed());
        (answer, elapsed_ms)
    }

    fn log_decision(&self, view: &SeatView, action: &'static str, answer: String, elapsed_ms: f64) {
        if !self.logging_enabled || !tracing::enabled!(Level::INFO) {
            return;
        }
        event!(
            target: "euchre_bench::play",
            Level::INFO,
            match_id = %self.match_id,
            round = view.round_number,
            seat = view.seat.label(),
            agent = %self.agent,
            action,
            answer = %answer,
            elapsed_ms
        );
    }
}

impl Seat for TimedSeat {
    fn kind(&self) -> SeatKind {
        self.inner.kind()
    }

    fn accept_trump(&mut self, view: &SeatView, exposed: Card) -> bool {
        let (accepted, elapsed_ms) = self.timed(|seat| seat.accept_trump(view, exposed));
        self.log_decision(view, "accept", accepted.to_string(), elapsed_ms);
        accepted
    }

    fn choose_trump(&mut self, view: &SeatView, exposed: Card, forced: bool) -> Option<Suit> {
        let (named, elapsed_ms) = self.timed(|seat| seat.choose_trump(view, exposed, forced));
        let answer = named.map_or_else(|| "pass".to_string(), |suit| suit.to_string());
        self.log_decision(view, "name", answer, elapsed_ms);
        named
    }

    fn choose_discard(&mut self, view: &SeatView, exposed: Card) -> Card {
        let (discard, elapsed_ms) = self.timed(|seat| seat.choose_discard(view, exposed));
        self.log_decision(view, "discard", discard.to_string(), elapsed_ms);
        discard
    }

    fn choose_play(&mut self, view: &SeatView, legal: &[Card]) -> Card {
        let (card, elapsed_ms) = self.timed(|seat| seat.choose_play(view, legal));
        self.log_decision(view, "play", card.to_string(), elapsed_ms);
        card
    }

    fn go_alone(&mut self, view: &SeatView) -> bool {
        let (alone, elapsed_ms) = self.timed(|seat| seat.go_alone(view));
        self.log_decision(view, "go_alone", alone.to_string(), elapsed_ms);
        alone
    }

    fn rejected(&mut self, view: &SeatView, error: &TableError) {
        self.inner.rejected(view, error);
    }

    fn notify(&mut self, view: &SeatView, event: &GameEvent) {
        self.inner.notify(view, event);
    }
}

#[derive(Serialize)]
struct MatchLogRow<'a> {
    run_id: &'a str,
    match_id: &'a str,
    match_index: usize,
    permutation_index: usize,
    match_seed: u64,
    seat: &'static str,
    team: &'static str,
    agent: &'a str,
    partner: &'a str,
    seating: &'a [SeatSnapshot],
    won: bool,
    points_for: u32,
    points_against: u32,
    rounds: u32,
    calls: u32,
    euchred: u32,
    decisions: u32,
    avg_ms_per_decision: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("match failed: {0}")]
    Table(#[from] TableError),
    #[error("external agent failed without fallback in {match_id}: {message}")]
    ExternalFailed { match_id: String, message: String },
    #[error("permutation index {index} references invalid agent index {agent_index}")]
    InvalidPermutation { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

struct AgentBlueprint {
    name: String,
    setup: AgentSetup,
}

impl AgentBlueprint {
    fn spawn_seat(&self, seed: u64, failures: FailureLog) -> Box<dyn Seat> {
        match &self.setup {
            AgentSetup::Heuristic(opts) => Box::new(HeuristicPolicy::with_seed(
                opts.params.clone(),
                opts.seed.map_or(seed, |own| own ^ seed),
            )),
            AgentSetup::External(opts) => Box::new(ExternalPolicy::new(
                self.name.clone(),
                opts.clone(),
                seed,
                failures,
            )),
            AgentSetup::Human => Box::new(ConsolePolicy::stdio()),
        }
    }
}

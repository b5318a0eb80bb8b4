use std::cell::RefCell;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use euchre_bot::HeuristicPolicy;
use euchre_core::game::seat::{Seat, SeatKind, SeatView};
use euchre_core::game::table::TableError;
use euchre_core::model::card::Card;
use euchre_core::model::suit::Suit;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{ExternalFallback, ExternalOptions};

const TARGET: &str = "euchre_bench::external";
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Failures collected from agents configured without a fallback. The runner
/// drains it after each match.
pub(crate) type FailureLog = Rc<RefCell<Vec<String>>>;

/// Seat backed by an external search process. One process is spawned per
/// decision; it receives a single JSON request line on stdin and must print a
/// single JSON response.
pub struct ExternalPolicy {
    name: String,
    options: ExternalOptions,
    fallback: HeuristicPolicy,
    failures: FailureLog,
}

impl ExternalPolicy {
    pub(crate) fn new(
        name: String,
        options: ExternalOptions,
        fallback_seed: u64,
        failures: FailureLog,
    ) -> Self {
        if options.command.is_none() {
            event!(
                target: TARGET,
                Level::WARN,
                agent = %name,
                "no external command configured; using fallback heuristic"
            );
        }
        let params = options.heuristic.clone();
        Self {
            name,
            options,
            fallback: HeuristicPolicy::with_seed(params, fallback_seed),
            failures,
        }
    }

    fn invoke<Response>(&self, request: &Request<'_>) -> Result<Response, ExternalInvokeError>
    where
        Response: DeserializeOwned,
    {
        let command = match &self.options.command {
            Some(cmd) if !cmd.is_empty() => cmd,
            _ => return Err(ExternalInvokeError::NoCommand),
        };

        let mut cmd = Command::new(command);
        if !self.options.args.is_empty() {
            cmd.args(&self.options.args);
        }
        if let Some(dir) = &self.options.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd
            .spawn()
            .map_err(|err| ExternalInvokeError::Spawn(err.to_string()))?;
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| ExternalInvokeError::Io("stdin".into()))?;
            serde_json::to_writer(&mut stdin, request)
                .map_err(|err| ExternalInvokeError::Protocol(err.to_string()))?;
            stdin
                .write_all(b"\n")
                .map_err(|err| ExternalInvokeError::Io(err.to_string()))?;
        }

        // Drained on its own thread so a chatty process cannot stall on a
        // full pipe while we wait on it.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExternalInvokeError::Io("stdout".into()))?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let status = match self.options.timeout_ms {
            Some(timeout_ms) => wait_with_deadline(&mut child, Duration::from_millis(timeout_ms))
                .map_err(|err| {
                    if matches!(err, ExternalInvokeError::Timeout(_)) {
                        event!(
                            target: TARGET,
                            Level::WARN,
                            agent = %self.name,
                            action = request.action,
                            timeout_ms,
                            "external invocation killed after timeout"
                        );
                    }
                    err
                })?,
            None => child
                .wait()
                .map_err(|err| ExternalInvokeError::Io(err.to_string()))?,
        };

        let output = reader
            .join()
            .map_err(|_| ExternalInvokeError::Io("stdout reader panicked".into()))?
            .map_err(|err| ExternalInvokeError::Io(err.to_string()))?;

        if !status.success() {
            return Err(ExternalInvokeError::Status(format!("exit status {status}")));
        }

        serde_json::from_slice(&output).map_err(|err| ExternalInvokeError::Protocol(err.to_string()))
    }

    fn request<'a>(
        &self,
        action: &'static str,
        view: &'a SeatView,
        legal: &[Card],
        exposed: Option<Card>,
        forced: bool,
    ) -> Request<'a> {
        Request {
            action,
            seat: view.seat.label(),
            hand: card_labels(&view.hand),
            legal: card_labels(legal),
            exposed: exposed.map(|card| card.to_string()),
            forced,
            view,
            simulations: self.options.simulations,
            exploration: self.options.exploration,
        }
    }

    /// Notes why the external answer was unusable. Agents without a fallback
    /// still answer with the heuristic so the table stays consistent, but the
    /// failure is surfaced to the runner.
    fn degrade(&mut self, action: &str, reason: &str) {
        event!(
            target: TARGET,
            Level::WARN,
            agent = %self.name,
            action,
            reason,
            "external decision unusable; falling back"
        );
        if matches!(self.options.fallback, ExternalFallback::Error) {
            self.failures
                .borrow_mut()
                .push(format!("{}: {action}: {reason}", self.name));
        }
    }

    fn ask<Response: DeserializeOwned>(
        &mut self,
        request: &Request<'_>,
    ) -> Option<Response> {
        match self.invoke(request) {
            Ok(response) => Some(response),
            Err(err) => {
                self.degrade(request.action, &err.to_string());
                None
            }
        }
    }
}

impl Seat for ExternalPolicy {
    fn kind(&self) -> SeatKind {
        SeatKind::ExternalSearch
    }

    fn accept_trump(&mut self, view: &SeatView, exposed: Card) -> bool {
        let request = self.request("accept", view, &[], Some(exposed), false);
        match self.ask::<AcceptResponse>(&request) {
            Some(response) => response.accept,
            None => self.fallback.accept_trump(view, exposed),
        }
    }

    fn choose_trump(&mut self, view: &SeatView, exposed: Card, forced: bool) -> Option<Suit> {
        let request = self.request("name", view, &[], Some(exposed), forced);
        let Some(response) = self.ask::<NameResponse>(&request) else {
            return self.fallback.choose_trump(view, exposed, forced);
        };
        match response.suit.as_deref().map(Suit::from_symbol) {
            Some(Some(suit)) if suit != exposed.suit => Some(suit),
            None if !forced => None,
            _ => {
                self.degrade("name", "invalid suit in response");
                self.fallback.choose_trump(view, exposed, forced)
            }
        }
    }

    fn choose_discard(&mut self, view: &SeatView, exposed: Card) -> Card {
        let request = self.request("discard", view, &view.hand, Some(exposed), false);
        let Some(response) = self.ask::<CardResponse>(&request) else {
            return self.fallback.choose_discard(view, exposed);
        };
        match Card::parse(&response.card) {
            Some(card) if view.hand.contains(&card) => card,
            _ => {
                self.degrade("discard", "discard not held");
                self.fallback.choose_discard(view, exposed)
            }
        }
    }

    fn choose_play(&mut self, view: &SeatView, legal: &[Card]) -> Card {
        if legal.is_empty() {
            return self.fallback.choose_play(view, legal);
        }
        let request = self.request("play", view, legal, None, false);
        let Some(response) = self.ask::<CardResponse>(&request) else {
            return self.fallback.choose_play(view, legal);
        };
        match Card::parse(&response.card) {
            Some(card) if legal.contains(&card) => card,
            _ => {
                self.degrade("play", "card not among legal moves");
                self.fallback.choose_play(view, legal)
            }
        }
    }

    fn go_alone(&mut self, view: &SeatView) -> bool {
        let request = self.request("go_alone", view, &[], None, false);
        match self.ask::<AloneResponse>(&request) {
            Some(response) => response.alone,
            None => self.fallback.go_alone(view),
        }
    }

    fn rejected(&mut self, view: &SeatView, error: &TableError) {
        event!(
            target: TARGET,
            Level::WARN,
            agent = %self.name,
            seat = %view.seat,
            error = %error,
            "decision_rejected"
        );
    }
}

/// Waits for `child` to exit, killing it once `budget` has passed.
fn wait_with_deadline(child: &mut Child, budget: Duration) -> Result<ExitStatus, ExternalInvokeError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if start.elapsed() >= budget => {
                // The process may exit between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExternalInvokeError::Timeout(budget.as_millis() as u64));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => return Err(ExternalInvokeError::Io(err.to_string())),
        }
    }
}

#[derive(Debug, Error)]
enum ExternalInvokeError {
    #[error("no command configured")]
    NoCommand,
    #[error("failed to spawn process: {0}")]
    Spawn(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("non-zero exit status: {0}")]
    Status(String),
    #[error("no answer within {0} ms")]
    Timeout(u64),
}

#[derive(Serialize)]
struct Request<'a> {
    action: &'static str,
    seat: &'static str,
    hand: Vec<String>,
    legal: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exposed: Option<String>,
    forced: bool,
    view: &'a SeatView,
    simulations: u32,
    exploration: f64,
}

#[derive(Deserialize)]
struct AcceptResponse {
    accept: bool,
}

#[derive(Deserialize)]
struct NameResponse {
    #[serde(default)]
    suit: Option<String>,
}

#[derive(Deserialize)]
struct CardResponse {
    card: String,
}

#[derive(Deserialize)]
struct AloneResponse {
    alone: bool,
}

fn card_labels(cards: &[Card]) -> Vec<String> {
    cards.iter().map(|card| card.to_string()).collect()
}

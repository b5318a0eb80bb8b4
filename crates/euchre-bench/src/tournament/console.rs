use std::fmt;
use std::io::{self, BufRead, BufReader, Write};

use euchre_core::game::events::GameEvent;
use euchre_core::game::seat::{Seat, SeatKind, SeatView};
use euchre_core::game::table::TableError;
use euchre_core::model::card::Card;
use euchre_core::model::rank::Rank;
use euchre_core::model::suit::Suit;
use tracing::{Level, event};

/// Seat answered by a person at a terminal. Malformed answers are re-prompted;
/// end of input falls back to the most passive legal answer.
pub struct ConsolePolicy<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl ConsolePolicy<BufReader<io::Stdin>, io::Stdout> {
    /// Reads from the process stdin, locking it only for the duration of
    /// each read. The one-byte buffer keeps input past the current line in
    /// the shared stdin buffer.
    pub fn stdio() -> Self {
        Self::new(BufReader::with_capacity(1, io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePolicy<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, args: fmt::Arguments<'_>) {
        if let Err(err) = self.output.write_fmt(args).and_then(|_| self.output.write_all(b"\n")) {
            event!(target: "euchre_bench::console", Level::WARN, error = %err, "console write failed");
        }
    }

    /// Prints `prompt` and reads one trimmed line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> Option<String> {
        let written = write!(self.output, "{prompt} ").and_then(|_| self.output.flush());
        if let Err(err) = written {
            event!(target: "euchre_bench::console", Level::WARN, error = %err, "console write failed");
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(err) => {
                event!(target: "euchre_bench::console", Level::WARN, error = %err, "console read failed");
                None
            }
        }
    }

    fn ask_yes_no(&mut self, prompt: &str) -> Option<bool> {
        loop {
            let answer = self.ask(prompt)?;
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Some(true),
                "n" | "no" | "" => return Some(false),
                _ => self.say(format_args!("Please answer y or n.")),
            }
        }
    }

    fn show_hand(&mut self, view: &SeatView) {
        let hand = join_cards(&view.hand);
        let trump = view
            .trump
            .map(|suit| suit.name())
            .unwrap_or("undecided");
        self.say(format_args!(
            "[{}] hand: {hand}  trump: {trump}  score {}-{}",
            view.seat, view.scores[0], view.scores[1]
        ));
    }
}

impl<R: BufRead, W: Write> Seat for ConsolePolicy<R, W> {
    fn kind(&self) -> SeatKind {
        SeatKind::Human
    }

    fn accept_trump(&mut self, view: &SeatView, exposed: Card) -> bool {
        self.show_hand(view);
        self.ask_yes_no(&format!("Order up {exposed}? [y/N]"))
            .unwrap_or(false)
    }

    fn choose_trump(&mut self, view: &SeatView, exposed: Card, forced: bool) -> Option<Suit> {
        self.show_hand(view);
        let prompt = if forced {
            format!("Name trump (C/D/H/S, not {}):", exposed.suit)
        } else {
            format!("Name trump (C/D/H/S, not {}) or pass:", exposed.suit)
        };
        loop {
            let Some(answer) = self.ask(&prompt) else {
                return forced
                    .then(|| Suit::ALL.into_iter().find(|&suit| suit != exposed.suit))
                    .flatten();
            };
            if !forced && (answer.is_empty() || answer.eq_ignore_ascii_case("pass")) {
                return None;
            }
            match Suit::from_symbol(&answer) {
                Some(suit) if suit != exposed.suit => return Some(suit),
                Some(_) => self.say(format_args!("{} was turned down.", exposed.suit.name())),
                None if forced => self.say(format_args!("The dealer must name a suit.")),
                None => self.say(format_args!("Unrecognised suit '{answer}'.")),
            }
        }
    }

    fn choose_discard(&mut self, view: &SeatView, exposed: Card) -> Card {
        self.show_hand(view);
        loop {
            let Some(answer) = self.ask(&format!("Picking up {exposed}; discard which card?"))
            else {
                return view.hand.first().copied().unwrap_or(exposed);
            };
            match Card::parse(&answer) {
                Some(card) if view.hand.contains(&card) => return card,
                _ => self.say(format_args!("'{answer}' is not in your hand.")),
            }
        }
    }

    fn choose_play(&mut self, view: &SeatView, legal: &[Card]) -> Card {
        self.show_hand(view);
        if !view.trick.is_empty() {
            let trick = view
                .trick
                .iter()
                .map(|play| format!("{}:{}", play.position, play.card))
                .collect::<Vec<_>>()
                .join(" ");
            self.say(format_args!("trick: {trick}"));
        }
        let prompt = format!("Play ({}):", join_cards(legal));
        loop {
            let Some(answer) = self.ask(&prompt) else {
                return legal
                    .first()
                    .or_else(|| view.hand.first())
                    .copied()
                    .unwrap_or(Card::new(Rank::Nine, Suit::Clubs));
            };
            let chosen = answer
                .parse::<usize>()
                .ok()
                .and_then(|index| index.checked_sub(1))
                .and_then(|index| legal.get(index).copied())
                .or_else(|| Card::parse(&answer));
            match chosen {
                Some(card) if legal.contains(&card) => return card,
                _ => self.say(format_args!("'{answer}' is not a legal play.")),
            }
        }
    }

    fn go_alone(&mut self, view: &SeatView) -> bool {
        self.show_hand(view);
        self.ask_yes_no("Go alone? [y/N]").unwrap_or(false)
    }

    fn rejected(&mut self, _view: &SeatView, error: &TableError) {
        self.say(format_args!("Rejected: {error}"));
    }

    fn notify(&mut self, view: &SeatView, event: &GameEvent) {
        match event {
            GameEvent::TrumpSet { trump, caller } => {
                self.say(format_args!("{caller} made {} trump.", trump.name()))
            }
            GameEvent::WentAlone { seat, .. } => self.say(format_args!("{seat} is going alone.")),
            GameEvent::CardPlayed { seat, card } if *seat != view.seat => {
                self.say(format_args!("{seat} played {card}."))
            }
            GameEvent::TrickWon { seat, trick_number } => {
                self.say(format_args!("{seat} won trick {trick_number}."))
            }
            GameEvent::ScoreUpdated { scores, .. } => self.say(format_args!(
                "Score: North/South {} - East/West {}",
                scores[0], scores[1]
            )),
            GameEvent::MatchWon { team, .. } => self.say(format_args!("{team} win the match.")),
            _ => {}
        }
    }
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| card.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

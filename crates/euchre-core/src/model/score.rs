use crate::model::team::{Team, TeamRole};
use serde::{Deserialize, Serialize};

pub const TARGET_SCORE: u32 = 10;
pub const TRICKS_PER_HAND: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreKind {
    /// Makers took three or four tricks.
    Point,
    /// Makers took all five.
    March,
    /// A lone maker took all five.
    LoneMarch,
    /// Makers took two or fewer.
    Euchre,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandScore {
    pub role: TeamRole,
    pub points: u32,
    pub kind: ScoreKind,
}

/// Scores one hand from the makers' trick count.
pub fn score_hand(maker_tricks: u8, alone: bool) -> HandScore {
    match maker_tricks {
        3 | 4 => HandScore {
            role: TeamRole::Maker,
            points: 1,
            kind: ScoreKind::Point,
        },
        t if t >= TRICKS_PER_HAND => {
            if alone {
                HandScore {
                    role: TeamRole::Maker,
                    points: 4,
                    kind: ScoreKind::LoneMarch,
                }
            } else {
                HandScore {
                    role: TeamRole::Maker,
                    points: 2,
                    kind: ScoreKind::March,
                }
            }
        }
        _ => HandScore {
            role: TeamRole::Defender,
            points: 2,
            kind: ScoreKind::Euchre,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    totals: [u32; 2],
    target: u32,
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self::with_target(TARGET_SCORE)
    }

    pub const fn with_target(target: u32) -> Self {
        Self {
            totals: [0; 2],
            target,
        }
    }

    pub fn add_points(&mut self, team: Team, points: u32) {
        self.totals[team.index()] += points;
    }

    pub fn set_totals(&mut self, totals: [u32; 2]) {
        self.totals = totals;
    }

    pub fn score(&self, team: Team) -> u32 {
        self.totals[team.index()]
    }

    pub fn standings(&self) -> &[u32; 2] {
        &self.totals
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    /// Applies a finished hand and returns the team that scored.
    pub fn apply_hand(&mut self, makers: Team, maker_tricks: u8, alone: bool) -> (Team, HandScore) {
        let result = score_hand(maker_tricks, alone);
        let scoring_team = match result.role {
            TeamRole::Maker => makers,
            TeamRole::Defender => makers.other(),
        };
        self.add_points(scoring_team, result.points);
        (scoring_team, result)
    }

    pub fn is_match_over(&self) -> bool {
        self.totals.iter().any(|&total| total >= self.target)
    }

    pub fn winner(&self) -> Option<Team> {
        if !self.is_match_over() {
            return None;
        }
        let [ns, ew] = self.totals;
        Some(if ns >= ew {
            Team::NorthSouth
        } else {
            Team::EastWest
        })
    }
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self::new()
    }
}

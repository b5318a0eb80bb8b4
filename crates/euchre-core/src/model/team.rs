use crate::model::player::PlayerPosition;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    NorthSouth = 0,
    EastWest = 1,
}

/// Per-hand role. The team whose member fixed trump makes; the other defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamRole {
    Maker,
    Defender,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::NorthSouth, Team::EastWest];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> Team {
        match self {
            Team::NorthSouth => Team::EastWest,
            Team::EastWest => Team::NorthSouth,
        }
    }

    pub const fn members(self) -> [PlayerPosition; 2] {
        match self {
            Team::NorthSouth => [PlayerPosition::North, PlayerPosition::South],
            Team::EastWest => [PlayerPosition::East, PlayerPosition::West],
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Team::NorthSouth => "North/South",
            Team::EastWest => "East/West",
        };
        f.write_str(label)
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamRole::Maker => f.write_str("Maker"),
            TeamRole::Defender => f.write_str("Defender"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Team;

    #[test]
    fn members_belong_to_their_team() {
        for team in Team::BOTH {
            for seat in team.members() {
                assert_eq!(seat.team(), team);
            }
            assert_eq!(team.other().other(), team);
        }
    }
}

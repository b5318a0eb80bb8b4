use serde::{Deserialize, Serialize};

/// Tuning constants for the heuristic seat. Defaults reproduce the stock bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeuristicParams {
    /// Chance to order up, indexed by trump held (last entry covers four or
    /// more).
    pub accept_chance: [f64; 5],
    /// Minimum summed power of a suit before naming it voluntarily.
    pub name_threshold: u32,
    /// Weight of the card's own power in the play likelihood.
    pub power_weight: f64,
    /// Weight of the situational bonus in the play likelihood.
    pub bonus_weight: f64,
    /// Bonus scale applied to power when following and partner is not winning.
    pub follow_scale: f64,
    /// Bonus when partner already holds the trick.
    pub partner_winning_bonus: f64,
    /// Go alone when holding at least this many trump. `None` never goes alone.
    pub go_alone_min_trump: Option<usize>,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            accept_chance: [0.01, 0.05, 0.25, 0.60, 0.90],
            name_threshold: 250,
            power_weight: 0.3,
            bonus_weight: 0.7,
            follow_scale: 0.7,
            partner_winning_bonus: -0.5,
            go_alone_min_trump: None,
        }
    }
}

impl HeuristicParams {
    pub fn acceptance_for(&self, trump_count: usize) -> f64 {
        let index = trump_count.min(self.accept_chance.len() - 1);
        self.accept_chance[index]
    }
}

#[cfg(test)]
mod tests {
    use super::HeuristicParams;

    #[test]
    fn acceptance_table_saturates_at_four() {
        let params = HeuristicParams::default();
        assert_eq!(params.acceptance_for(0), 0.01);
        assert_eq!(params.acceptance_for(3), 0.60);
        assert_eq!(params.acceptance_for(4), 0.90);
        assert_eq!(params.acceptance_for(5), 0.90);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let params: HeuristicParams =
            serde_json::from_str(r#"{ "name_threshold": 200, "go_alone_min_trump": 5 }"#)
                .unwrap();
        assert_eq!(params.name_threshold, 200);
        assert_eq!(params.go_alone_min_trump, Some(5));
        assert_eq!(params.power_weight, 0.3);
        assert_eq!(params.accept_chance[2], 0.25);
    }
}

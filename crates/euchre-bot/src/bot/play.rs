use super::normalized_power;
use super::params::HeuristicParams;
use euchre_core::game::seat::SeatView;
use euchre_core::model::card::Card;
use euchre_core::model::suit::Suit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCard {
    pub card: Card,
    pub likelihood: f64,
    pub posterior: f64,
}

/// Picks a card to play from the legal set using only what the seat can see.
pub struct PlayPlanner;

impl PlayPlanner {
    pub fn choose(legal: &[Card], view: &SeatView, params: &HeuristicParams) -> Option<Card> {
        let scored = Self::score(legal, view, params);
        let mut best: Option<ScoredCard> = None;
        for candidate in scored {
            match best {
                Some(current) if candidate.posterior <= current.posterior => {}
                _ => best = Some(candidate),
            }
        }
        best.map(|scored| scored.card)
    }

    /// Likelihood and posterior for every legal card, in the order given.
    pub fn score(legal: &[Card], view: &SeatView, params: &HeuristicParams) -> Vec<ScoredCard> {
        let Some(trump) = view.trump else {
            return Vec::new();
        };
        let lead = view.lead_suit;
        let partner_winning = partner_is_winning(view, trump);
        let prior = 1.0 / legal.len().max(1) as f64;

        legal
            .iter()
            .map(|card| {
                let mut np = normalized_power(card.power(trump, lead));
                let bonus = if view.is_leading() {
                    np
                } else if partner_winning {
                    np = 1.0 - np;
                    params.partner_winning_bonus
                } else {
                    params.follow_scale * np
                };
                let likelihood =
                    (params.power_weight * np + params.bonus_weight * bonus).clamp(0.0, 1.0);
                ScoredCard {
                    card: *card,
                    likelihood,
                    posterior: likelihood * prior,
                }
            })
            .collect()
    }
}

/// Partner has played to this trick and nothing committed so far beats it.
fn partner_is_winning(view: &SeatView, trump: Suit) -> bool {
    let Some(partner_card) = view.card_of(view.partner()) else {
        return false;
    };
    let lead = view.lead_suit;
    let partner_power = partner_card.power(trump, lead);
    view.trick
        .iter()
        .all(|play| partner_power >= play.card.power(trump, lead))
}

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use euchre_bot::{HeuristicParams, PlayPlanner};
use euchre_core::game::seat::SeatView;
use euchre_core::model::deck::Deck;
use euchre_core::model::player::PlayerPosition;
use euchre_core::model::round::RoundState;
use euchre_core::model::score::ScoreBoard;
use euchre_core::model::suit::Suit;

fn opening_lead(seed: u64) -> Option<(SeatView, Vec<euchre_core::model::card::Card>)> {
    let deck = Deck::shuffled_with_seed(seed);
    let mut round = RoundState::deal(&deck, PlayerPosition::North).ok()?;
    let exposed = round.exposed_card()?;
    for seat in [
        PlayerPosition::East,
        PlayerPosition::South,
        PlayerPosition::West,
        PlayerPosition::North,
    ] {
        round.accept_trump(seat, false).ok()?;
    }
    let named = Suit::ALL.into_iter().find(|suit| *suit != exposed.suit)?;
    round.name_trump(PlayerPosition::East, Some(named)).ok()?;
    round.declare_alone(PlayerPosition::East, false).ok()?;
    let legal = round.legal_cards(PlayerPosition::East);
    let view = SeatView::capture(&round, PlayerPosition::East, &ScoreBoard::new(), 1);
    Some((view, legal))
}

fn heuristic_decision_bench(c: &mut Criterion) {
    let params = HeuristicParams::default();
    let mut group = c.benchmark_group("heuristic_decision");
    for seed in [1040u64, 1082, 1145] {
        let Some((view, legal)) = opening_lead(seed) else {
            continue;
        };
        group.bench_function(format!("lead_{seed}"), |b| {
            b.iter(|| black_box(PlayPlanner::choose(&legal, &view, &params)))
        });
    }
    group.finish();
}

criterion_group!(benches, heuristic_decision_bench);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memory_match::adapter::server::{build_observation, state_hash};
use memory_match::core::{DeckProvider, FixedDeck, GameConfig, GameController, UpperLetters};
use memory_match::types::GameAction;

fn new_game() -> GameController<UpperLetters> {
    GameController::new(GameConfig::default(), UpperLetters::new(12345)).unwrap()
}

// (0, 0) and (0, 1) never match on this board.
fn mismatch_game() -> GameController<FixedDeck> {
    let ids = ["A", "B", "C", "D", "A", "B", "C", "D", "E", "E", "F", "F"];
    let deck = FixedDeck::new(FixedDeck::from_ids(&ids));
    GameController::new(GameConfig::default(), deck).unwrap()
}

fn bench_tick(c: &mut Criterion) {
    let mut game = new_game();
    game.select_card(0, 0);

    c.bench_function("game_tick_16ms", |b| {
        b.iter(|| {
            game.tick(black_box(16));
        })
    });
}

fn bench_select_pair(c: &mut Criterion) {
    let mut game = mismatch_game();

    c.bench_function("select_pair_and_resolve", |b| {
        b.iter(|| {
            game.select_card(black_box(0), black_box(0));
            game.select_card(black_box(0), black_box(1));
            game.cancel_pending_reveal();
            game.take_events();
        })
    });
}

fn bench_deal(c: &mut Criterion) {
    let mut deck = UpperLetters::new(12345);

    c.bench_function("deal_13_pairs", |b| {
        b.iter(|| deck.random_pairs(black_box(13)).unwrap())
    });
}

fn bench_restart(c: &mut Criterion) {
    let mut game = new_game();

    c.bench_function("restart", |b| {
        b.iter(|| {
            game.apply_action(GameAction::Restart).unwrap();
            game.take_events();
        })
    });
}

fn bench_observation(c: &mut Criterion) {
    let mut game = new_game();
    game.select_card(1, 1);

    c.bench_function("state_hash", |b| b.iter(|| state_hash(black_box(&game))));
    c.bench_function("build_observation", |b| {
        b.iter(|| build_observation(black_box(&game), 1, &[]))
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_select_pair,
    bench_deal,
    bench_restart,
    bench_observation
);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use indicatif::ProgressBar;
use mtg_playtest::card::{CardCatalogue, DeckStore, InMemoryDeckStore};
use mtg_playtest::game::{Match, MatchConfig};
use mtg_playtest::ids::PlayerId;
use mtg_playtest::simulation::{run_goldfish, sample_opening_hands};

fn load_store() -> InMemoryDeckStore {
    InMemoryDeckStore::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/decks.json"))
        .expect("Failed to load decks")
}

fn benchmark_load_deck(c: &mut Criterion) {
    let deck = load_store().get_deck(1).expect("Missing deck 1");
    let catalogue = CardCatalogue::builtin();

    c.bench_function("load_commander_deck", |b| {
        b.iter(|| {
            let mut game = Match::with_catalogue(MatchConfig::default().with_seed(12345), catalogue.clone())
                .expect("match setup failed");
            game.load_deck(PlayerId(1), black_box(&deck)).expect("load failed");
            game
        })
    });
}

fn benchmark_goldfish(c: &mut Criterion) {
    let store = load_store();
    let deck = store.get_deck(2).expect("Missing deck 2");
    let opponent = store.get_deck(1).expect("Missing deck 1");
    let catalogue = CardCatalogue::builtin();
    let config = MatchConfig::default();

    c.bench_function("goldfish_10_turns_seed_12345", |b| {
        b.iter(|| {
            run_goldfish(
                black_box(&deck),
                Some(&opponent),
                10,
                &config,
                &catalogue,
                black_box(12345),
                false,
            )
        })
    });
}

fn benchmark_opening_hands(c: &mut Criterion) {
    let deck = load_store().get_deck(1).expect("Missing deck 1");
    let catalogue = CardCatalogue::builtin();
    let config = MatchConfig::default();
    let bar = ProgressBar::hidden();

    c.bench_function("1000_opening_hands", |b| {
        b.iter(|| sample_opening_hands(black_box(&deck), &catalogue, &config, 1000, 0, &bar))
    });
}

criterion_group!(benches, benchmark_load_deck, benchmark_goldfish, benchmark_opening_hands);
criterion_main!(benches);

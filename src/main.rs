use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use mtg_playtest::card::{CardCatalogue, Deck, DeckStore, InMemoryDeckStore};
use mtg_playtest::game::MatchConfig;
use mtg_playtest::ids::DeckId;
use mtg_playtest::rng::GameRng;
use mtg_playtest::simulation::{run_goldfish, sample_opening_hands, GoldfishResult, HandReport};
use rayon::prelude::*;
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "mtg-playtest")]
#[command(about = "Deck testing on top of the mtg-playtest match engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Match configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Extra card catalogue (JSON) merged over the built-in one
    #[arg(long, global = true)]
    catalogue: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample opening hands
    Hands {
        /// Deck file (JSON array of decks)
        #[arg(long, default_value = "decks.json")]
        decks: String,

        /// Deck id within the file
        #[arg(long)]
        deck: DeckId,

        /// Number of hands to deal
        #[arg(short, long, default_value = "10000")]
        games: usize,

        /// Base seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Play autopilot matches against a passive opponent
    Goldfish {
        /// Deck file (JSON array of decks)
        #[arg(long, default_value = "decks.json")]
        decks: String,

        /// Deck id within the file
        #[arg(long)]
        deck: DeckId,

        /// Optional opponent deck id
        #[arg(long)]
        opponent: Option<DeckId>,

        /// Rounds to play
        #[arg(short, long, default_value = "10")]
        turns: u32,

        /// Number of matches
        #[arg(short, long, default_value = "1")]
        games: usize,

        /// Base seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Print every event of the first match
        #[arg(long)]
        trace: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    simple_logging::log_to_stderr(level);

    let config = match &cli.config {
        Some(path) => match MatchConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ Failed to load config '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => MatchConfig::default(),
    };

    let mut catalogue = CardCatalogue::builtin();
    if let Some(path) = &cli.catalogue {
        match CardCatalogue::from_file(path) {
            Ok(extra) => {
                eprintln!("✓ Loaded {} catalogue entries from {}", extra.len(), path);
                for name in extra.names() {
                    if let Some(traits) = extra.get(name) {
                        catalogue.insert(name, traits.clone());
                    }
                }
            }
            Err(e) => {
                eprintln!("✗ Failed to load catalogue '{}': {}", path, e);
                std::process::exit(1);
            }
        }
    }

    match cli.command {
        Commands::Hands {
            decks,
            deck,
            games,
            seed,
        } => {
            let store = load_store(&decks);
            let deck = fetch_deck(&store, deck);
            run_hands(&deck, &catalogue, &config, games, seed.or(config.seed));
        }
        Commands::Goldfish {
            decks,
            deck,
            opponent,
            turns,
            games,
            seed,
            trace,
        } => {
            let store = load_store(&decks);
            let deck = fetch_deck(&store, deck);
            let opponent = opponent.map(|id| fetch_deck(&store, id));
            run_goldfish_batch(
                &deck,
                opponent.as_ref(),
                &catalogue,
                &config,
                turns,
                games,
                seed.or(config.seed),
                trace,
            );
        }
    }
}

fn load_store(path: &str) -> InMemoryDeckStore {
    match InMemoryDeckStore::from_file(path) {
        Ok(store) => {
            eprintln!("✓ Loaded {} decks from {}", store.deck_ids().len(), path);
            store
        }
        Err(e) => {
            eprintln!("✗ Failed to load decks: {}", e);
            std::process::exit(1);
        }
    }
}

fn fetch_deck(store: &InMemoryDeckStore, id: DeckId) -> Deck {
    match store.get_deck(id) {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} ({eta})") {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

fn run_hands(deck: &Deck, catalogue: &CardCatalogue, config: &MatchConfig, games: usize, seed: Option<u64>) {
    let base_seed = seed.unwrap_or_else(|| GameRng::new(None).seed());

    println!("\n=== Opening Hands ===\n");
    println!("Deck: {} ({} cards)", deck.name, deck.card_count());
    println!("Hands: {}", games);
    println!("Seed: {}", base_seed);
    println!();

    let start = std::time::Instant::now();
    let bar = progress_bar(games);
    let hands = match sample_opening_hands(deck, catalogue, config, games, base_seed, &bar) {
        Ok(hands) => hands,
        Err(e) => {
            eprintln!("✗ Failed to deal hands: {}", e);
            std::process::exit(1);
        }
    };
    bar.finish_and_clear();
    let elapsed = start.elapsed();
    let report = HandReport::from_hands(&hands);

    println!("=== Results ===\n");
    println!("Keepable (2-4 lands): {:.1}%", report.keep_rate() * 100.0);
    println!("Average lands: {:.2}", report.avg_lands);
    println!("Average spell curve: {:.2}", report.avg_curve);
    println!();
    println!("Land distribution:");
    for (lands, count) in &report.land_counts {
        let pct = *count as f64 / report.games as f64 * 100.0;
        let bar = "█".repeat((pct / 2.0) as usize);
        println!("  {} lands: {:5.1}% {} ({})", lands, pct, bar, count);
    }
    println!();
    println!(
        "Dealt in {:.2?} ({:.0} hands/sec)",
        elapsed,
        games as f64 / elapsed.as_secs_f64()
    );
}

#[allow(clippy::too_many_arguments)]
fn run_goldfish_batch(
    deck: &Deck,
    opponent: Option<&Deck>,
    catalogue: &CardCatalogue,
    config: &MatchConfig,
    turns: u32,
    games: usize,
    seed: Option<u64>,
    trace: bool,
) {
    let base_seed = seed.unwrap_or_else(|| GameRng::new(None).seed());

    println!("\n=== Goldfish ===\n");
    println!("Deck: {}", deck.name);
    if let Some(opponent) = opponent {
        println!("Opponent: {}", opponent.name);
    }
    println!("Matches: {} x {} turns", games, turns);
    println!("Seed: {}", base_seed);
    println!();

    if trace && games > 0 {
        if let Err(e) = run_goldfish(deck, opponent, turns, config, catalogue, base_seed, true) {
            eprintln!("✗ Match failed: {}", e);
        }
        println!();
    }

    let bar = progress_bar(games);
    let results: Vec<GoldfishResult> = (0..games)
        .into_par_iter()
        .filter_map(|i| {
            let seed = base_seed.wrapping_add(i as u64);
            let result = run_goldfish(deck, opponent, turns, config, catalogue, seed, false);
            bar.inc(1);
            match result {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("Match with seed {} stopped: {}", seed, e);
                    None
                }
            }
        })
        .collect();
    bar.finish_and_clear();

    let completed = results.len().max(1) as f64;
    let kills: Vec<u32> = results
        .iter()
        .filter_map(|r| r.defeated.filter(|(p, _)| p.0 != 1).map(|(_, turn)| turn))
        .collect();
    let mut kill_turns: BTreeMap<u32, usize> = BTreeMap::new();
    for turn in &kills {
        *kill_turns.entry(*turn).or_insert(0) += 1;
    }

    println!("=== Results ===\n");
    println!(
        "Average opponent life lost: {:.1}",
        results.iter().map(|r| r.opponent_life_lost as f64).sum::<f64>() / completed
    );
    println!(
        "Average lands played: {:.1}",
        results.iter().map(|r| r.lands_played as f64).sum::<f64>() / completed
    );
    println!(
        "Average spells cast: {:.1}",
        results.iter().map(|r| r.spells_cast as f64).sum::<f64>() / completed
    );
    println!("Kill rate: {:.1}% ({}/{})", kills.len() as f64 / completed * 100.0, kills.len(), results.len());
    for (turn, count) in kill_turns {
        let pct = count as f64 / completed * 100.0;
        let bar = "█".repeat((pct / 2.0) as usize);
        println!("  Turn {:2}: {:5.1}% {} ({})", turn, pct, bar, count);
    }
}

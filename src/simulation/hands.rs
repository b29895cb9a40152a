//! Opening hand sampling

use crate::card::{CardCatalogue, Deck};
use crate::game::{GameResult, Match, MatchConfig};
use crate::ids::PlayerId;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// One dealt opening hand
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningHand {
    pub seed: u64,
    pub lands: usize,
    pub spells: usize,
    /// Sum of the non-land cards' mana values
    pub curve: u32,
}

impl OpeningHand {
    /// Two to four lands is a keep
    pub fn is_keepable(&self) -> bool {
        (2..=4).contains(&self.lands)
    }
}

/// Aggregate over many opening hands
#[derive(Debug, Clone, Default)]
pub struct HandReport {
    pub games: usize,
    pub land_counts: BTreeMap<usize, usize>,
    pub keepable: usize,
    pub avg_lands: f64,
    pub avg_curve: f64,
}

impl HandReport {
    pub fn from_hands(hands: &[OpeningHand]) -> Self {
        let games = hands.len();
        let mut land_counts = BTreeMap::new();
        for hand in hands {
            *land_counts.entry(hand.lands).or_insert(0) += 1;
        }
        let avg = |total: f64| if games == 0 { 0.0 } else { total / games as f64 };
        HandReport {
            games,
            land_counts,
            keepable: hands.iter().filter(|h| h.is_keepable()).count(),
            avg_lands: avg(hands.iter().map(|h| h.lands as f64).sum()),
            avg_curve: avg(hands.iter().map(|h| h.curve as f64).sum()),
        }
    }

    pub fn keep_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.keepable as f64 / self.games as f64
        }
    }
}

/// Deal one opening hand the way a match would
pub fn deal_opening_hand(
    deck: &Deck,
    catalogue: &CardCatalogue,
    config: &MatchConfig,
    seed: u64,
) -> GameResult<OpeningHand> {
    let mut game = Match::with_catalogue(config.clone().with_seed(seed), catalogue.clone())?;
    game.load_deck(PlayerId(1), deck)?;
    let hand = &game.state().player(PlayerId(1))?.hand;
    let lands = hand.iter().filter(|c| c.card.is_land()).count();
    Ok(OpeningHand {
        seed,
        lands,
        spells: hand.len() - lands,
        curve: hand
            .iter()
            .filter(|c| !c.card.is_land())
            .map(|c| c.card.cmc)
            .sum(),
    })
}

/// Deal `games` opening hands in parallel. Game `i` uses seed
/// `base_seed + i`, so a run is reproducible.
pub fn sample_opening_hands(
    deck: &Deck,
    catalogue: &CardCatalogue,
    config: &MatchConfig,
    games: usize,
    base_seed: u64,
    progress: &ProgressBar,
) -> GameResult<Vec<OpeningHand>> {
    (0..games)
        .into_par_iter()
        .map(|i| {
            let hand = deal_opening_hand(deck, catalogue, config, base_seed.wrapping_add(i as u64));
            progress.inc(1);
            hand
        })
        .collect()
}

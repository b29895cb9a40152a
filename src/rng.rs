use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded random source for a match. Every shuffle and insertion point is
/// drawn from here so a seed replays a match exactly.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new GameRng. Without a seed one is drawn from the thread rng.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        GameRng {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Random integer in [0, max)
    pub fn random_range(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }

    /// Fisher-Yates shuffle of a whole slice
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.random_range(i + 1);
            items.swap(i, j);
        }
    }

    /// Shuffle only `items[from..]`, leaving the prefix where it is
    pub fn shuffle_from<T>(&mut self, items: &mut [T], from: usize) {
        if from < items.len() {
            self.shuffle(&mut items[from..]);
        }
    }

    /// Uniform insertion index in [from, len], so a card can land anywhere
    /// in the undrawn part of a library including the very bottom
    pub fn insert_position(&mut self, from: usize, len: usize) -> usize {
        let from = from.min(len);
        from + self.random_range(len - from + 1)
    }
}

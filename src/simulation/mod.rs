pub mod goldfish;
pub mod hands;

pub use goldfish::{play_turn, run_goldfish, GoldfishResult};
pub use hands::{deal_opening_hand, sample_opening_hands, HandReport, OpeningHand};

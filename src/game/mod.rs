pub mod combat;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod mana;
pub mod player;
pub mod stack;
pub mod state;
pub mod targeting;
pub mod turn;
pub mod zones;

pub use combat::{CombatDamage, CombatState, DamageTarget};
pub use config::{ConfigError, MatchConfig};
pub use engine::Match;
pub use error::{GameError, GameResult};
pub use events::GameEvent;
pub use mana::{ManaPool, ManaSource, ManaState};
pub use player::{DrawHandle, PlayerState, Row};
pub use stack::{Stack, StackItem, StackItemKind};
pub use state::{Clock, MatchState};
pub use targeting::{PendingCast, TargetingState};
pub use turn::{Phase, Step, TurnState};
pub use zones::{BattlefieldCard, DrawnCard, GraveyardCard, Library, SearchAction, ShuffledCard};

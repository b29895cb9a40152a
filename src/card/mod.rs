pub mod catalogue;
pub mod deck;
pub mod types;

pub use catalogue::{normalize_name, CardCatalogue, CardTraits, CatalogueError};
pub use deck::{Deck, DeckCard, DeckError, DeckStore, InMemoryDeckStore};
pub use types::{
    AbilityCost, ActivatedAbility, Card, CardKind, EffectKind, Keyword, ManaColor, SpellEffect,
    TargetType,
};

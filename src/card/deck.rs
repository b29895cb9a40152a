use crate::card::catalogue::CardCatalogue;
use crate::card::types::{Card, CardKind};
use crate::ids::{CardId, DeckId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Deck not found: {0}")]
    NotFound(DeckId),
}

/// A card entry as the deck store hands it over: printed data plus a quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckCard {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub cmc: Option<u32>,
    #[serde(default, alias = "type")]
    pub type_line: Option<String>,
    #[serde(default, alias = "oracle_text")]
    pub text: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub toughness: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

/// Printed power/toughness like "3", "*" or "1+*". Anything non-numeric is 0.
fn parse_stat(stat: &Option<String>) -> u32 {
    stat.as_deref()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

impl DeckCard {
    pub fn new(id: u32, name: &str, type_line: &str, cmc: u32) -> Self {
        DeckCard {
            id: CardId(id),
            name: name.to_string(),
            mana_cost: None,
            cmc: Some(cmc),
            type_line: Some(type_line.to_string()),
            text: None,
            power: None,
            toughness: None,
            rarity: None,
            image_url: None,
            quantity: 1,
        }
    }

    pub fn with_stats(mut self, power: &str, toughness: &str) -> Self {
        self.power = Some(power.to_string());
        self.toughness = Some(toughness.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Build the engine card: resolve the kind, parse stats and apply the catalogue
    pub fn to_card(&self, catalogue: &CardCatalogue) -> Card {
        let type_line = self.type_line.clone().unwrap_or_default();
        let kind = CardKind::from_type_line(&type_line);
        let creature = kind == CardKind::Creature;
        let card = Card {
            id: self.id,
            name: self.name.clone(),
            mana_cost: self.mana_cost.clone().unwrap_or_default(),
            cmc: self.cmc.unwrap_or(0),
            type_line,
            kind,
            power: (creature || self.power.is_some()).then(|| parse_stat(&self.power)),
            toughness: (creature || self.toughness.is_some()).then(|| parse_stat(&self.toughness)),
            text: self.text.clone().unwrap_or_default(),
            rarity: self.rarity.clone(),
            image_url: self.image_url.clone(),
            keywords: Vec::new(),
            effects: Vec::new(),
            activated_abilities: Vec::new(),
        };
        catalogue.enrich(card)
    }
}

/// A saved deck as provided by the deck store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub commander_id: Option<CardId>,
    pub cards: Vec<DeckCard>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(id: DeckId, name: &str, cards: Vec<DeckCard>) -> Self {
        Deck {
            id,
            name: name.to_string(),
            description: String::new(),
            commander_id: None,
            cards,
            created_at: Utc::now(),
        }
    }

    pub fn with_commander(mut self, commander: CardId) -> Self {
        self.commander_id = Some(commander);
        self
    }

    /// Total number of physical cards, commander included
    pub fn card_count(&self) -> usize {
        self.cards.iter().map(|c| c.quantity as usize).sum()
    }

    /// The commander card, if the deck names one that it actually contains
    pub fn commander(&self, catalogue: &CardCatalogue) -> Option<Card> {
        let id = self.commander_id?;
        self.cards
            .iter()
            .find(|c| c.id == id && c.quantity > 0)
            .map(|c| c.to_card(catalogue))
    }

    /// Every card that starts in the library: quantities expanded, one copy
    /// of the commander held back for the command zone
    pub fn library_cards(&self, catalogue: &CardCatalogue) -> Vec<Card> {
        let mut held_back = false;
        let mut cards = Vec::with_capacity(self.card_count());
        for entry in &self.cards {
            let card = entry.to_card(catalogue);
            for _ in 0..entry.quantity {
                if !held_back && Some(entry.id) == self.commander_id {
                    held_back = true;
                    continue;
                }
                cards.push(card.clone());
            }
        }
        cards
    }
}

/// Source of saved decks
pub trait DeckStore {
    fn get_deck(&self, id: DeckId) -> Result<Deck, DeckError>;
}

/// Deck store backed by a map, optionally loaded from a JSON array of decks
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeckStore {
    decks: HashMap<DeckId, Deck>,
}

impl InMemoryDeckStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DeckError> {
        let content = std::fs::read_to_string(path)?;
        let decks: Vec<Deck> = serde_json::from_str(&content)?;
        let mut store = InMemoryDeckStore::new();
        for deck in decks {
            store.insert(deck);
        }
        Ok(store)
    }

    pub fn insert(&mut self, deck: Deck) {
        self.decks.insert(deck.id, deck);
    }

    pub fn deck_ids(&self) -> Vec<DeckId> {
        let mut ids: Vec<DeckId> = self.decks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl DeckStore for InMemoryDeckStore {
    fn get_deck(&self, id: DeckId) -> Result<Deck, DeckError> {
        self.decks.get(&id).cloned().ok_or(DeckError::NotFound(id))
    }
}

use crate::card::types::{
    AbilityCost, ActivatedAbility, Card, EffectKind, Keyword, ManaColor, SpellEffect, TargetType,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid ability cost: {0}")]
    InvalidCost(String),
}

/// Gameplay data layered on top of a card's printed data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardTraits {
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub effects: Vec<SpellEffect>,
    #[serde(default)]
    pub activated_abilities: Vec<ActivatedAbility>,
}

#[derive(Debug, Deserialize)]
struct CatalogueEntry {
    name: String,
    #[serde(flatten)]
    traits: CardTraits,
}

/// Catalogue keys are trimmed and lowercased card names
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Lookup table from card name to keywords, spell effects and activated
/// abilities. Cards missing from the catalogue stay vanilla.
#[derive(Debug, Clone, Default)]
pub struct CardCatalogue {
    traits: HashMap<String, CardTraits>,
}

impl CardCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalogue from a JSON array of `{ "name": ..., traits }` entries
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogueError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogueError> {
        let entries: Vec<CatalogueEntry> = serde_json::from_str(content)?;
        let mut catalogue = CardCatalogue::new();
        for entry in entries {
            catalogue.insert(&entry.name, entry.traits);
        }
        Ok(catalogue)
    }

    pub fn insert(&mut self, name: &str, traits: CardTraits) {
        self.traits.insert(normalize_name(name), traits);
    }

    pub fn get(&self, name: &str) -> Option<&CardTraits> {
        self.traits.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.traits.contains_key(&normalize_name(name))
    }

    /// Sorted list of every catalogued name
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.traits.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// Attach catalogue traits to a card. Keywords printed in the oracle
    /// text are picked up even when the card is not catalogued.
    pub fn enrich(&self, mut card: Card) -> Card {
        if let Some(traits) = self.get(&card.name) {
            debug!("Enriching {} from catalogue", card.name);
            card = card.with_keywords(&traits.keywords);
            if !traits.effects.is_empty() {
                card.effects = traits.effects.clone();
            }
            if !traits.activated_abilities.is_empty() {
                card.activated_abilities = traits.activated_abilities.clone();
            }
        }
        let printed = Keyword::scan(&card.text);
        card.with_keywords(&printed)
    }

    /// The catalogue shipped with the simulator
    pub fn builtin() -> Self {
        let mut c = CardCatalogue::new();

        // Spells
        c.insert("Lightning Bolt", spell(vec![bolt(3)]));
        c.insert("Fireball", spell(vec![bolt(2)]));
        c.insert("Divination", spell(vec![draw(2)]));
        c.insert("Ancient Craving", spell(vec![draw(3)]));
        c.insert("Ancient Cravings", spell(vec![draw(3)]));
        c.insert("Healing Salve", spell(vec![gain_life(3)]));
        c.insert(
            "Doom Blade",
            spell(vec![SpellEffect::new(
                EffectKind::Destroy,
                0,
                "Destroy target creature",
            )
            .targeting(TargetType::Creature)]),
        );
        c.insert(
            "Path to Exile",
            spell(vec![SpellEffect::new(
                EffectKind::Exile,
                0,
                "Exile target creature",
            )
            .targeting(TargetType::Creature)]),
        );
        c.insert(
            "Unsummon",
            spell(vec![SpellEffect::new(
                EffectKind::Bounce,
                0,
                "Return target creature to its owner's hand",
            )
            .targeting(TargetType::Creature)]),
        );
        c.insert(
            "Precognition",
            spell(vec![SpellEffect::new(EffectKind::Scry, 3, "Scry 3")]),
        );
        c.insert("Lightning Helix", spell(vec![bolt(3), gain_life(3)]));

        // Keyword creatures
        c.insert("Griffin Sentinel", keywords(&[Keyword::Flying, Keyword::Vigilance]));
        c.insert("Goblin Raider", keywords(&[Keyword::Haste]));
        c.insert("Deathtouch Assassin", keywords(&[Keyword::Deathtouch]));
        c.insert("Serra Angel", keywords(&[Keyword::Flying, Keyword::Vigilance]));
        c.insert("Shivan Dragon", keywords(&[Keyword::Flying]));
        c.insert("Lightning Elemental", keywords(&[Keyword::Haste]));
        c.insert(
            "Vampire Nighthawk",
            keywords(&[Keyword::Flying, Keyword::Deathtouch, Keyword::Lifelink]),
        );
        c.insert("Woolly Thoctar", keywords(&[Keyword::Trample]));
        c.insert("Giant Spider", keywords(&[Keyword::Reach]));

        // Tappers and utility creatures
        c.insert("Prodigal Pyromancer", abilities(vec![tap_ping(1)]));
        c.insert("Goblin Sharpshooter", abilities(vec![tap_ping(1)]));
        c.insert("Fireball Wizard", abilities(vec![paid_burn()]));
        c.insert("Merfolk Looter", abilities(vec![tap_draw()]));
        c.insert("Soul Warden", abilities(vec![tap_gain_life()]));
        c.insert("Sage of Mysteries", abilities(vec![tap_scry(), paid_draw()]));

        // Mana creatures and rocks
        c.insert("Llanowar Elves", abilities(vec![tap_add(ManaColor::Green, 1)]));
        c.insert("Elvish Mystic", abilities(vec![tap_add(ManaColor::Green, 1)]));
        c.insert(
            "Birds of Paradise",
            CardTraits {
                keywords: vec![Keyword::Flying],
                activated_abilities: ManaColor::COLORED
                    .iter()
                    .map(|color| tap_add(*color, 1))
                    .collect(),
                ..CardTraits::default()
            },
        );
        c.insert("Sol Ring", abilities(vec![tap_add(ManaColor::Colorless, 2)]));
        c.insert("Jayemdae Tome", abilities(vec![paid_draw()]));

        // Lands
        c.insert("Mishra's Factory", abilities(vec![tap_add(ManaColor::Colorless, 1)]));
        c.insert("Treetop Village", abilities(vec![tap_add(ManaColor::Green, 1)]));
        c.insert("Plains", abilities(vec![tap_add(ManaColor::White, 1)]));
        c.insert("Island", abilities(vec![tap_add(ManaColor::Blue, 1)]));
        c.insert("Swamp", abilities(vec![tap_add(ManaColor::Black, 1)]));
        c.insert("Mountain", abilities(vec![tap_add(ManaColor::Red, 1)]));
        c.insert("Forest", abilities(vec![tap_add(ManaColor::Green, 1)]));

        c
    }
}

fn spell(effects: Vec<SpellEffect>) -> CardTraits {
    CardTraits {
        effects,
        ..CardTraits::default()
    }
}

fn keywords(keywords: &[Keyword]) -> CardTraits {
    CardTraits {
        keywords: keywords.to_vec(),
        ..CardTraits::default()
    }
}

fn abilities(activated_abilities: Vec<ActivatedAbility>) -> CardTraits {
    CardTraits {
        activated_abilities,
        ..CardTraits::default()
    }
}

fn bolt(amount: u32) -> SpellEffect {
    SpellEffect::new(
        EffectKind::Damage,
        amount,
        &format!("Deal {} damage to target creature or player", amount),
    )
    .targeting(TargetType::CreatureOrPlayer)
}

fn draw(count: u32) -> SpellEffect {
    let description = if count == 1 {
        "Draw a card".to_string()
    } else {
        format!("Draw {} cards", count)
    };
    SpellEffect::new(EffectKind::Draw, count, &description)
}

fn gain_life(amount: u32) -> SpellEffect {
    SpellEffect::new(EffectKind::LifeGain, amount, &format!("Gain {} life", amount))
}

fn ability(id: &str, cost: AbilityCost, effect: SpellEffect) -> ActivatedAbility {
    let prefix = match cost {
        AbilityCost::Tap => "{T}".to_string(),
        AbilityCost::Mana(n) => format!("{{{}}}", n),
    };
    ActivatedAbility {
        id: id.to_string(),
        cost,
        description: format!("{}: {}", prefix, effect.description),
        effect,
    }
}

fn tap_ping(amount: u32) -> ActivatedAbility {
    ability("tap_deal_damage", AbilityCost::Tap, bolt(amount))
}

fn paid_burn() -> ActivatedAbility {
    ability("paid_deal_damage", AbilityCost::Mana(2), bolt(3))
}

fn tap_draw() -> ActivatedAbility {
    ability("tap_draw_card", AbilityCost::Tap, draw(1))
}

fn paid_draw() -> ActivatedAbility {
    ability("paid_draw_card", AbilityCost::Mana(3), draw(1))
}

fn tap_gain_life() -> ActivatedAbility {
    ability("tap_gain_life", AbilityCost::Tap, gain_life(2))
}

fn tap_scry() -> ActivatedAbility {
    ability(
        "tap_scry",
        AbilityCost::Tap,
        SpellEffect::new(EffectKind::Scry, 1, "Scry 1"),
    )
}

fn tap_add(color: ManaColor, amount: u32) -> ActivatedAbility {
    let symbol = color.to_char().to_string().repeat(amount as usize);
    let description = format!(
        "Add {}",
        symbol.chars().map(|c| format!("{{{}}}", c)).collect::<String>()
    );
    ability(
        &format!("tap_add_{}", color),
        AbilityCost::Tap,
        SpellEffect::new(EffectKind::Mana { color }, amount, &description),
    )
}

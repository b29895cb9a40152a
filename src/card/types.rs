use crate::card::catalogue::CatalogueError;
use crate::ids::{CardId, TargetId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mana colors in Magic: The Gathering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ManaColor {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "U")]
    Blue,
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "C")]
    Colorless,
}

impl ManaColor {
    /// Colored buckets in the order generic costs drain them
    pub const COLORED: [ManaColor; 5] = [
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
    ];

    /// Convert to the single character representation
    pub fn to_char(&self) -> char {
        match self {
            ManaColor::White => 'W',
            ManaColor::Blue => 'U',
            ManaColor::Black => 'B',
            ManaColor::Red => 'R',
            ManaColor::Green => 'G',
            ManaColor::Colorless => 'C',
        }
    }

    /// Color a land taps for, inferred from its name. Unknown lands make colorless.
    pub fn for_land_name(name: &str) -> ManaColor {
        let name = name.to_lowercase();
        if name.contains("plains") {
            ManaColor::White
        } else if name.contains("island") {
            ManaColor::Blue
        } else if name.contains("swamp") {
            ManaColor::Black
        } else if name.contains("mountain") {
            ManaColor::Red
        } else if name.contains("forest") {
            ManaColor::Green
        } else {
            ManaColor::Colorless
        }
    }
}

impl fmt::Display for ManaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManaColor::White => "white",
            ManaColor::Blue => "blue",
            ManaColor::Black => "black",
            ManaColor::Red => "red",
            ManaColor::Green => "green",
            ManaColor::Colorless => "colorless",
        };
        f.write_str(name)
    }
}

/// Card categories, resolved once from the type line when a card is enriched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Land,
    Creature,
    Artifact,
    Enchantment,
    Planeswalker,
    Instant,
    Sorcery,
    Other,
}

impl CardKind {
    /// Classify a type line by the card types before the subtype dash.
    /// Creature wins over artifact/enchantment so "Artifact Creature"
    /// fights; land wins over everything.
    pub fn from_type_line(type_line: &str) -> CardKind {
        let types = type_line
            .split(['—', '-'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let words: Vec<&str> = types.split_whitespace().collect();
        let has = |word: &str| words.contains(&word);
        if has("land") {
            CardKind::Land
        } else if has("creature") {
            CardKind::Creature
        } else if has("planeswalker") {
            CardKind::Planeswalker
        } else if has("artifact") {
            CardKind::Artifact
        } else if has("enchantment") {
            CardKind::Enchantment
        } else if has("instant") {
            CardKind::Instant
        } else if has("sorcery") {
            CardKind::Sorcery
        } else {
            CardKind::Other
        }
    }

    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            CardKind::Land
                | CardKind::Creature
                | CardKind::Artifact
                | CardKind::Enchantment
                | CardKind::Planeswalker
        )
    }
}

/// Evergreen keywords the engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    Flying,
    FirstStrike,
    DoubleStrike,
    Trample,
    Vigilance,
    Haste,
    Lifelink,
    Deathtouch,
    Reach,
    Hexproof,
    Indestructible,
}

impl Keyword {
    pub const ALL: [Keyword; 11] = [
        Keyword::Flying,
        Keyword::FirstStrike,
        Keyword::DoubleStrike,
        Keyword::Trample,
        Keyword::Vigilance,
        Keyword::Haste,
        Keyword::Lifelink,
        Keyword::Deathtouch,
        Keyword::Reach,
        Keyword::Hexproof,
        Keyword::Indestructible,
    ];

    /// How the keyword is spelled in oracle text
    pub fn oracle_name(&self) -> &'static str {
        match self {
            Keyword::Flying => "flying",
            Keyword::FirstStrike => "first strike",
            Keyword::DoubleStrike => "double strike",
            Keyword::Trample => "trample",
            Keyword::Vigilance => "vigilance",
            Keyword::Haste => "haste",
            Keyword::Lifelink => "lifelink",
            Keyword::Deathtouch => "deathtouch",
            Keyword::Reach => "reach",
            Keyword::Hexproof => "hexproof",
            Keyword::Indestructible => "indestructible",
        }
    }

    /// Keywords printed on the card's own keyword line, the first line of
    /// oracle text. Keywords mentioned in rules text don't count.
    pub fn scan(text: &str) -> Vec<Keyword> {
        let first = text.lines().next().unwrap_or_default();
        let line = first.split('(').next().unwrap_or_default().to_lowercase();
        let printed: Vec<&str> = line
            .split([',', ';'])
            .map(|w| w.trim().trim_end_matches('.'))
            .collect();
        Keyword::ALL
            .iter()
            .copied()
            .filter(|k| printed.contains(&k.oracle_name()))
            .collect()
    }
}

/// What a spell or ability is allowed to target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Creature,
    Land,
    Player,
    CreatureOrPlayer,
    Any,
}

/// The effect vocabulary understood by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Damage,
    Draw,
    Destroy,
    Exile,
    Bounce,
    LifeGain,
    LifeLoss,
    Scry,
    Mana { color: ManaColor },
}

/// One effect of a spell or ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellEffect {
    pub kind: EffectKind,
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub target_type: Option<TargetType>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requires_target: bool,
    /// Filled in when targeting is confirmed
    #[serde(default)]
    pub targets: Vec<TargetId>,
}

impl SpellEffect {
    pub fn new(kind: EffectKind, value: u32, description: &str) -> Self {
        SpellEffect {
            kind,
            value,
            target_type: None,
            description: description.to_string(),
            requires_target: false,
            targets: Vec::new(),
        }
    }

    /// Same effect, but it asks for a target of the given type
    pub fn targeting(mut self, target_type: TargetType) -> Self {
        self.target_type = Some(target_type);
        self.requires_target = true;
        self
    }
}

/// Cost of an activated ability. Written `"T"` or a generic amount like `"2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AbilityCost {
    Tap,
    Mana(u32),
}

impl FromStr for AbilityCost {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("t") || s.eq_ignore_ascii_case("tap") {
            return Ok(AbilityCost::Tap);
        }
        s.parse::<u32>()
            .map(AbilityCost::Mana)
            .map_err(|_| CatalogueError::InvalidCost(s.to_string()))
    }
}

impl TryFrom<String> for AbilityCost {
    type Error = CatalogueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AbilityCost> for String {
    fn from(cost: AbilityCost) -> Self {
        match cost {
            AbilityCost::Tap => "T".to_string(),
            AbilityCost::Mana(n) => n.to_string(),
        }
    }
}

/// An activated ability printed on a permanent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatedAbility {
    pub id: String,
    pub cost: AbilityCost,
    pub effect: SpellEffect,
    pub description: String,
}

impl ActivatedAbility {
    /// Mana abilities resolve immediately and never use the stack
    pub fn is_mana_ability(&self) -> bool {
        matches!(self.effect.kind, EffectKind::Mana { .. })
    }
}

/// A card as it exists inside a match: template data plus the gameplay
/// data added by the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub cmc: u32,
    #[serde(default)]
    pub type_line: String,
    pub kind: CardKind,
    #[serde(default)]
    pub power: Option<u32>,
    #[serde(default)]
    pub toughness: Option<u32>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub effects: Vec<SpellEffect>,
    #[serde(default)]
    pub activated_abilities: Vec<ActivatedAbility>,
}

impl Card {
    /// Bare card with no gameplay data. Kind comes from the type line.
    pub fn new(id: CardId, name: &str, type_line: &str, cmc: u32) -> Self {
        Card {
            id,
            name: name.to_string(),
            mana_cost: String::new(),
            cmc,
            type_line: type_line.to_string(),
            kind: CardKind::from_type_line(type_line),
            power: None,
            toughness: None,
            text: String::new(),
            rarity: None,
            image_url: None,
            keywords: Vec::new(),
            effects: Vec::new(),
            activated_abilities: Vec::new(),
        }
    }

    pub fn with_stats(mut self, power: u32, toughness: u32) -> Self {
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    pub fn with_keywords(mut self, keywords: &[Keyword]) -> Self {
        for k in keywords {
            if !self.keywords.contains(k) {
                self.keywords.push(*k);
            }
        }
        self
    }

    pub fn with_effects(mut self, effects: Vec<SpellEffect>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_abilities(mut self, abilities: Vec<ActivatedAbility>) -> Self {
        self.activated_abilities = abilities;
        self
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    pub fn power(&self) -> u32 {
        self.power.unwrap_or(0)
    }

    pub fn toughness(&self) -> u32 {
        self.toughness.unwrap_or(0)
    }

    pub fn is_land(&self) -> bool {
        self.kind == CardKind::Land
    }

    pub fn is_creature(&self) -> bool {
        self.kind == CardKind::Creature
    }

    pub fn is_instant(&self) -> bool {
        self.kind == CardKind::Instant
    }

    pub fn is_permanent(&self) -> bool {
        self.kind.is_permanent()
    }

    /// Deals combat damage in the first-strike step
    pub fn strikes_first(&self) -> bool {
        self.has_keyword(Keyword::FirstStrike) || self.has_keyword(Keyword::DoubleStrike)
    }

    /// Deals combat damage in the regular step
    pub fn strikes_regular(&self) -> bool {
        !self.has_keyword(Keyword::FirstStrike) || self.has_keyword(Keyword::DoubleStrike)
    }

    /// First effect that needs a target, if any
    pub fn targeted_effect(&self) -> Option<&SpellEffect> {
        self.effects.iter().find(|e| e.requires_target)
    }
}

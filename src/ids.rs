use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical clock value. Every zone entry gets a fresh one from the match.
pub type Timestamp = u64;

/// Identifier of a deck in the external deck store
pub type DeckId = u32;

/// Identifier of a card template, shared by every copy of that card in a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seat identifier. Seats are numbered from 1 in turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player{}", self.0)
    }
}

/// A physical card on the battlefield: the template id plus the moment it
/// was placed. Two copies of the same card never share a placement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId {
    pub card: CardId,
    pub placed_at: Timestamp,
}

impl InstanceId {
    pub fn new(card: CardId, placed_at: Timestamp) -> Self {
        InstanceId { card, placed_at }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.card, self.placed_at)
    }
}

impl FromStr for InstanceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (card, placed_at) = s
            .rsplit_once('-')
            .ok_or_else(|| format!("'{}' is not an instance id", s))?;
        let card = card
            .parse()
            .map_err(|_| format!("'{}' is not a card id", card))?;
        let placed_at = placed_at
            .parse()
            .map_err(|_| format!("'{}' is not a timestamp", placed_at))?;
        Ok(InstanceId::new(CardId(card), placed_at))
    }
}

/// Something a spell or ability can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetId {
    Player(PlayerId),
    Permanent(InstanceId),
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Player(p) => write!(f, "{}", p),
            TargetId::Permanent(i) => write!(f, "{}", i),
        }
    }
}

/// Identifier of an object on the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackItemId(pub u64);

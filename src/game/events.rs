use crate::card::ManaColor;
use crate::game::turn::{Phase, Step};
use crate::ids::{PlayerId, TargetId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notices raised by the match for the UI to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    DeckLoaded { player: PlayerId, deck: String, library: usize },
    CardsDrawn { player: PlayerId, count: usize },
    LandPlayed { player: PlayerId, card: String },
    SpellCast { player: PlayerId, card: String },
    CommanderCast { player: PlayerId, card: String, cost: u32 },
    AbilityActivated { player: PlayerId, card: String, ability: String },
    ManaAdded { player: PlayerId, color: ManaColor, amount: u32 },
    Resolved { description: String },
    DamageDealt { source: String, target: TargetId, amount: u32 },
    LifeGained { player: PlayerId, amount: u32 },
    LifeLost { player: PlayerId, amount: u32 },
    PermanentDestroyed { player: PlayerId, card: String },
    PermanentExiled { player: PlayerId, card: String },
    PermanentReturned { player: PlayerId, card: String },
    CommanderReturned { player: PlayerId, card: String },
    PlayerDefeated { player: PlayerId },
    PhaseChanged { player: PlayerId, phase: Phase, step: Step },
    TurnStarted { player: PlayerId, turn: u32 },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::DeckLoaded { player, deck, library } => {
                write!(f, "{} loaded {} ({} cards in library)", player, deck, library)
            }
            GameEvent::CardsDrawn { player, count } => write!(f, "{} drew {}", player, count),
            GameEvent::LandPlayed { player, card } => write!(f, "{} played {}", player, card),
            GameEvent::SpellCast { player, card } => write!(f, "{} cast {}", player, card),
            GameEvent::CommanderCast { player, card, cost } => {
                write!(f, "{} cast commander {} for {}", player, card, cost)
            }
            GameEvent::AbilityActivated { player, card, ability } => {
                write!(f, "{} activated {}: {}", player, card, ability)
            }
            GameEvent::ManaAdded { player, color, amount } => {
                write!(f, "{} added {} {} mana", player, amount, color)
            }
            GameEvent::Resolved { description } => write!(f, "Resolved {}", description),
            GameEvent::DamageDealt { source, target, amount } => {
                write!(f, "{} dealt {} damage to {}", source, amount, target)
            }
            GameEvent::LifeGained { player, amount } => write!(f, "{} gained {} life", player, amount),
            GameEvent::LifeLost { player, amount } => write!(f, "{} lost {} life", player, amount),
            GameEvent::PermanentDestroyed { player, card } => {
                write!(f, "{}'s {} was destroyed", player, card)
            }
            GameEvent::PermanentExiled { player, card } => write!(f, "{}'s {} was exiled", player, card),
            GameEvent::PermanentReturned { player, card } => {
                write!(f, "{}'s {} returned to hand", player, card)
            }
            GameEvent::CommanderReturned { player, card } => {
                write!(f, "{}'s commander {} returned to the command zone", player, card)
            }
            GameEvent::PlayerDefeated { player } => write!(f, "{} has been defeated", player),
            GameEvent::PhaseChanged { player, phase, step } => {
                write!(f, "{} moved to {:?} / {:?}", player, phase, step)
            }
            GameEvent::TurnStarted { player, turn } => write!(f, "{} begins turn {}", player, turn),
        }
    }
}

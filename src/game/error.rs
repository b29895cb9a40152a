use crate::game::turn::{Phase, Step};
use crate::ids::{InstanceId, PlayerId};
use thiserror::Error;

/// Everything a match operation can refuse to do. The match is left
/// untouched whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    // Rule violations: shown to the user
    #[error("Can't do that during {phase:?} / {step:?}")]
    WrongPhase { phase: Phase, step: Step },
    #[error("{0} is not the active player")]
    NotActivePlayer(PlayerId),
    #[error("A land has already been played this turn")]
    LandAlreadyPlayed,
    #[error("{0} is tapped")]
    Tapped(InstanceId),
    #[error("{0} has summoning sickness")]
    SummoningSick(InstanceId),
    #[error("{0} is not a creature")]
    NotACreature(InstanceId),
    #[error("Insufficient mana: need {needed}, have {available}")]
    InsufficientMana { needed: u32, available: u32 },
    #[error("Not enough valid targets: need {required}, found {available}")]
    NotEnoughTargets { required: usize, available: usize },
    #[error("Select {required} target(s) first, {selected} selected")]
    TargetsNotSelected { required: usize, selected: usize },
    #[error("{0} is not a valid target")]
    InvalidTarget(String),
    #[error("Hand has {size} cards, discard down to {max} first")]
    HandOverLimit { size: usize, max: usize },
    #[error("Mana from {0} has already been spent")]
    ManaAlreadySpent(InstanceId),
    #[error("{0} is already tapped")]
    AlreadyTapped(InstanceId),
    #[error("Only instants can be cast while the stack is not empty")]
    StackNotEmpty,
    #[error("Only instants can be cast by the non-active player")]
    InstantSpeedOnly,
    #[error("A draw is already in progress")]
    DrawInProgress,
    #[error("Invalid scry order: {0}")]
    InvalidScryOrder(String),
    #[error("Can't go back from {from:?} to {to:?}")]
    BackwardPhase { from: Phase, to: Phase },
    #[error("{0} is not attacking")]
    NotAttacking(InstanceId),
    #[error("No attackers have been declared")]
    NoAttackers,
    #[error("{0} is not a permanent card")]
    NotAPermanent(String),
    #[error("Ability can't be activated right now")]
    CannotActivate,

    // Missing data: logged, not shown
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("No card at index {index} in {zone}")]
    IndexOutOfRange { zone: &'static str, index: usize },
    #[error("Library has {remaining} cards, can't draw {requested}")]
    LibraryExhausted { requested: usize, remaining: usize },
    #[error("The stack is empty")]
    StackEmpty,
    #[error("No targeting in progress")]
    NotTargeting,
    #[error("No draw is waiting to be committed")]
    NoPendingDraw,
    #[error("No commander in the command zone")]
    NoCommander,
    #[error("No deck loaded")]
    NoDeck,
    #[error("Deck not found: {0}")]
    DeckNotFound(String),
    #[error("{0} seats configured, at most 255 are supported")]
    TooManySeats(usize),
}

impl GameError {
    /// Rule violations are surfaced to the player; the rest are silent no-ops
    pub fn is_rule_violation(&self) -> bool {
        !matches!(
            self,
            GameError::PlayerNotFound(_)
                | GameError::CardNotFound(_)
                | GameError::IndexOutOfRange { .. }
                | GameError::LibraryExhausted { .. }
                | GameError::StackEmpty
                | GameError::NotTargeting
                | GameError::NoPendingDraw
                | GameError::NoCommander
                | GameError::NoDeck
                | GameError::DeckNotFound(_)
                | GameError::TooManySeats(_)
        )
    }
}

pub type GameResult<T> = Result<T, GameError>;

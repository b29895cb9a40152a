//! Turn phases, steps, and the per-player turn bookkeeping

use crate::game::mana::ManaState;
use serde::{Deserialize, Serialize};

/// Major phases of a turn, in turn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Beginning,
    PrecombatMain,
    Combat,
    PostcombatMain,
    Ending,
}

impl Phase {
    /// Step a phase opens on. Main phases have no steps of their own and
    /// return `None`, leaving the current step as it was.
    pub fn entry_step(&self) -> Option<Step> {
        match self {
            Phase::Beginning => Some(Step::Untap),
            Phase::Combat => Some(Step::BeginningOfCombat),
            Phase::Ending => Some(Step::EndStep),
            Phase::PrecombatMain | Phase::PostcombatMain => None,
        }
    }

    /// The phase after this one. `Ending` is last; the turn passes from there.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Beginning => Some(Phase::PrecombatMain),
            Phase::PrecombatMain => Some(Phase::Combat),
            Phase::Combat => Some(Phase::PostcombatMain),
            Phase::PostcombatMain => Some(Phase::Ending),
            Phase::Ending => None,
        }
    }
}

/// Steps within phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    // Beginning
    Untap,
    Upkeep,
    Draw,

    // Combat
    BeginningOfCombat,
    DeclareAttackers,
    DeclareBlockers,
    FirstStrikeDamage,
    CombatDamage,
    EndOfCombat,

    // Ending
    EndStep,
    Cleanup,
}

/// Where combat goes next from `step`. Damage steps still need their damage
/// resolved by the caller before moving on.
pub fn next_combat_step(step: Step, has_attackers: bool, has_first_strike: bool) -> Option<Step> {
    match step {
        Step::BeginningOfCombat => Some(Step::DeclareAttackers),
        Step::DeclareAttackers if has_attackers => Some(Step::DeclareBlockers),
        Step::DeclareAttackers => Some(Step::EndOfCombat),
        Step::DeclareBlockers if has_first_strike => Some(Step::FirstStrikeDamage),
        Step::DeclareBlockers => Some(Step::CombatDamage),
        Step::FirstStrikeDamage => Some(Step::CombatDamage),
        Step::CombatDamage => Some(Step::EndOfCombat),
        _ => None,
    }
}

/// One player's view of the turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    pub turn_number: u32,
    pub phase: Phase,
    pub step: Step,
    pub is_active: bool,
    pub has_drawn_for_turn: bool,
    pub has_played_land: bool,
    pub max_hand_size: usize,
    pub mana: ManaState,
    pub has_untapped_this_turn: bool,
    pub has_resolved_upkeep: bool,
    pub has_resolved_end_step: bool,
}

impl TurnState {
    pub fn new(max_hand_size: usize) -> Self {
        TurnState {
            turn_number: 1,
            phase: Phase::Beginning,
            step: Step::Untap,
            is_active: false,
            has_drawn_for_turn: false,
            has_played_land: false,
            max_hand_size,
            mana: ManaState::default(),
            has_untapped_this_turn: false,
            has_resolved_upkeep: false,
            has_resolved_end_step: false,
        }
    }

    /// Move into `phase`, setting its entry step
    pub fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        if let Some(step) = phase.entry_step() {
            self.step = step;
        }
    }

    /// Start of this player's next turn. Mana bookkeeping is cleared by the
    /// untap that goes with it.
    pub fn begin_turn(&mut self) {
        self.turn_number += 1;
        self.is_active = true;
        self.phase = Phase::Beginning;
        self.step = Step::Untap;
        self.has_drawn_for_turn = false;
        self.has_played_land = false;
        self.has_resolved_upkeep = false;
        self.has_resolved_end_step = false;
        self.mana.pool.clear();
    }

    pub fn in_step(&self, phase: Phase, step: Step) -> bool {
        self.phase == phase && self.step == step
    }
}

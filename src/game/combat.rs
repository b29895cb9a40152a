//! Combat: attacker and blocker declarations plus combat damage

use crate::card::Keyword;
use crate::game::engine::Match;
use crate::game::error::{GameError, GameResult};
use crate::game::player::PlayerState;
use crate::game::turn::{next_combat_step, Phase, Step};
use crate::ids::{InstanceId, PlayerId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One player's side of the current combat. Blocks are stored on the
/// defender, keyed by the attacker they block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    pub declaring_attackers: bool,
    pub declaring_blockers: bool,
    pub attackers: Vec<InstanceId>,
    /// Attacker -> blockers. A key that stays with no blockers left means
    /// the attacker was blocked and its blockers have since died.
    pub blockers: BTreeMap<InstanceId, Vec<InstanceId>>,
}

impl CombatState {
    pub fn is_attacking(&self, id: InstanceId) -> bool {
        self.attackers.contains(&id)
    }

    /// Add or remove an attacker. Returns whether it is attacking afterwards.
    pub fn toggle_attacker(&mut self, id: InstanceId) -> bool {
        if let Some(pos) = self.attackers.iter().position(|a| *a == id) {
            self.attackers.remove(pos);
            false
        } else {
            self.attackers.push(id);
            true
        }
    }

    /// The attacker a creature is currently blocking
    pub fn blocking(&self, blocker: InstanceId) -> Option<InstanceId> {
        self.blockers
            .iter()
            .find(|(_, bs)| bs.contains(&blocker))
            .map(|(attacker, _)| *attacker)
    }

    pub fn blockers_of(&self, attacker: InstanceId) -> &[InstanceId] {
        self.blockers.get(&attacker).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_blocked(&self, attacker: InstanceId) -> bool {
        self.blockers.contains_key(&attacker)
    }

    /// Toggle `blocker` on `attacker`. A blocker assigned elsewhere moves.
    /// Returns whether it is blocking `attacker` afterwards.
    pub fn toggle_blocker(&mut self, attacker: InstanceId, blocker: InstanceId) -> bool {
        let previous = self.blocking(blocker);
        if let Some(prev) = previous {
            self.unassign(prev, blocker);
        }
        if previous == Some(attacker) {
            return false;
        }
        self.blockers.entry(attacker).or_default().push(blocker);
        true
    }

    fn unassign(&mut self, attacker: InstanceId, blocker: InstanceId) {
        if let Some(bs) = self.blockers.get_mut(&attacker) {
            bs.retain(|b| *b != blocker);
            if bs.is_empty() {
                self.blockers.remove(&attacker);
            }
        }
    }

    /// Drop a permanent that left the battlefield. Attackers it was
    /// blocking stay blocked.
    pub fn forget(&mut self, id: InstanceId) {
        self.attackers.retain(|a| *a != id);
        self.blockers.remove(&id);
        for bs in self.blockers.values_mut() {
            bs.retain(|b| *b != id);
        }
    }

    pub fn clear(&mut self) {
        *self = CombatState::default();
    }
}

/// Who or what takes a point of combat damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageTarget {
    Player(PlayerId),
    Creature(InstanceId),
}

/// One damage event, computed before any damage is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatDamage {
    pub source: InstanceId,
    pub source_name: String,
    pub controller: PlayerId,
    pub target: DamageTarget,
    pub amount: u32,
    pub deathtouch: bool,
    pub lifelink: bool,
}

/// Work out every damage event for one damage step. In the first-strike
/// step only first and double strikers deal damage; in the regular step
/// everything else does, plus double strikers again.
pub fn plan_combat_damage(
    attacking: &PlayerState,
    defending: &PlayerState,
    first_strike: bool,
) -> Vec<CombatDamage> {
    let deals = |card: &crate::card::Card| {
        if first_strike {
            card.strikes_first()
        } else {
            card.strikes_regular()
        }
    };
    let mut plan = Vec::new();
    for attacker_id in &attacking.combat.attackers {
        let Some(attacker) = attacking.permanent(*attacker_id) else {
            continue;
        };
        let blocked = defending.combat.is_blocked(*attacker_id);
        let blockers: Vec<_> = defending
            .combat
            .blockers_of(*attacker_id)
            .iter()
            .filter_map(|b| defending.permanent(*b))
            .collect();

        let attacker_deals = deals(&attacker.card) && attacker.card.power() > 0;
        let from_attacker = |target| CombatDamage {
            source: *attacker_id,
            source_name: attacker.card.name.clone(),
            controller: attacking.id,
            target,
            amount: attacker.card.power(),
            deathtouch: attacker.card.has_keyword(Keyword::Deathtouch),
            lifelink: attacker.card.has_keyword(Keyword::Lifelink),
        };

        if !blocked {
            if attacker_deals {
                plan.push(from_attacker(DamageTarget::Player(defending.id)));
            }
            continue;
        }

        for blocker in blockers {
            if attacker_deals {
                plan.push(from_attacker(DamageTarget::Creature(blocker.instance_id())));
            }
            if deals(&blocker.card) && blocker.card.power() > 0 {
                plan.push(CombatDamage {
                    source: blocker.instance_id(),
                    source_name: blocker.card.name.clone(),
                    controller: defending.id,
                    target: DamageTarget::Creature(*attacker_id),
                    amount: blocker.card.power(),
                    deathtouch: blocker.card.has_keyword(Keyword::Deathtouch),
                    lifelink: blocker.card.has_keyword(Keyword::Lifelink),
                });
            }
        }
    }
    plan
}

/// Any attacker or any of its blockers strikes in the first-strike step
pub fn has_first_strike(attacking: &PlayerState, defending: &PlayerState) -> bool {
    attacking.combat.attackers.iter().any(|a| {
        let attacker_first = attacking
            .permanent(*a)
            .is_some_and(|p| p.card.strikes_first());
        let blocker_first = defending
            .combat
            .blockers_of(*a)
            .iter()
            .filter_map(|b| defending.permanent(*b))
            .any(|p| p.card.strikes_first());
        attacker_first || blocker_first
    })
}

impl Match {
    /// Declare or un-declare the creature at `creature_index` as an attacker.
    /// Returns whether it is attacking afterwards.
    pub fn declare_attacker(&mut self, player: PlayerId, creature_index: usize) -> GameResult<bool> {
        self.state.require_active(player)?;
        let p = self.state.player_mut(player)?;
        if !p.turn.in_step(Phase::Combat, Step::DeclareAttackers) {
            return Err(GameError::WrongPhase {
                phase: p.turn.phase,
                step: p.turn.step,
            });
        }
        let creature = p.creature_at(creature_index)?;
        let id = creature.instance_id();
        if p.combat.is_attacking(id) {
            p.combat.toggle_attacker(id);
            debug!("{} no longer attacking", id);
            return Ok(false);
        }
        if !creature.card.is_creature() {
            return Err(GameError::NotACreature(id));
        }
        if p.is_tapped(id) {
            return Err(GameError::Tapped(id));
        }
        if p.is_summoning_sick(creature) {
            return Err(GameError::SummoningSick(id));
        }
        let vigilant = creature.card.has_keyword(Keyword::Vigilance);
        p.combat.toggle_attacker(id);
        if !vigilant {
            p.tapped_creatures.insert(id);
        }
        debug!("{} attacks with {}", player, id);
        Ok(true)
    }

    /// Toggle `defender`'s creature at `blocker_index` as a blocker of the
    /// attacking creature at `attacker_index`. Returns whether it is
    /// blocking afterwards.
    pub fn declare_blocker(
        &mut self,
        defender: PlayerId,
        attacker_player: PlayerId,
        attacker_index: usize,
        blocker_index: usize,
    ) -> GameResult<bool> {
        self.state.require_active(attacker_player)?;
        if defender == attacker_player {
            return Err(GameError::InvalidTarget(format!(
                "{} can't block its own attackers",
                defender
            )));
        }
        let attacking = self.state.player(attacker_player)?;
        if !attacking.turn.in_step(Phase::Combat, Step::DeclareBlockers) {
            return Err(GameError::WrongPhase {
                phase: attacking.turn.phase,
                step: attacking.turn.step,
            });
        }
        if attacking.combat.attackers.is_empty() {
            return Err(GameError::NoAttackers);
        }
        let attacker = attacking.creature_at(attacker_index)?.instance_id();
        if !attacking.combat.is_attacking(attacker) {
            return Err(GameError::NotAttacking(attacker));
        }

        let p = self.state.player_mut(defender)?;
        let blocker = p.creature_at(blocker_index)?;
        let blocker_id = blocker.instance_id();
        if !blocker.card.is_creature() {
            return Err(GameError::NotACreature(blocker_id));
        }
        if p.is_tapped(blocker_id) {
            return Err(GameError::Tapped(blocker_id));
        }
        let blocking = p.combat.toggle_blocker(attacker, blocker_id);
        debug!("{} blocks {} with {}: {}", defender, attacker, blocker_id, blocking);
        Ok(blocking)
    }

    /// Deal one step of combat damage from the active player's attackers
    pub fn resolve_combat_damage(&mut self, first_strike: bool) -> GameResult<()> {
        let attacker_id = self.state.active_player;
        let defender_id = self.state.next_player(attacker_id);
        let plan = {
            let attacking = self.state.player(attacker_id)?;
            let defending = self.state.player(defender_id)?;
            plan_combat_damage(attacking, defending, first_strike)
        };
        debug!(
            "{} combat damage events ({})",
            plan.len(),
            if first_strike { "first strike" } else { "regular" }
        );
        for hit in plan {
            match hit.target {
                DamageTarget::Player(target) => {
                    self.state.damage_player(&hit.source_name, target, hit.amount)?;
                }
                DamageTarget::Creature(target) => {
                    self.state
                        .damage_creature(&hit.source_name, target, hit.amount, hit.deathtouch);
                }
            }
            if hit.lifelink {
                self.state.gain_life(hit.controller, hit.amount)?;
            }
        }
        Ok(())
    }

    /// Step through combat, dealing damage on the way out of each damage step
    pub fn advance_combat_step(&mut self, player: PlayerId) -> GameResult<Step> {
        self.state.require_active(player)?;
        let defender_id = self.state.next_player(player);
        let (step, has_attackers, first_strike) = {
            let attacking = self.state.player(player)?;
            if attacking.turn.phase != Phase::Combat {
                return Err(GameError::WrongPhase {
                    phase: attacking.turn.phase,
                    step: attacking.turn.step,
                });
            }
            let defending = self.state.player(defender_id)?;
            (
                attacking.turn.step,
                !attacking.combat.attackers.is_empty(),
                has_first_strike(attacking, defending),
            )
        };

        match step {
            Step::FirstStrikeDamage => self.resolve_combat_damage(true)?,
            Step::CombatDamage => self.resolve_combat_damage(false)?,
            Step::EndOfCombat => {
                self.state.end_combat();
                let p = self.state.player_mut(player)?;
                p.turn.phase = Phase::PostcombatMain;
                return Ok(p.turn.step);
            }
            _ => {}
        }

        let next = next_combat_step(step, has_attackers, first_strike).ok_or(
            GameError::WrongPhase {
                phase: Phase::Combat,
                step,
            },
        )?;
        let p = self.state.player_mut(player)?;
        p.turn.step = next;
        p.combat.declaring_attackers = next == Step::DeclareAttackers;
        if next == Step::DeclareBlockers {
            self.state.player_mut(defender_id)?.combat.declaring_blockers = true;
        }
        debug!("{} combat step -> {:?}", player, next);
        Ok(next)
    }
}

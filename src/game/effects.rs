//! Spell effects and activated abilities

use crate::card::{AbilityCost, ActivatedAbility, Card, EffectKind, SpellEffect, TargetType};
use crate::game::engine::Match;
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::state::MatchState;
use crate::game::targeting::PendingCast;
use crate::ids::{InstanceId, PlayerId, TargetId};
use log::{debug, info, warn};

fn permanent_targets(effect: &SpellEffect) -> impl Iterator<Item = InstanceId> + '_ {
    effect.targets.iter().filter_map(|t| match t {
        TargetId::Permanent(id) => Some(*id),
        TargetId::Player(_) => None,
    })
}

fn player_targets(effect: &SpellEffect) -> impl Iterator<Item = PlayerId> + '_ {
    effect.targets.iter().filter_map(|t| match t {
        TargetId::Player(id) => Some(*id),
        TargetId::Permanent(_) => None,
    })
}

impl MatchState {
    /// Apply one effect on behalf of `controller`. Targets that have gone
    /// away are skipped.
    pub fn resolve_effect(&mut self, controller: PlayerId, source_name: &str, effect: &SpellEffect) {
        let value = effect.value;
        debug!("{}: {:?} {} -> {:?}", source_name, effect.kind, value, effect.targets);
        let outcome = match effect.kind {
            EffectKind::Damage => {
                for target in &effect.targets {
                    match *target {
                        TargetId::Player(player) => {
                            if let Err(e) = self.damage_player(source_name, player, value) {
                                warn!("{} fizzles: {}", source_name, e);
                            }
                        }
                        TargetId::Permanent(id) => match self.permanent(id).map(|p| p.card.is_land()) {
                            Some(true) if value > 0 => {
                                info!("{} destroys land {}", source_name, id);
                                if let Err(e) = self.destroy_permanent(id) {
                                    warn!("{} fizzles: {}", source_name, e);
                                }
                            }
                            Some(true) => {}
                            Some(false) => {
                                self.damage_creature(source_name, id, value, false);
                            }
                            None => warn!("{} is no longer on the battlefield", id),
                        },
                    }
                }
                Ok(())
            }
            EffectKind::Draw => self.draw_cards(controller, value as usize).map(|_| ()),
            EffectKind::Destroy => {
                for id in permanent_targets(effect) {
                    if let Err(e) = self.destroy_permanent(id) {
                        warn!("{} fizzles: {}", source_name, e);
                    }
                }
                Ok(())
            }
            EffectKind::Exile => {
                for id in permanent_targets(effect) {
                    if let Err(e) = self.exile_permanent(id) {
                        warn!("{} fizzles: {}", source_name, e);
                    }
                }
                Ok(())
            }
            EffectKind::Bounce => {
                for id in permanent_targets(effect) {
                    if let Err(e) = self.bounce_permanent(id) {
                        warn!("{} fizzles: {}", source_name, e);
                    }
                }
                Ok(())
            }
            EffectKind::LifeGain => self.gain_life(controller, value),
            EffectKind::LifeLoss => {
                let players: Vec<PlayerId> = player_targets(effect).collect();
                if players.is_empty() {
                    self.lose_life(controller, value)
                } else {
                    players.into_iter().try_for_each(|p| self.lose_life(p, value))
                }
            }
            EffectKind::Scry => self.player_mut(controller).map(|p| {
                p.scry_buffer = p.library.peek(value as usize);
            }),
            EffectKind::Mana { color } => match self.player_mut(controller) {
                Ok(p) => {
                    p.turn.mana.pool.add(color, value);
                    self.emit(GameEvent::ManaAdded {
                        player: controller,
                        color,
                        amount: value,
                    });
                    Ok(())
                }
                Err(e) => Err(e),
            },
        };
        if let Err(e) = outcome {
            warn!("{} had no effect: {}", source_name, e);
        }
    }
}

impl Match {
    /// Everything `activate_ability` checks, without changing anything
    fn check_activation(
        &self,
        player: PlayerId,
        source: InstanceId,
        ability_index: usize,
    ) -> GameResult<(Card, ActivatedAbility)> {
        let p = self.state.player(player)?;
        let permanent = p
            .permanent(source)
            .ok_or_else(|| GameError::CardNotFound(source.to_string()))?;
        let ability = permanent
            .card
            .activated_abilities
            .get(ability_index)
            .ok_or(GameError::IndexOutOfRange {
                zone: "abilities",
                index: ability_index,
            })?;
        match ability.cost {
            AbilityCost::Tap => {
                if p.is_tapped(source) {
                    return Err(GameError::Tapped(source));
                }
                if permanent.card.is_creature() && p.is_summoning_sick(permanent) {
                    return Err(GameError::SummoningSick(source));
                }
            }
            AbilityCost::Mana(cost) => {
                self.state.require_active(player)?;
                let available = p.turn.mana.pool.total();
                if available < cost {
                    return Err(GameError::InsufficientMana {
                        needed: cost,
                        available,
                    });
                }
            }
        }
        if ability.effect.requires_target {
            let target_type = ability.effect.target_type.unwrap_or(TargetType::Any);
            let available = self.valid_targets(target_type).len();
            if available == 0 {
                return Err(GameError::NotEnoughTargets {
                    required: 1,
                    available,
                });
            }
        }
        Ok((permanent.card.clone(), ability.clone()))
    }

    pub fn can_activate_ability(&self, player: PlayerId, source: InstanceId, ability_index: usize) -> bool {
        self.check_activation(player, source, ability_index).is_ok()
    }

    /// Abilities of `source` that could be activated right now, by index
    pub fn activatable_abilities(&self, player: PlayerId, source: InstanceId) -> Vec<(usize, ActivatedAbility)> {
        let Some(permanent) = self.state.player(player).ok().and_then(|p| p.permanent(source)) else {
            return Vec::new();
        };
        permanent
            .card
            .activated_abilities
            .iter()
            .enumerate()
            .filter(|(i, _)| self.can_activate_ability(player, source, *i))
            .map(|(i, a)| (i, a.clone()))
            .collect()
    }

    /// Pay the ability's cost, then resolve a mana effect at once, open
    /// targeting for a targeted one, or put it on the stack
    pub fn activate_ability(&mut self, player: PlayerId, source: InstanceId, ability_index: usize) -> GameResult<()> {
        let (card, ability) = self.check_activation(player, source, ability_index)?;
        let p = self.state.player_mut(player)?;
        let mut mana_added = false;
        match ability.cost {
            AbilityCost::Tap if card.is_land() => match ability.effect.kind {
                EffectKind::Mana { color } => {
                    p.turn.mana.tap_for_mana(source, color, ability.effect.value)?;
                    mana_added = true;
                }
                _ => p.turn.mana.tap_without_mana(source)?,
            },
            AbilityCost::Tap => {
                p.tapped_creatures.insert(source);
                if let EffectKind::Mana { color } = ability.effect.kind {
                    p.turn.mana.add_from_source(source, color, ability.effect.value);
                    mana_added = true;
                }
            }
            AbilityCost::Mana(cost) => p.turn.mana.pay(cost)?,
        }
        info!("{} activates {}: {}", player, card.name, ability.description);
        self.state.emit(GameEvent::AbilityActivated {
            player,
            card: card.name.clone(),
            ability: ability.description.clone(),
        });

        if ability.is_mana_ability() {
            if mana_added {
                if let EffectKind::Mana { color } = ability.effect.kind {
                    self.state.emit(GameEvent::ManaAdded {
                        player,
                        color,
                        amount: ability.effect.value,
                    });
                }
            } else {
                self.state.resolve_effect(player, &card.name, &ability.effect);
            }
        } else if ability.effect.requires_target {
            let target_type = ability.effect.target_type.unwrap_or(TargetType::Any);
            self.start_targeting(
                player,
                PendingCast::Ability {
                    source,
                    card,
                    ability,
                },
                target_type,
                1,
            )?;
        } else {
            let description = ability.description.clone();
            self.state
                .stack
                .push_ability(card, player, &description, ability.effect);
        }
        Ok(())
    }

    /// Tap a creature-row permanent by hand
    pub fn tap_creature(&mut self, player: PlayerId, creature_index: usize) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        let id = p.creature_at(creature_index)?.instance_id();
        if !p.tapped_creatures.insert(id) {
            return Err(GameError::AlreadyTapped(id));
        }
        Ok(())
    }

    /// Untap a creature-row permanent. Mana it made this turn goes back out
    /// of the pool; once that mana is spent it stays tapped.
    pub fn untap_creature(&mut self, player: PlayerId, creature_index: usize) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        let id = p.creature_at(creature_index)?.instance_id();
        if p.turn.mana.refund_source(id)? {
            debug!("{} refunded the mana from {}", player, id);
        }
        p.tapped_creatures.remove(&id);
        Ok(())
    }
}

//! Target selection for spells and abilities that need one

use crate::card::{ActivatedAbility, Card, TargetType};
use crate::game::engine::Match;
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::player::PlayerState;
use crate::ids::{InstanceId, PlayerId, TargetId, Timestamp};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// What confirming the targets will put on the stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingCast {
    /// A card still in hand, found again by its `drawn_at` stamp
    Spell { hand_stamp: Timestamp, card: Card },
    /// An activated ability whose cost is already paid
    Ability {
        source: InstanceId,
        card: Card,
        ability: ActivatedAbility,
    },
}

impl PendingCast {
    pub fn name(&self) -> &str {
        match self {
            PendingCast::Spell { card, .. } | PendingCast::Ability { card, .. } => &card.name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetingState {
    pub is_targeting: bool,
    pub pending: Option<PendingCast>,
    pub required: usize,
    pub selected: Vec<TargetId>,
    pub target_type: Option<TargetType>,
}

impl TargetingState {
    pub fn open(pending: PendingCast, target_type: TargetType, required: usize) -> Self {
        TargetingState {
            is_targeting: true,
            pending: Some(pending),
            required,
            selected: Vec::new(),
            target_type: Some(target_type),
        }
    }

    /// Add or remove a target. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, target: TargetId) -> bool {
        if let Some(pos) = self.selected.iter().position(|t| *t == target) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(target);
            true
        }
    }
}

/// Every legal target for a filter across the whole table: creatures,
/// then lands, then players
pub fn valid_targets(players: &[PlayerState], target_type: TargetType) -> Vec<TargetId> {
    let (creatures, lands, seats) = match target_type {
        TargetType::Creature => (true, false, false),
        TargetType::Land => (false, true, false),
        TargetType::Player => (false, false, true),
        TargetType::CreatureOrPlayer => (true, false, true),
        TargetType::Any => (true, true, true),
    };
    let mut targets = Vec::new();
    if creatures {
        for p in players {
            targets.extend(
                p.creatures
                    .iter()
                    .filter(|c| c.card.is_creature())
                    .map(|c| TargetId::Permanent(c.instance_id())),
            );
        }
    }
    if lands {
        for p in players {
            targets.extend(p.lands.iter().map(|l| TargetId::Permanent(l.instance_id())));
        }
    }
    if seats {
        targets.extend(players.iter().map(|p| TargetId::Player(p.id)));
    }
    targets
}

impl Match {
    pub fn valid_targets(&self, target_type: TargetType) -> Vec<TargetId> {
        valid_targets(&self.state.players, target_type)
    }

    /// Begin choosing `required` targets for a pending spell or ability
    pub fn start_targeting(
        &mut self,
        player: PlayerId,
        pending: PendingCast,
        target_type: TargetType,
        required: usize,
    ) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        debug!(
            "{} targeting for {} ({:?}, {} required)",
            player,
            pending.name(),
            target_type,
            required
        );
        p.targeting = TargetingState::open(pending, target_type, required);
        Ok(())
    }

    /// Toggle a target. Only candidates for the current filter are accepted.
    pub fn select_target(&mut self, player: PlayerId, target: TargetId) -> GameResult<bool> {
        let target_type = {
            let t = &self.state.player(player)?.targeting;
            if !t.is_targeting {
                return Err(GameError::NotTargeting);
            }
            t.target_type.ok_or(GameError::NotTargeting)?
        };
        if !self.valid_targets(target_type).contains(&target) {
            return Err(GameError::InvalidTarget(target.to_string()));
        }
        Ok(self.state.player_mut(player)?.targeting.toggle(target))
    }

    /// Lock in the selection and put the spell or ability on the stack
    pub fn confirm_targeting(&mut self, player: PlayerId) -> GameResult<()> {
        let enforce = self.state.config.enforce_mana_costs;
        let targeting = self.state.player(player)?.targeting.clone();
        let (Some(pending), Some(target_type), true) =
            (targeting.pending, targeting.target_type, targeting.is_targeting)
        else {
            return Err(GameError::NotTargeting);
        };

        let candidates = self.valid_targets(target_type);
        if candidates.len() < targeting.required {
            return Err(GameError::NotEnoughTargets {
                required: targeting.required,
                available: candidates.len(),
            });
        }
        if targeting.selected.len() < targeting.required {
            return Err(GameError::TargetsNotSelected {
                required: targeting.required,
                selected: targeting.selected.len(),
            });
        }
        if let Some(gone) = targeting.selected.iter().find(|t| !candidates.contains(t)) {
            return Err(GameError::InvalidTarget(gone.to_string()));
        }
        if let PendingCast::Spell { card, .. } = &pending {
            self.check_cast_timing(player, card)?;
        }
        let selected = targeting.selected;

        match pending {
            PendingCast::Spell { hand_stamp, card } => {
                let p = self.state.player_mut(player)?;
                let hand_index = p
                    .hand
                    .iter()
                    .position(|c| c.drawn_at == hand_stamp)
                    .ok_or_else(|| GameError::CardNotFound(card.name.clone()))?;
                if enforce {
                    p.turn.mana.pay(card.cmc)?;
                }
                let mut card = p.hand.remove(hand_index).card;
                for effect in card.effects.iter_mut().filter(|e| e.requires_target) {
                    effect.targets = selected.clone();
                }
                p.targeting = TargetingState::default();
                info!("{} casts {} targeting {:?}", player, card.name, selected);
                let name = card.name.clone();
                self.state.stack.push_spell(card, player);
                self.state.emit(GameEvent::SpellCast { player, card: name });
            }
            PendingCast::Ability {
                card, mut ability, ..
            } => {
                ability.effect.targets = selected;
                self.state.player_mut(player)?.targeting = TargetingState::default();
                self.state
                    .stack
                    .push_ability(card, player, &ability.description, ability.effect);
            }
        }
        Ok(())
    }

    /// Drop the pending cast. The card stays in hand.
    pub fn cancel_targeting(&mut self, player: PlayerId) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        if !p.targeting.is_targeting {
            return Err(GameError::NotTargeting);
        }
        p.targeting = TargetingState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CardId;

    fn table() -> Vec<PlayerState> {
        let mut a = PlayerState::new(PlayerId(1), "A", 40, 7);
        let mut b = PlayerState::new(PlayerId(2), "B", 40, 7);
        a.place_on_battlefield(Card::new(CardId(1), "Bear", "Creature — Bear", 2), 1, false);
        a.place_on_battlefield(Card::new(CardId(2), "Forest", "Basic Land — Forest", 0), 2, false);
        b.place_on_battlefield(Card::new(CardId(3), "Sol Ring", "Artifact", 1), 3, false);
        b.place_on_battlefield(Card::new(CardId(4), "Elf", "Creature — Elf", 1), 4, false);
        vec![a, b]
    }

    #[test]
    fn test_valid_targets_by_filter() {
        let players = table();
        let creature = valid_targets(&players, TargetType::Creature);
        assert_eq!(
            creature,
            vec![
                TargetId::Permanent(InstanceId::new(CardId(1), 1)),
                TargetId::Permanent(InstanceId::new(CardId(4), 4)),
            ]
        );
        assert_eq!(valid_targets(&players, TargetType::Land).len(), 1);
        assert_eq!(valid_targets(&players, TargetType::Player).len(), 2);
        assert_eq!(valid_targets(&players, TargetType::CreatureOrPlayer).len(), 4);
        let any = valid_targets(&players, TargetType::Any);
        assert_eq!(any.len(), 5);
        assert_eq!(any.last(), Some(&TargetId::Player(PlayerId(2))));
    }

    #[test]
    fn test_toggle() {
        let mut t = TargetingState::default();
        let target = TargetId::Player(PlayerId(2));
        assert!(t.toggle(target));
        assert!(!t.toggle(target));
        assert!(t.selected.is_empty());
    }
}

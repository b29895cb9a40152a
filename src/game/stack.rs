//! The shared LIFO stack of spells and abilities waiting to resolve

use crate::card::{Card, SpellEffect};
use crate::game::engine::Match;
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::zones::GraveyardCard;
use crate::ids::{PlayerId, StackItemId};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackItemKind {
    Spell,
    Ability,
}

/// A spell or ability on the stack, with targets already attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackItem {
    pub id: StackItemId,
    pub kind: StackItemKind,
    pub card: Card,
    pub controller: PlayerId,
    pub description: String,
    pub effects: Vec<SpellEffect>,
}

/// Index 0 is the bottom, the last item is the top
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    items: Vec<StackItem>,
    next_id: u64,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a spell. Its effects resolve in printed order.
    pub fn push_spell(&mut self, card: Card, controller: PlayerId) -> StackItemId {
        let description = card.name.clone();
        let effects = card.effects.clone();
        self.push(StackItemKind::Spell, card, controller, description, effects)
    }

    /// Push an activated ability of `source`
    pub fn push_ability(
        &mut self,
        source: Card,
        controller: PlayerId,
        ability_description: &str,
        effect: SpellEffect,
    ) -> StackItemId {
        let description = format!("{}: {}", source.name, ability_description);
        self.push(StackItemKind::Ability, source, controller, description, vec![effect])
    }

    fn push(
        &mut self,
        kind: StackItemKind,
        card: Card,
        controller: PlayerId,
        description: String,
        effects: Vec<SpellEffect>,
    ) -> StackItemId {
        let id = StackItemId(self.next_id);
        self.next_id += 1;
        self.items.push(StackItem {
            id,
            kind,
            card,
            controller,
            description,
            effects,
        });
        id
    }

    pub fn pop(&mut self) -> Option<StackItem> {
        self.items.pop()
    }

    pub fn top(&self) -> Option<&StackItem> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Spells on the stack owned by `player`
    pub fn spells_of(&self, player: PlayerId) -> usize {
        self.items
            .iter()
            .filter(|i| i.kind == StackItemKind::Spell && i.controller == player)
            .count()
    }
}

impl Match {
    /// Both players pass: the top of the stack resolves. Passing on an
    /// empty stack does nothing.
    pub fn pass_priority(&mut self) -> GameResult<()> {
        if self.state.stack.is_empty() {
            debug!("Priority passed on an empty stack");
            return Ok(());
        }
        self.resolve_top_of_stack()
    }

    /// Resolve the top item: run its effects in order, then move a spell
    /// card to the battlefield or graveyard
    pub fn resolve_top_of_stack(&mut self) -> GameResult<()> {
        let controller = self.state.stack.top().ok_or(GameError::StackEmpty)?.controller;
        self.state.player(controller)?;
        let item = self.state.stack.pop().ok_or(GameError::StackEmpty)?;
        info!("Resolving {}", item.description);
        for effect in &item.effects {
            self.state
                .resolve_effect(item.controller, &item.card.name, effect);
        }

        if item.kind == StackItemKind::Spell {
            let (p, clock) = self.state.seat(item.controller)?;
            if item.card.kind.is_permanent() {
                p.place_on_battlefield(item.card, clock.tick(), true);
            } else {
                p.graveyard.push(GraveyardCard {
                    card: item.card,
                    discarded_at: clock.tick(),
                    damage: 0,
                });
            }
        }
        self.state.emit(GameEvent::Resolved {
            description: item.description,
        });
        Ok(())
    }
}

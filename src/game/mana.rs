//! The mana pool, mana sources tapped this turn, and paying costs

use crate::card::{Card, ManaColor};
use crate::game::engine::Match;
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::ids::{InstanceId, PlayerId};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Mana pool tracking each color and colorless mana
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    pub white: u32,
    pub blue: u32,
    pub black: u32,
    pub red: u32,
    pub green: u32,
    pub colorless: u32,
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, color: ManaColor) -> u32 {
        match color {
            ManaColor::White => self.white,
            ManaColor::Blue => self.blue,
            ManaColor::Black => self.black,
            ManaColor::Red => self.red,
            ManaColor::Green => self.green,
            ManaColor::Colorless => self.colorless,
        }
    }

    fn bucket_mut(&mut self, color: ManaColor) -> &mut u32 {
        match color {
            ManaColor::White => &mut self.white,
            ManaColor::Blue => &mut self.blue,
            ManaColor::Black => &mut self.black,
            ManaColor::Red => &mut self.red,
            ManaColor::Green => &mut self.green,
            ManaColor::Colorless => &mut self.colorless,
        }
    }

    pub fn add(&mut self, color: ManaColor, amount: u32) {
        *self.bucket_mut(color) += amount;
    }

    /// Take up to `amount` of one color. Returns how much was actually taken.
    pub fn remove(&mut self, color: ManaColor, amount: u32) -> u32 {
        let bucket = self.bucket_mut(color);
        let taken = amount.min(*bucket);
        *bucket -= taken;
        taken
    }

    pub fn total(&self) -> u32 {
        self.white + self.blue + self.black + self.red + self.green + self.colorless
    }

    pub fn clear(&mut self) {
        *self = ManaPool::default();
    }

    /// Pay a generic cost: colorless first, then W, U, B, R, G. Returns the
    /// amount drained from each bucket, or `None` (pool untouched) if the
    /// pool can't cover it.
    pub fn pay_generic(&mut self, amount: u32) -> Option<Vec<(ManaColor, u32)>> {
        if self.total() < amount {
            return None;
        }
        let mut remaining = amount;
        let mut drained = Vec::new();
        let order = std::iter::once(ManaColor::Colorless).chain(ManaColor::COLORED);
        for color in order {
            if remaining == 0 {
                break;
            }
            let taken = self.remove(color, remaining);
            if taken > 0 {
                drained.push((color, taken));
                remaining -= taken;
            }
        }
        Some(drained)
    }
}

/// A permanent tapped for mana this turn. `available` flips off once any of
/// its mana is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaSource {
    pub land: InstanceId,
    pub color: ManaColor,
    pub amount: u32,
    pub available: bool,
}

/// Pool plus the per-land records that decide whether a land may be untapped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManaState {
    pub pool: ManaPool,
    pub tapped_lands: Vec<InstanceId>,
    pub sources: Vec<ManaSource>,
    pub land_mana_used: Vec<InstanceId>,
}

impl ManaState {
    pub fn is_land_tapped(&self, land: InstanceId) -> bool {
        self.tapped_lands.contains(&land)
    }

    pub fn source(&self, land: InstanceId) -> Option<&ManaSource> {
        self.sources.iter().find(|s| s.land == land)
    }

    /// Tap a land and add its mana to the pool
    pub fn tap_for_mana(&mut self, land: InstanceId, color: ManaColor, amount: u32) -> GameResult<()> {
        if self.is_land_tapped(land) {
            return Err(GameError::AlreadyTapped(land));
        }
        self.tapped_lands.push(land);
        self.add_from_source(land, color, amount);
        Ok(())
    }

    /// Add mana and remember which permanent made it
    pub fn add_from_source(&mut self, source: InstanceId, color: ManaColor, amount: u32) {
        self.pool.add(color, amount);
        self.sources.push(ManaSource {
            land: source,
            color,
            amount,
            available: true,
        });
    }

    /// Tap a land to pay a cost that makes no mana
    pub fn tap_without_mana(&mut self, land: InstanceId) -> GameResult<()> {
        if self.is_land_tapped(land) {
            return Err(GameError::AlreadyTapped(land));
        }
        self.tapped_lands.push(land);
        Ok(())
    }

    /// Undo a mana tap. `Ok(false)` when the land wasn't tapped for mana.
    pub fn untap_land(&mut self, land: InstanceId) -> GameResult<bool> {
        let refunded = self.refund_source(land)?;
        if refunded {
            self.tapped_lands.retain(|l| *l != land);
        }
        Ok(refunded)
    }

    /// Take back everything a source added, as long as none of it is spent.
    /// `Ok(false)` when it made no mana this turn.
    pub fn refund_source(&mut self, source: InstanceId) -> GameResult<bool> {
        if self.land_mana_used.contains(&source) {
            return Err(GameError::ManaAlreadySpent(source));
        }
        let Some(pos) = self.sources.iter().position(|s| s.land == source) else {
            return Ok(false);
        };
        let record = self.sources.remove(pos);
        self.pool.remove(record.color, record.amount);
        Ok(true)
    }

    /// Pay a generic cost and mark the sources it consumed as spent
    pub fn pay(&mut self, amount: u32) -> GameResult<()> {
        let available = self.pool.total();
        let drained = self
            .pool
            .pay_generic(amount)
            .ok_or(GameError::InsufficientMana {
                needed: amount,
                available,
            })?;
        for (color, count) in drained {
            let mut left = count;
            for source in self.sources.iter_mut().filter(|s| s.color == color && s.available) {
                if left == 0 {
                    break;
                }
                source.available = false;
                self.land_mana_used.push(source.land);
                left = left.saturating_sub(source.amount);
            }
        }
        Ok(())
    }

    /// Forget a land that left the battlefield, taking its unspent mana with it
    pub fn release_land(&mut self, land: InstanceId) {
        self.tapped_lands.retain(|l| *l != land);
        self.land_mana_used.retain(|l| *l != land);
        if let Some(pos) = self.sources.iter().position(|s| s.land == land) {
            let source = self.sources.remove(pos);
            if source.available {
                self.pool.remove(source.color, source.amount);
            }
        }
    }

    /// Untap step: every land untaps and the per-turn records reset
    pub fn untap_all(&mut self) {
        self.tapped_lands.clear();
        self.sources.clear();
        self.land_mana_used.clear();
    }
}

impl Match {
    /// Tap the land at `land_index` for one mana of the color its name implies
    pub fn tap_land(&mut self, player: PlayerId, land_index: usize) -> GameResult<ManaColor> {
        let p = self.state.player_mut(player)?;
        let land = p.land_at(land_index)?;
        let (id, name) = (land.instance_id(), land.card.name.clone());
        let color = ManaColor::for_land_name(&name);
        p.turn.mana.tap_for_mana(id, color, 1)?;
        debug!("{} tapped {} for {}", player, name, color);
        self.state.emit(GameEvent::ManaAdded {
            player,
            color,
            amount: 1,
        });
        Ok(color)
    }

    /// Untap a land whose mana hasn't been spent yet
    pub fn untap_land(&mut self, player: PlayerId, land_index: usize) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        let id = p.land_at(land_index)?.instance_id();
        if !p.turn.mana.untap_land(id)? {
            debug!("{} was not tapped for mana, nothing to untap", id);
        }
        Ok(())
    }

    /// Remove one mana of a color from the pool, floored at zero
    pub fn spend_mana(&mut self, player: PlayerId, color: ManaColor) -> GameResult<()> {
        self.state.player_mut(player)?.turn.mana.pool.remove(color, 1);
        Ok(())
    }

    /// Whether the pool holds at least the card's converted cost
    pub fn check_mana_cost(&self, player: PlayerId, card: &Card) -> GameResult<bool> {
        Ok(self.state.player(player)?.turn.mana.pool.total() >= card.cmc)
    }

    /// Pay a card's converted cost from the pool
    pub fn spend_mana_for_card(&mut self, player: PlayerId, card: &Card) -> GameResult<()> {
        self.state.player_mut(player)?.turn.mana.pay(card.cmc)
    }

    /// Current price of the commander: cmc plus tax for every previous cast
    pub fn commander_cost(&self, player: PlayerId) -> GameResult<u32> {
        let p = self.state.player(player)?;
        let commander = p.command_zone.as_ref().ok_or(GameError::NoCommander)?;
        Ok(commander.cmc + self.state.config.commander_tax_step * p.commander_tax)
    }

    /// Cast the commander from the command zone straight onto the battlefield
    pub fn cast_commander(&mut self, player: PlayerId) -> GameResult<InstanceId> {
        let cost = self.commander_cost(player)?;
        let enforce = self.state.config.enforce_mana_costs;
        let available = self.state.player(player)?.turn.mana.pool.total();
        if enforce && available < cost {
            return Err(GameError::InsufficientMana {
                needed: cost,
                available,
            });
        }
        let (p, clock) = self.state.seat(player)?;
        if enforce {
            p.turn.mana.pay(cost)?;
        }
        let commander = p.command_zone.take().ok_or(GameError::NoCommander)?;
        p.commander_tax += 1;
        let name = commander.name.clone();
        let id = p.place_on_battlefield(commander, clock.tick(), true);
        info!("{} cast commander {} for {}", player, name, cost);
        self.state.emit(GameEvent::CommanderCast {
            player,
            card: name,
            cost,
        });
        Ok(id)
    }
}

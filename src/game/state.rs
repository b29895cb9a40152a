//! Cross-player match state and the primitives every subsystem shares

use crate::game::config::MatchConfig;
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::player::PlayerState;
use crate::game::stack::Stack;
use crate::game::zones::{BattlefieldCard, DrawnCard, GraveyardCard};
use crate::card::{Card, Keyword};
use crate::ids::{InstanceId, PlayerId, TargetId, Timestamp};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Logical clock. Every zone entry takes the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock(Timestamp);

impl Clock {
    pub fn now(&self) -> Timestamp {
        self.0
    }

    pub fn tick(&mut self) -> Timestamp {
        self.0 += 1;
        self.0
    }
}

/// Where a permanent goes when it leaves the battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Departure {
    Graveyard,
    Exile,
    Hand,
}

/// Complete state of one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub players: Vec<PlayerState>,
    pub active_player: PlayerId,
    pub stack: Stack,
    pub clock: Clock,
    pub events: Vec<GameEvent>,
    pub config: MatchConfig,
}

impl MatchState {
    /// One seat per configured name, player 1 active
    pub fn new(config: MatchConfig) -> GameResult<Self> {
        let names = if config.player_names.is_empty() {
            MatchConfig::default().player_names
        } else {
            config.player_names.clone()
        };
        let mut players = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let seat = u8::try_from(i + 1).map_err(|_| GameError::TooManySeats(names.len()))?;
                Ok(PlayerState::new(
                    PlayerId(seat),
                    name,
                    config.starting_life,
                    config.max_hand_size,
                ))
            })
            .collect::<GameResult<Vec<PlayerState>>>()?;
        let active_player = players[0].id;
        players[0].turn.is_active = true;
        Ok(MatchState {
            players,
            active_player,
            stack: Stack::new(),
            clock: Clock::default(),
            events: Vec::new(),
            config,
        })
    }

    fn index_of(&self, player: PlayerId) -> GameResult<usize> {
        self.players
            .iter()
            .position(|p| p.id == player)
            .ok_or(GameError::PlayerNotFound(player))
    }

    pub fn player(&self, player: PlayerId) -> GameResult<&PlayerState> {
        Ok(&self.players[self.index_of(player)?])
    }

    pub fn player_mut(&mut self, player: PlayerId) -> GameResult<&mut PlayerState> {
        let index = self.index_of(player)?;
        Ok(&mut self.players[index])
    }

    /// A player together with the clock, for moves that stamp a zone entry
    pub fn seat(&mut self, player: PlayerId) -> GameResult<(&mut PlayerState, &mut Clock)> {
        let index = self.index_of(player)?;
        Ok((&mut self.players[index], &mut self.clock))
    }

    pub fn tick(&mut self) -> Timestamp {
        self.clock.tick()
    }

    pub fn emit(&mut self, event: GameEvent) {
        debug!("event: {}", event);
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn require_active(&self, player: PlayerId) -> GameResult<()> {
        self.index_of(player)?;
        if self.active_player != player {
            return Err(GameError::NotActivePlayer(player));
        }
        Ok(())
    }

    /// The seat after `player` in turn order, wrapping around
    pub fn next_player(&self, player: PlayerId) -> PlayerId {
        match self.index_of(player) {
            Ok(i) => self.players[(i + 1) % self.players.len()].id,
            Err(_) => player,
        }
    }

    /// Controller of a permanent
    pub fn owner_of(&self, permanent: InstanceId) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.find_permanent(permanent).is_some())
            .map(|p| p.id)
    }

    pub fn permanent(&self, permanent: InstanceId) -> Option<&BattlefieldCard> {
        self.players.iter().find_map(|p| p.permanent(permanent))
    }

    /// Take a permanent off the battlefield and out of every player's combat
    pub fn remove_permanent(&mut self, permanent: InstanceId) -> GameResult<(PlayerId, BattlefieldCard)> {
        let owner = self
            .owner_of(permanent)
            .ok_or_else(|| GameError::CardNotFound(permanent.to_string()))?;
        let removed = self
            .player_mut(owner)?
            .remove_permanent(permanent)
            .ok_or_else(|| GameError::CardNotFound(permanent.to_string()))?;
        for p in &mut self.players {
            p.combat.forget(permanent);
        }
        Ok((owner, removed))
    }

    pub fn destroy_permanent(&mut self, permanent: InstanceId) -> GameResult<()> {
        self.move_permanent(permanent, Departure::Graveyard)
    }

    pub fn exile_permanent(&mut self, permanent: InstanceId) -> GameResult<()> {
        self.move_permanent(permanent, Departure::Exile)
    }

    /// Return a permanent to the top of its owner's hand
    pub fn bounce_permanent(&mut self, permanent: InstanceId) -> GameResult<()> {
        self.move_permanent(permanent, Departure::Hand)
    }

    fn move_permanent(&mut self, permanent: InstanceId, to: Departure) -> GameResult<()> {
        let (owner, removed) = self.remove_permanent(permanent)?;
        let (p, clock) = self.seat(owner)?;
        let name = removed.card.name.clone();
        if p.is_commander(&removed.card) {
            p.command_zone = Some(removed.card);
            info!("{}'s commander {} returns to the command zone", owner, name);
            self.emit(GameEvent::CommanderReturned {
                player: owner,
                card: name,
            });
            return Ok(());
        }
        let event = match to {
            Departure::Graveyard => {
                p.graveyard.push(GraveyardCard {
                    card: removed.card,
                    discarded_at: clock.tick(),
                    damage: removed.damage,
                });
                GameEvent::PermanentDestroyed { player: owner, card: name }
            }
            Departure::Exile => {
                p.exile.push(removed.card);
                GameEvent::PermanentExiled { player: owner, card: name }
            }
            Departure::Hand => {
                p.hand.insert(
                    0,
                    DrawnCard {
                        card: removed.card,
                        drawn_at: clock.tick(),
                    },
                );
                GameEvent::PermanentReturned { player: owner, card: name }
            }
        };
        self.emit(event);
        Ok(())
    }

    /// Mark damage on a creature and destroy it if the damage is lethal.
    /// Returns whether it died.
    pub fn damage_creature(
        &mut self,
        source_name: &str,
        permanent: InstanceId,
        amount: u32,
        deathtouch: bool,
    ) -> bool {
        if amount == 0 {
            return false;
        }
        let Some(owner) = self.owner_of(permanent) else {
            warn!("{} has left the battlefield, {} damage is lost", permanent, amount);
            return false;
        };
        let (lethal, indestructible) = {
            let Some(target) = self
                .player_mut(owner)
                .ok()
                .and_then(|p| p.permanent_mut(permanent))
            else {
                return false;
            };
            target.damage += amount;
            (
                target.damage >= target.card.toughness() || deathtouch,
                target.card.has_keyword(Keyword::Indestructible),
            )
        };
        self.emit(GameEvent::DamageDealt {
            source: source_name.to_string(),
            target: TargetId::Permanent(permanent),
            amount,
        });
        if lethal && !indestructible {
            return self.destroy_permanent(permanent).is_ok();
        }
        false
    }

    /// Damage to a player, floored at zero life
    pub fn damage_player(&mut self, source_name: &str, player: PlayerId, amount: u32) -> GameResult<()> {
        self.index_of(player)?;
        self.emit(GameEvent::DamageDealt {
            source: source_name.to_string(),
            target: TargetId::Player(player),
            amount,
        });
        self.reduce_life(player, amount)
    }

    pub fn lose_life(&mut self, player: PlayerId, amount: u32) -> GameResult<()> {
        self.reduce_life(player, amount)
    }

    /// `LifeLost` carries what the player actually lost, not what was dealt
    fn reduce_life(&mut self, player: PlayerId, amount: u32) -> GameResult<()> {
        let p = self.player_mut(player)?;
        let was_alive = p.life > 0;
        let lost = amount.min(p.life);
        p.life -= lost;
        let now_dead = p.life == 0;
        if lost > 0 {
            self.emit(GameEvent::LifeLost { player, amount: lost });
        }
        if was_alive && now_dead {
            info!("{} has been defeated", player);
            self.emit(GameEvent::PlayerDefeated { player });
        }
        Ok(())
    }

    pub fn gain_life(&mut self, player: PlayerId, amount: u32) -> GameResult<()> {
        self.player_mut(player)?.life += amount;
        self.emit(GameEvent::LifeGained { player, amount });
        Ok(())
    }

    /// Draw from the top of the library into the hand. All or nothing.
    pub fn draw_cards(&mut self, player: PlayerId, count: usize) -> GameResult<Vec<Card>> {
        let (p, clock) = self.seat(player)?;
        let cards = p.library.draw(count)?;
        for card in &cards {
            p.hand.push(DrawnCard {
                card: card.clone(),
                drawn_at: clock.tick(),
            });
        }
        debug!("{} drew {} card(s)", player, count);
        self.emit(GameEvent::CardsDrawn { player, count });
        Ok(cards)
    }

    /// End of combat for everyone: declarations and damage are cleared
    pub fn end_combat(&mut self) {
        for p in &mut self.players {
            p.combat.clear();
            p.clear_damage();
        }
    }
}

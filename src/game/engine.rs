//! The match controller. Every player intent is a method here: it checks
//! the rules first and only then touches the state.

use crate::card::{Card, CardCatalogue, Deck, DeckStore, TargetType};
use crate::game::config::MatchConfig;
use crate::game::error::{GameError, GameResult};
use crate::game::events::GameEvent;
use crate::game::player::DrawHandle;
use crate::game::state::MatchState;
use crate::game::targeting::PendingCast;
use crate::game::turn::{Phase, Step, TurnState};
use crate::game::zones::DrawnCard;
use crate::ids::{DeckId, PlayerId};
use crate::rng::GameRng;
use log::{debug, info};

pub struct Match {
    pub(crate) state: MatchState,
    pub(crate) rng: GameRng,
    pub(crate) catalogue: CardCatalogue,
}

impl Match {
    /// New match using the built-in card catalogue
    pub fn new(config: MatchConfig) -> GameResult<Self> {
        Self::with_catalogue(config, CardCatalogue::builtin())
    }

    pub fn with_catalogue(config: MatchConfig, catalogue: CardCatalogue) -> GameResult<Self> {
        let rng = GameRng::new(config.seed);
        debug!("New match with seed {}", rng.seed());
        Ok(Match {
            state: MatchState::new(config)?,
            rng,
            catalogue,
        })
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn catalogue(&self) -> &CardCatalogue {
        &self.catalogue
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn active_player(&self) -> PlayerId {
        self.state.active_player
    }

    /// Notices produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Load a deck for `player`: enrich every card, shuffle the library and
    /// deal the opening hand
    pub fn load_deck(&mut self, player: PlayerId, deck: &Deck) -> GameResult<()> {
        let opening = self.state.config.opening_hand_size;
        let (p, clock) = self.state.seat(player)?;
        p.deck = Some(deck.clone());
        p.setup_zones(deck, &self.catalogue);
        p.library.shuffle_remaining(&mut self.rng);
        let hand = p.library.draw(opening.min(p.library.len()))?;
        for card in hand {
            p.hand.push(DrawnCard {
                card,
                drawn_at: clock.tick(),
            });
        }
        let library = p.library.len();
        info!(
            "{} loaded {} ({} cards in library, {} in hand)",
            player,
            deck.name,
            library,
            p.hand.len()
        );
        self.state.emit(GameEvent::DeckLoaded {
            player,
            deck: deck.name.clone(),
            library,
        });
        Ok(())
    }

    /// Fetch a deck from a store and load it
    pub fn load_deck_from(&mut self, player: PlayerId, store: &dyn DeckStore, deck_id: DeckId) -> GameResult<()> {
        let deck = store
            .get_deck(deck_id)
            .map_err(|e| GameError::DeckNotFound(e.to_string()))?;
        self.load_deck(player, &deck)
    }

    /// Start `player` over with the deck they already have: fresh zones,
    /// fresh opening hand, turn state and life back to the start
    pub fn reset_simulation(&mut self, player: PlayerId) -> GameResult<()> {
        let deck = self.state.player(player)?.deck.clone().ok_or(GameError::NoDeck)?;
        self.load_deck(player, &deck)?;
        let life = self.state.config.starting_life;
        let p = self.state.player_mut(player)?;
        let is_active = p.turn.is_active;
        p.turn = TurnState::new(p.turn.max_hand_size);
        p.turn.is_active = is_active;
        p.life = life;
        Ok(())
    }

    pub fn draw_card(&mut self, player: PlayerId) -> GameResult<()> {
        self.draw_multiple(player, 1)
    }

    pub fn draw_multiple(&mut self, player: PlayerId, count: usize) -> GameResult<()> {
        let handle = self.begin_draw(player, count)?;
        self.commit_draw(handle)
    }

    /// Reserve a draw. Nothing moves until the handle is committed.
    pub fn begin_draw(&mut self, player: PlayerId, count: usize) -> GameResult<DrawHandle> {
        let p = self.state.player_mut(player)?;
        if p.pending_draw.is_some() {
            return Err(GameError::DrawInProgress);
        }
        let remaining = p.library.remaining_len();
        if count > remaining {
            return Err(GameError::LibraryExhausted {
                requested: count,
                remaining,
            });
        }
        let handle = DrawHandle { player, count };
        p.pending_draw = Some(handle);
        Ok(handle)
    }

    pub fn commit_draw(&mut self, handle: DrawHandle) -> GameResult<()> {
        if self.state.player(handle.player)?.pending_draw != Some(handle) {
            return Err(GameError::NoPendingDraw);
        }
        self.state.draw_cards(handle.player, handle.count)?;
        let p = self.state.player_mut(handle.player)?;
        p.pending_draw = None;
        if p.turn.phase == Phase::Beginning {
            p.turn.has_drawn_for_turn = true;
        }
        Ok(())
    }

    /// Play the card at `hand_index`. Lands go straight to the battlefield;
    /// everything else goes on the stack, or into targeting first if it
    /// needs a target.
    pub fn play_card(&mut self, player: PlayerId, hand_index: usize) -> GameResult<()> {
        let enforce = self.state.config.enforce_mana_costs;
        let active = self.state.active_player == player;
        let p = self.state.player(player)?;
        let drawn = p.hand_card(hand_index)?;
        let (card, hand_stamp) = (drawn.card.clone(), drawn.drawn_at);

        if card.is_land() {
            if !active {
                return Err(GameError::NotActivePlayer(player));
            }
            if p.turn.has_played_land {
                return Err(GameError::LandAlreadyPlayed);
            }
            let (p, clock) = self.state.seat(player)?;
            let card = p.hand.remove(hand_index).card;
            let name = card.name.clone();
            p.place_on_battlefield(card, clock.tick(), true);
            p.turn.has_played_land = true;
            debug!("{} played land {}", player, name);
            self.state.emit(GameEvent::LandPlayed { player, card: name });
            return Ok(());
        }

        self.check_cast_timing(player, &card)?;
        let available = p.turn.mana.pool.total();
        if enforce && available < card.cmc {
            return Err(GameError::InsufficientMana {
                needed: card.cmc,
                available,
            });
        }

        if let Some(effect) = card.targeted_effect() {
            let target_type = effect.target_type.unwrap_or(TargetType::Any);
            return self.start_targeting(
                player,
                PendingCast::Spell { hand_stamp, card },
                target_type,
                1,
            );
        }

        let p = self.state.player_mut(player)?;
        if enforce {
            p.turn.mana.pay(card.cmc)?;
        }
        let card = p.hand.remove(hand_index).card;
        let name = card.name.clone();
        info!("{} casts {}", player, name);
        self.state.stack.push_spell(card, player);
        self.state.emit(GameEvent::SpellCast { player, card: name });
        Ok(())
    }

    /// Anything but an instant needs its caster active and the stack empty
    pub(crate) fn check_cast_timing(&self, player: PlayerId, card: &Card) -> GameResult<()> {
        if card.is_instant() {
            return Ok(());
        }
        if self.state.active_player != player {
            return Err(GameError::InstantSpeedOnly);
        }
        if !self.state.stack.is_empty() {
            return Err(GameError::StackNotEmpty);
        }
        Ok(())
    }

    /// Jump to `phase`, which must not be earlier than the current one
    pub fn change_phase(&mut self, player: PlayerId, phase: Phase) -> GameResult<()> {
        self.state.require_active(player)?;
        let current = self.state.player(player)?.turn.phase;
        if phase < current {
            return Err(GameError::BackwardPhase {
                from: current,
                to: phase,
            });
        }
        if current == Phase::Combat && phase != Phase::Combat {
            self.state.end_combat();
        }
        self.enter_phase(player, phase)
    }

    fn enter_phase(&mut self, player: PlayerId, phase: Phase) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        p.turn.enter_phase(phase);
        let step = p.turn.step;
        debug!("{} enters {:?} ({:?})", player, phase, step);
        self.state.emit(GameEvent::PhaseChanged { player, phase, step });
        Ok(())
    }

    /// Move the active player on by one step, or to the next phase once a
    /// phase's steps are done. Cleanup is the last stop; `next_turn` ends
    /// the turn.
    pub fn advance_step(&mut self, player: PlayerId) -> GameResult<(Phase, Step)> {
        self.state.require_active(player)?;
        let turn = &self.state.player(player)?.turn;
        let (phase, step) = (turn.phase, turn.step);
        match (phase, step) {
            (Phase::Combat, _) => {
                self.advance_combat_step(player)?;
                if self.state.player(player)?.turn.phase == Phase::PostcombatMain {
                    self.enter_phase(player, Phase::PostcombatMain)?;
                }
            }
            (Phase::Beginning, Step::Untap) => {
                let p = self.state.player_mut(player)?;
                if !p.turn.has_untapped_this_turn {
                    p.untap_all();
                    p.turn.has_untapped_this_turn = true;
                }
                p.turn.step = Step::Upkeep;
            }
            (Phase::Beginning, Step::Upkeep) => {
                let p = self.state.player_mut(player)?;
                p.turn.has_resolved_upkeep = true;
                p.turn.step = Step::Draw;
            }
            (Phase::Ending, Step::EndStep) => {
                let p = self.state.player_mut(player)?;
                p.turn.has_resolved_end_step = true;
                p.turn.step = Step::Cleanup;
            }
            (Phase::Ending, _) => debug!("{} is in cleanup, waiting for next turn", player),
            (Phase::Beginning | Phase::PrecombatMain | Phase::PostcombatMain, _) => {
                if let Some(next) = phase.next() {
                    self.enter_phase(player, next)?;
                }
            }
        }
        let turn = &self.state.player(player)?.turn;
        Ok((turn.phase, turn.step))
    }

    /// Pass the turn to the next player in order
    pub fn next_turn(&mut self, player: PlayerId) -> GameResult<PlayerId> {
        self.state.require_active(player)?;
        let p = self.state.player(player)?;
        if p.hand.len() > p.turn.max_hand_size {
            return Err(GameError::HandOverLimit {
                size: p.hand.len(),
                max: p.turn.max_hand_size,
            });
        }
        let next = self.state.next_player(player);
        self.state.end_combat();
        self.state.player_mut(player)?.turn.is_active = false;
        self.state.active_player = next;

        let p = self.state.player_mut(next)?;
        p.untap_all();
        p.turn.begin_turn();
        p.turn.has_untapped_this_turn = true;
        let turn = p.turn.turn_number;
        info!("Turn {} begins for {}", turn, next);
        self.state.emit(GameEvent::TurnStarted { player: next, turn });
        Ok(next)
    }

    pub fn untap_all_permanents(&mut self, player: PlayerId) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        p.untap_all();
        p.turn.has_untapped_this_turn = true;
        Ok(())
    }

    pub fn update_max_hand_size(&mut self, player: PlayerId, max_hand_size: usize) -> GameResult<()> {
        self.state.player_mut(player)?.turn.max_hand_size = max_hand_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, DeckCard, ManaColor};
    use crate::ids::{CardId, TargetId};

    fn burn_deck() -> Deck {
        Deck::new(
            1,
            "Burn",
            vec![
                DeckCard::new(1, "Mountain", "Basic Land — Mountain", 0).with_quantity(20),
                DeckCard::new(2, "Lightning Bolt", "Instant", 1).with_quantity(10),
                DeckCard::new(3, "Goblin Raider", "Creature — Goblin Warrior", 2)
                    .with_stats("2", "2")
                    .with_quantity(10),
            ],
        )
    }

    fn loaded() -> Match {
        let mut m = Match::new(MatchConfig::default().with_seed(21)).unwrap();
        m.load_deck(PlayerId(1), &burn_deck()).unwrap();
        m.load_deck(PlayerId(2), &burn_deck()).unwrap();
        m
    }

    fn give(m: &mut Match, player: PlayerId, card: Card) -> usize {
        m.add_card_to_hand(player, card).unwrap();
        m.state.player(player).unwrap().hand.len() - 1
    }

    fn mountain(id: u32) -> Card {
        Card::new(CardId(id), "Mountain", "Basic Land — Mountain", 0)
    }

    fn bolt(id: u32) -> Card {
        Card::new(CardId(id), "Lightning Bolt", "Instant", 1)
    }

    #[test]
    fn test_load_deals_opening_hand() {
        let m = loaded();
        let p = m.state.player(PlayerId(1)).unwrap();
        assert_eq!(p.hand.len(), 7);
        assert_eq!(p.library.cursor(), 7);
        assert_eq!(p.library.len(), 40);
        assert_eq!(p.card_count(), 40);
    }

    #[test]
    fn test_same_seed_same_hand() {
        let a = loaded();
        let b = loaded();
        let names = |m: &Match| -> Vec<String> {
            m.state.players[0].hand.iter().map(|c| c.card.name.clone()).collect()
        };
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_one_land_per_turn() {
        let mut m = loaded();
        let first = give(&mut m, PlayerId(1), mountain(90));
        m.play_card(PlayerId(1), first).unwrap();
        let second = give(&mut m, PlayerId(1), mountain(91));
        assert_eq!(m.play_card(PlayerId(1), second), Err(GameError::LandAlreadyPlayed));
        let theirs = give(&mut m, PlayerId(2), mountain(92));
        assert_eq!(
            m.play_card(PlayerId(2), theirs),
            Err(GameError::NotActivePlayer(PlayerId(2)))
        );
    }

    #[test]
    fn test_sorcery_speed_rules() {
        let mut m = loaded();
        let raider = Card::new(CardId(93), "Goblin Raider", "Creature — Goblin Warrior", 2).with_stats(2, 2);
        let idx = give(&mut m, PlayerId(2), raider.clone());
        assert_eq!(m.play_card(PlayerId(2), idx), Err(GameError::InstantSpeedOnly));

        let idx = give(&mut m, PlayerId(1), raider);
        assert!(matches!(
            m.play_card(PlayerId(1), idx),
            Err(GameError::InsufficientMana { needed: 2, available: 0 })
        ));
        m.state.players[0].turn.mana.pool.add(ManaColor::Red, 2);
        m.play_card(PlayerId(1), idx).unwrap();
        assert_eq!(m.state.stack.len(), 1);
        assert_eq!(m.state.players[0].turn.mana.pool.total(), 0);

        m.pass_priority().unwrap();
        let p = m.state.player(PlayerId(1)).unwrap();
        assert_eq!(p.creatures.len(), 1);
        assert!(p.creatures[0].entered_this_turn);
    }

    #[test]
    fn test_non_active_player_casts_instant() {
        let mut m = loaded();
        m.state.players[1].turn.mana.pool.add(ManaColor::Red, 1);
        let idx = give(&mut m, PlayerId(2), bolt(94));
        m.play_card(PlayerId(2), idx).unwrap();
        assert!(m.state.players[1].targeting.is_targeting);
        m.select_target(PlayerId(2), TargetId::Player(PlayerId(1))).unwrap();
        m.confirm_targeting(PlayerId(2)).unwrap();
        m.pass_priority().unwrap();
        assert_eq!(m.state.players[0].life, 37);
        assert_eq!(m.state.players[1].graveyard.len(), 1);
    }

    #[test]
    fn test_cancel_targeting_keeps_card() {
        let mut m = loaded();
        m.state.players[0].turn.mana.pool.add(ManaColor::Red, 1);
        let idx = give(&mut m, PlayerId(1), bolt(95));
        let hand = m.state.players[0].hand.len();
        m.play_card(PlayerId(1), idx).unwrap();
        m.cancel_targeting(PlayerId(1)).unwrap();
        assert_eq!(m.state.players[0].hand.len(), hand);
        assert_eq!(m.state.players[0].turn.mana.pool.red, 1);
        assert!(m.state.stack.is_empty());
    }

    #[test]
    fn test_confirm_without_selection() {
        let mut m = loaded();
        m.state.players[0].turn.mana.pool.add(ManaColor::Red, 1);
        let idx = give(&mut m, PlayerId(1), bolt(96));
        m.play_card(PlayerId(1), idx).unwrap();
        assert_eq!(
            m.confirm_targeting(PlayerId(1)),
            Err(GameError::TargetsNotSelected { required: 1, selected: 0 })
        );
        assert!(m.state.stack.is_empty());
    }

    #[test]
    fn test_draw_protocol() {
        let mut m = loaded();
        let handle = m.begin_draw(PlayerId(1), 2).unwrap();
        assert_eq!(m.begin_draw(PlayerId(1), 1), Err(GameError::DrawInProgress));
        assert_eq!(m.state.players[0].hand.len(), 7);
        m.commit_draw(handle).unwrap();
        let p = m.state.player(PlayerId(1)).unwrap();
        assert_eq!(p.hand.len(), 9);
        assert_eq!(p.library.cursor(), 9);
        assert!(p.turn.has_drawn_for_turn);
        assert_eq!(m.commit_draw(handle), Err(GameError::NoPendingDraw));
        assert!(matches!(
            m.draw_multiple(PlayerId(1), 40),
            Err(GameError::LibraryExhausted { requested: 40, remaining: 31 })
        ));
    }

    #[test]
    fn test_phase_only_moves_forward() {
        let mut m = loaded();
        m.change_phase(PlayerId(1), Phase::Combat).unwrap();
        assert_eq!(m.state.players[0].turn.step, Step::BeginningOfCombat);
        assert_eq!(
            m.change_phase(PlayerId(1), Phase::PrecombatMain),
            Err(GameError::BackwardPhase {
                from: Phase::Combat,
                to: Phase::PrecombatMain
            })
        );
        m.change_phase(PlayerId(1), Phase::Ending).unwrap();
        assert_eq!(m.state.players[0].turn.step, Step::EndStep);
    }

    #[test]
    fn test_advance_step_walks_the_turn() {
        let mut m = loaded();
        let p1 = PlayerId(1);
        assert_eq!(m.advance_step(p1).unwrap(), (Phase::Beginning, Step::Upkeep));
        assert_eq!(m.advance_step(p1).unwrap(), (Phase::Beginning, Step::Draw));
        assert_eq!(m.advance_step(p1).unwrap().0, Phase::PrecombatMain);
        assert_eq!(m.advance_step(p1).unwrap(), (Phase::Combat, Step::BeginningOfCombat));
        assert_eq!(m.advance_step(p1).unwrap(), (Phase::Combat, Step::DeclareAttackers));
        assert_eq!(m.advance_step(p1).unwrap(), (Phase::Combat, Step::EndOfCombat));
        assert_eq!(m.advance_step(p1).unwrap().0, Phase::PostcombatMain);
        assert_eq!(m.advance_step(p1).unwrap(), (Phase::Ending, Step::EndStep));
        assert_eq!(m.advance_step(p1).unwrap(), (Phase::Ending, Step::Cleanup));
        assert_eq!(m.advance_step(p1).unwrap(), (Phase::Ending, Step::Cleanup));
        assert!(m.state.players[0].turn.has_resolved_upkeep);
        assert!(m.state.players[0].turn.has_resolved_end_step);
    }

    #[test]
    fn test_next_turn_hands_off() {
        let mut m = loaded();
        m.draw_card(PlayerId(1)).unwrap();
        assert_eq!(
            m.next_turn(PlayerId(1)),
            Err(GameError::HandOverLimit { size: 8, max: 7 })
        );
        assert_eq!(m.active_player(), PlayerId(1));
        m.discard_card(PlayerId(1), 0).unwrap();

        assert_eq!(m.next_turn(PlayerId(1)).unwrap(), PlayerId(2));
        let (p1, p2) = (&m.state.players[0], &m.state.players[1]);
        assert!(!p1.turn.is_active);
        assert!(p2.turn.is_active);
        assert_eq!(p2.turn.turn_number, 2);
        assert!(p2.turn.has_untapped_this_turn);
        assert_eq!((p2.turn.phase, p2.turn.step), (Phase::Beginning, Step::Untap));
        assert_eq!(
            m.next_turn(PlayerId(1)),
            Err(GameError::NotActivePlayer(PlayerId(1)))
        );
    }

    #[test]
    fn test_reset_simulation() {
        let mut m = loaded();
        let land = give(&mut m, PlayerId(1), mountain(97));
        m.play_card(PlayerId(1), land).unwrap();
        m.state.players[0].life = 12;
        m.reset_simulation(PlayerId(1)).unwrap();
        let p = m.state.player(PlayerId(1)).unwrap();
        assert!(p.lands.is_empty());
        assert_eq!(p.hand.len(), 7);
        assert_eq!(p.life, 40);
        assert!(!p.turn.has_played_land);
        assert!(p.turn.is_active);

        let mut fresh = Match::new(MatchConfig::default()).unwrap();
        assert_eq!(fresh.reset_simulation(PlayerId(1)), Err(GameError::NoDeck));
    }
}

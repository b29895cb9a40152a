//! Goldfish autopilot: plays a deck against an opponent who never
//! interacts, to see how fast it develops and how much damage it deals

use crate::card::{CardCatalogue, Deck};
use crate::game::{GameError, GameEvent, GameResult, Match, MatchConfig, Phase, Step};
use crate::ids::{PlayerId, TargetId, Timestamp};
use log::debug;
use std::collections::HashSet;

/// What happened in one autopilot match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoldfishResult {
    pub seed: u64,
    pub turns_played: u32,
    /// The first player to reach zero life, and the turn it happened
    pub defeated: Option<(PlayerId, u32)>,
    pub final_life: Vec<(PlayerId, u32)>,
    pub lands_played: u32,
    pub spells_cast: u32,
    /// Life player 1's opponents actually lost; overkill is not counted
    pub opponent_life_lost: u32,
}

impl GoldfishResult {
    fn tally(&mut self, events: Vec<GameEvent>, verbose: bool) {
        for event in events {
            if verbose {
                println!("  {}", event);
            }
            match event {
                GameEvent::LandPlayed { .. } => self.lands_played += 1,
                GameEvent::SpellCast { .. } | GameEvent::CommanderCast { .. } => self.spells_cast += 1,
                GameEvent::LifeLost { player, amount } if player != PlayerId(1) => {
                    self.opponent_life_lost += amount
                }
                GameEvent::PlayerDefeated { player } if self.defeated.is_none() => {
                    self.defeated = Some((player, self.turns_played));
                }
                _ => {}
            }
        }
    }
}

/// Play `turns` rounds of autopilot. Player 1 plays `deck`; player 2 plays
/// `opponent` or, without one, just passes.
pub fn run_goldfish(
    deck: &Deck,
    opponent: Option<&Deck>,
    turns: u32,
    config: &MatchConfig,
    catalogue: &CardCatalogue,
    seed: u64,
    verbose: bool,
) -> GameResult<GoldfishResult> {
    let mut game = Match::with_catalogue(config.clone().with_seed(seed), catalogue.clone())?;
    game.load_deck(PlayerId(1), deck)?;
    if let Some(opponent) = opponent {
        game.load_deck(PlayerId(2), opponent)?;
    }
    let seats = game.state().players.len() as u32;
    let mut result = GoldfishResult {
        seed,
        ..GoldfishResult::default()
    };
    if verbose {
        println!("=== Goldfish (seed: {}) ===", seed);
    }
    result.tally(game.drain_events(), verbose);

    for turn in 0..turns * seats {
        let player = game.active_player();
        result.turns_played = turn / seats + 1;
        if verbose {
            println!("-- Turn {} ({}) --", result.turns_played, player);
        }
        play_turn(&mut game, player, turn == 0)?;
        result.tally(game.drain_events(), verbose);
        if result.defeated.is_some() {
            break;
        }
        discard_to_hand_size(&mut game, player)?;
        game.next_turn(player)?;
        result.tally(game.drain_events(), verbose);
    }

    result.final_life = game.state().players.iter().map(|p| (p.id, p.life)).collect();
    Ok(result)
}

/// One full turn of greedy play: land, all mana, every affordable spell,
/// attack with everything that can
pub fn play_turn(game: &mut Match, player: PlayerId, skip_draw: bool) -> GameResult<()> {
    game.advance_step(player)?;
    game.advance_step(player)?;
    let remaining = game.state().player(player)?.library.remaining_len();
    if !skip_draw && remaining > 0 {
        game.draw_card(player)?;
    }
    game.advance_step(player)?;

    play_a_land(game, player)?;
    float_all_mana(game, player)?;
    cast_what_we_can(game, player)?;
    if game.state().player(player)?.command_zone.is_some() {
        cast_commander_if_affordable(game, player)?;
    }

    game.advance_step(player)?;
    game.advance_step(player)?;
    attack_with_everything(game, player)?;
    while game.state().player(player)?.turn.phase == Phase::Combat {
        game.advance_step(player)?;
    }

    game.advance_step(player)?;
    game.advance_step(player)?;
    Ok(())
}

fn play_a_land(game: &mut Match, player: PlayerId) -> GameResult<()> {
    let land = game
        .state()
        .player(player)?
        .hand
        .iter()
        .position(|c| c.card.is_land());
    if let Some(index) = land {
        game.play_card(player, index)?;
    }
    Ok(())
}

/// Tap every land and every mana creature or rock
fn float_all_mana(game: &mut Match, player: PlayerId) -> GameResult<()> {
    let p = game.state().player(player)?;
    let lands: Vec<usize> = (0..p.lands.len())
        .filter(|i| !p.is_tapped(p.lands[*i].instance_id()))
        .collect();
    let rocks: Vec<_> = p
        .creatures
        .iter()
        .filter(|c| c.card.activated_abilities.iter().any(|a| a.is_mana_ability()))
        .map(|c| c.instance_id())
        .collect();
    for index in lands {
        game.tap_land(player, index)?;
    }
    for source in rocks {
        let ability = game
            .activatable_abilities(player, source)
            .into_iter()
            .find(|(_, a)| a.is_mana_ability());
        if let Some((index, _)) = ability {
            game.activate_ability(player, source, index)?;
        }
    }
    Ok(())
}

fn cast_what_we_can(game: &mut Match, player: PlayerId) -> GameResult<()> {
    let opponent = game.state().next_player(player);
    let mut given_up: HashSet<Timestamp> = HashSet::new();
    loop {
        let p = game.state().player(player)?;
        let pool = p.turn.mana.pool.total();
        let next = p.hand.iter().enumerate().find(|(_, c)| {
            !c.card.is_land() && c.card.cmc <= pool && !given_up.contains(&c.drawn_at)
        });
        let Some((index, drawn)) = next else {
            return Ok(());
        };
        let stamp = drawn.drawn_at;
        game.play_card(player, index)?;

        if game.state().player(player)?.targeting.is_targeting {
            if !choose_hostile_target(game, player, opponent)? {
                debug!("No target worth hitting, keeping card {}", stamp);
                game.cancel_targeting(player)?;
                given_up.insert(stamp);
                continue;
            }
            game.confirm_targeting(player)?;
        }
        while !game.state().stack.is_empty() {
            game.pass_priority()?;
        }
    }
}

/// Pick the opponent's face, or failing that one of their permanents
fn choose_hostile_target(game: &mut Match, player: PlayerId, opponent: PlayerId) -> GameResult<bool> {
    let Some(target_type) = game.state().player(player)?.targeting.target_type else {
        return Err(GameError::NotTargeting);
    };
    let candidates = game.valid_targets(target_type);
    let face = TargetId::Player(opponent);
    let pick = if candidates.contains(&face) {
        Some(face)
    } else {
        candidates.into_iter().find(|t| match t {
            TargetId::Permanent(id) => game.state().owner_of(*id) == Some(opponent),
            TargetId::Player(_) => false,
        })
    };
    match pick {
        Some(target) => {
            game.select_target(player, target)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn cast_commander_if_affordable(game: &mut Match, player: PlayerId) -> GameResult<()> {
    let cost = game.commander_cost(player)?;
    let pool = game.state().player(player)?.turn.mana.pool.total();
    if pool >= cost {
        game.cast_commander(player)?;
    }
    Ok(())
}

fn attack_with_everything(game: &mut Match, player: PlayerId) -> GameResult<()> {
    let p = game.state().player(player)?;
    if !p.turn.in_step(Phase::Combat, Step::DeclareAttackers) {
        return Ok(());
    }
    let ready: Vec<usize> = p
        .creatures
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.card.is_creature()
                && c.card.power() > 0
                && !p.is_tapped(c.instance_id())
                && !p.is_summoning_sick(c)
        })
        .map(|(i, _)| i)
        .collect();
    for index in ready {
        game.declare_attacker(player, index)?;
    }
    Ok(())
}

fn discard_to_hand_size(game: &mut Match, player: PlayerId) -> GameResult<()> {
    loop {
        let p = game.state().player(player)?;
        if p.hand.len() <= p.turn.max_hand_size {
            return Ok(());
        }
        let last = p.hand.len() - 1;
        game.discard_card(player, last)?;
    }
}

//! Integration tests for the match engine
//! Drives whole matches through the public `Match` API with fixed seeds

use crate::card::{
    Card, Deck, DeckCard, DeckStore, EffectKind, InMemoryDeckStore, Keyword, ManaColor, SpellEffect,
    TargetType,
};
use crate::game::{GameError, GameEvent, Match, MatchConfig, Phase, SearchAction, Step};
use crate::ids::{CardId, InstanceId, PlayerId, TargetId};
use crate::rng::GameRng;

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

fn commander_deck() -> Deck {
    Deck::new(
        7,
        "Ezuri Elves",
        vec![
            DeckCard::new(1, "Forest", "Basic Land — Forest", 0).with_quantity(35),
            DeckCard::new(2, "Llanowar Elves", "Creature — Elf Druid", 1)
                .with_stats("1", "1")
                .with_quantity(10),
            DeckCard::new(3, "Grizzly Bears", "Creature — Bear", 2)
                .with_stats("2", "2")
                .with_quantity(20),
            DeckCard::new(4, "Lightning Bolt", "Instant", 1).with_quantity(10),
            DeckCard::new(5, "Doom Blade", "Instant", 2).with_quantity(5),
            DeckCard::new(6, "Divination", "Sorcery", 3).with_quantity(5),
            DeckCard::new(7, "Serra Angel", "Creature — Angel", 5)
                .with_stats("4", "4")
                .with_text("Flying, vigilance")
                .with_quantity(14),
            DeckCard::new(99, "Ezuri, Renegade Leader", "Legendary Creature — Elf Warrior", 3)
                .with_stats("2", "2"),
        ],
    )
    .with_commander(CardId(99))
}

fn new_match(config: MatchConfig) -> Match {
    let mut m = Match::new(config).unwrap();
    m.load_deck(P1, &commander_deck()).unwrap();
    m.load_deck(P2, &commander_deck()).unwrap();
    m.drain_events();
    m
}

fn seeded() -> Match {
    new_match(MatchConfig::default().with_seed(2024))
}

fn place(m: &mut Match, player: PlayerId, card: Card) -> InstanceId {
    let card = m.catalogue.enrich(card);
    let (p, clock) = m.state.seat(player).unwrap();
    p.place_on_battlefield(card, clock.tick(), false)
}

fn creature(id: u32, name: &str, power: u32, toughness: u32) -> Card {
    Card::new(CardId(id), name, "Creature — Test", 2).with_stats(power, toughness)
}

fn give(m: &mut Match, player: PlayerId, card: Card) -> usize {
    m.add_card_to_hand(player, card).unwrap();
    m.state().player(player).unwrap().hand.len() - 1
}

/// Walk the active player to the declare-attackers step
fn to_declare_attackers(m: &mut Match, player: PlayerId) {
    m.change_phase(player, Phase::Combat).unwrap();
    assert_eq!(m.advance_step(player).unwrap(), (Phase::Combat, Step::DeclareAttackers));
}

/// Every card a player owns, wherever it is, including their spells on the stack
fn owned_cards(m: &Match, player: PlayerId) -> usize {
    m.state().player(player).unwrap().card_count() + m.state().stack.spells_of(player)
}

#[test]
fn test_commander_deck_load() {
    let m = seeded();
    let p = m.state().player(P1).unwrap();
    assert_eq!(p.hand.len(), 7);
    assert_eq!(p.library.cursor(), 7);
    assert_eq!(p.library.len(), 99);
    assert_eq!(p.command_zone.as_ref().map(|c| c.name.as_str()), Some("Ezuri, Renegade Leader"));
    assert_eq!(owned_cards(&m, P1), 100);

    let angel = p
        .library
        .cards()
        .iter()
        .find(|c| c.card.name == "Serra Angel")
        .unwrap();
    assert!(angel.card.has_keyword(Keyword::Flying));
    assert!(angel.card.has_keyword(Keyword::Vigilance));
}

#[test]
fn test_load_from_store() {
    let mut store = InMemoryDeckStore::new();
    store.insert(commander_deck());
    let mut m = Match::new(MatchConfig::default().with_seed(3)).unwrap();
    m.load_deck_from(P1, &store, 7).unwrap();
    assert_eq!(m.state().player(P1).unwrap().hand.len(), 7);
    assert!(matches!(
        m.load_deck_from(P2, &store, 8),
        Err(GameError::DeckNotFound(_))
    ));
    assert!(store.get_deck(7).is_ok());
}

#[test]
fn test_sample_deck_file() {
    let store = InMemoryDeckStore::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/decks.json")).unwrap();
    assert_eq!(store.deck_ids(), vec![1, 2]);

    let elves = store.get_deck(1).unwrap();
    assert_eq!(elves.card_count(), 100);
    assert_eq!(elves.commander_id, Some(CardId(99)));
    let burn = store.get_deck(2).unwrap();
    assert_eq!(burn.card_count(), 60);

    let mut m = Match::new(MatchConfig::default().with_seed(11)).unwrap();
    m.load_deck_from(P1, &store, 1).unwrap();
    m.load_deck_from(P2, &store, 2).unwrap();
    assert_eq!(owned_cards(&m, P1), 100);
    assert_eq!(owned_cards(&m, P2), 60);
    assert!(m.state().player(P2).unwrap().command_zone.is_none());
    let bolt = m
        .state()
        .player(P2)
        .unwrap()
        .library
        .cards()
        .iter()
        .find(|c| c.card.name == "Lightning Bolt")
        .map(|c| c.card.clone())
        .unwrap();
    assert!(bolt.targeted_effect().is_some());
}

#[test]
fn test_forest_untap_after_spend_is_rejected() {
    let mut m = seeded();
    let idx = give(&mut m, P1, Card::new(CardId(50), "Forest", "Basic Land — Forest", 0));
    m.play_card(P1, idx).unwrap();
    let land = m.state().player(P1).unwrap().lands.len() - 1;

    assert_eq!(m.tap_land(P1, land).unwrap(), ManaColor::Green);
    let p = m.state().player(P1).unwrap();
    let forest = p.lands[land].instance_id();
    assert_eq!(p.turn.mana.pool.green, 1);
    assert!(p.is_tapped(forest));

    let elf = Card::new(CardId(2), "Llanowar Elves", "Creature — Elf Druid", 1);
    m.spend_mana_for_card(P1, &elf).unwrap();
    assert_eq!(m.untap_land(P1, land), Err(GameError::ManaAlreadySpent(forest)));
    let p = m.state().player(P1).unwrap();
    assert_eq!(p.turn.mana.pool.green, 0);
    assert!(p.is_tapped(forest));
}

#[test]
fn test_untap_unspent_land_refunds() {
    let mut m = seeded();
    place(&mut m, P1, Card::new(CardId(50), "Island", "Basic Land — Island", 0));
    m.tap_land(P1, 0).unwrap();
    assert!(m.tap_land(P1, 0).unwrap_err().is_rule_violation());
    m.untap_land(P1, 0).unwrap();
    let p = m.state().player(P1).unwrap();
    assert_eq!(p.turn.mana.pool.blue, 0);
    assert!(p.turn.mana.sources.is_empty());
}

#[test]
fn test_three_three_attacks_into_two_two() {
    let mut m = seeded();
    let ogre = place(&mut m, P1, creature(60, "Ogre", 3, 3));
    let bear = place(&mut m, P2, creature(61, "Bear", 2, 2));

    to_declare_attackers(&mut m, P1);
    assert!(m.declare_attacker(P1, 0).unwrap());
    assert!(m.state().player(P1).unwrap().is_tapped(ogre));
    assert_eq!(m.advance_step(P1).unwrap().1, Step::DeclareBlockers);
    assert!(m.declare_blocker(P2, P1, 0, 0).unwrap());
    assert_eq!(m.advance_step(P1).unwrap().1, Step::CombatDamage);
    assert_eq!(m.advance_step(P1).unwrap().1, Step::EndOfCombat);

    let attacker = m.state().permanent(ogre).unwrap();
    assert_eq!(attacker.damage, 2);
    let p2 = m.state().player(P2).unwrap();
    assert!(p2.permanent(bear).is_none());
    assert_eq!(p2.graveyard.last().unwrap().card.name, "Bear");
    assert_eq!(p2.graveyard.last().unwrap().damage, 3);
    assert_eq!(p2.life, 40);

    assert_eq!(m.advance_step(P1).unwrap().0, Phase::PostcombatMain);
    assert_eq!(m.state().permanent(ogre).unwrap().damage, 0);
    assert!(m.state().player(P1).unwrap().combat.attackers.is_empty());
}

#[test]
fn test_unblocked_lifelink_and_defeat() {
    let mut m = new_match(MatchConfig {
        starting_life: 3,
        ..MatchConfig::default().with_seed(8)
    });
    place(
        &mut m,
        P1,
        creature(62, "Nighthawk", 3, 2).with_keywords(&[Keyword::Lifelink]),
    );
    to_declare_attackers(&mut m, P1);
    m.declare_attacker(P1, 0).unwrap();
    m.advance_step(P1).unwrap();
    m.advance_step(P1).unwrap();
    m.advance_step(P1).unwrap();

    assert_eq!(m.state().player(P2).unwrap().life, 0);
    assert_eq!(m.state().player(P1).unwrap().life, 6);
    let events = m.drain_events();
    assert!(events.contains(&GameEvent::PlayerDefeated { player: P2 }));
}

#[test]
fn test_first_strike_kills_before_damage_back() {
    let mut m = seeded();
    let knight = place(
        &mut m,
        P1,
        creature(63, "White Knight", 2, 2).with_keywords(&[Keyword::FirstStrike]),
    );
    place(&mut m, P2, creature(64, "Bear", 2, 2));

    to_declare_attackers(&mut m, P1);
    m.declare_attacker(P1, 0).unwrap();
    m.advance_step(P1).unwrap();
    m.declare_blocker(P2, P1, 0, 0).unwrap();
    assert_eq!(m.advance_step(P1).unwrap().1, Step::FirstStrikeDamage);
    assert_eq!(m.advance_step(P1).unwrap().1, Step::CombatDamage);
    assert!(m.state().player(P2).unwrap().creatures.is_empty());
    assert_eq!(m.advance_step(P1).unwrap().1, Step::EndOfCombat);
    assert_eq!(m.state().permanent(knight).unwrap().damage, 0);
}

#[test]
fn test_deathtouch_and_indestructible_in_combat() {
    let mut m = seeded();
    let colossus = place(
        &mut m,
        P1,
        creature(65, "Darksteel Colossus", 11, 11).with_keywords(&[Keyword::Indestructible]),
    );
    place(
        &mut m,
        P2,
        creature(66, "Deathtouch Assassin", 1, 1),
    );
    assert!(m.state().player(P2).unwrap().creatures[0].card.has_keyword(Keyword::Deathtouch));

    to_declare_attackers(&mut m, P1);
    m.declare_attacker(P1, 0).unwrap();
    m.advance_step(P1).unwrap();
    m.declare_blocker(P2, P1, 0, 0).unwrap();
    m.advance_step(P1).unwrap();
    m.advance_step(P1).unwrap();

    assert_eq!(m.state().permanent(colossus).unwrap().damage, 1);
    assert!(m.state().player(P2).unwrap().creatures.is_empty());
}

#[test]
fn test_summoning_sick_and_vigilant_attackers() {
    let mut m = seeded();
    let angel = place(&mut m, P1, creature(67, "Serra Angel", 4, 4));
    {
        let (p, clock) = m.state.seat(P1).unwrap();
        p.place_on_battlefield(creature(68, "Fresh Bear", 2, 2), clock.tick(), true);
    }
    to_declare_attackers(&mut m, P1);
    m.declare_attacker(P1, 0).unwrap();
    assert!(!m.state().player(P1).unwrap().is_tapped(angel));
    assert!(matches!(
        m.declare_attacker(P1, 1),
        Err(GameError::SummoningSick(_))
    ));
    assert!(!m.declare_attacker(P1, 0).unwrap());
}

#[test]
fn test_commander_tax() {
    let mut m = seeded();
    assert_eq!(m.commander_cost(P1).unwrap(), 3);
    m.state.players[0].turn.mana.pool.add(ManaColor::Green, 20);

    let first = m.cast_commander(P1).unwrap();
    assert_eq!(m.state().player(P1).unwrap().turn.mana.pool.total(), 17);
    assert!(m.state().permanent(first).unwrap().entered_this_turn);
    assert_eq!(m.commander_cost(P1), Err(GameError::NoCommander));

    m.destroy_permanent(first).unwrap();
    assert_eq!(m.commander_cost(P1).unwrap(), 5);
    let second = m.cast_commander(P1).unwrap();
    m.exile_permanent(second).unwrap();
    assert_eq!(m.commander_cost(P1).unwrap(), 7);
    assert_eq!(m.state().player(P1).unwrap().commander_tax, 2);

    m.state.players[0].turn.mana.pool.clear();
    m.state.players[0].turn.mana.pool.add(ManaColor::Colorless, 6);
    assert_eq!(
        m.cast_commander(P1),
        Err(GameError::InsufficientMana { needed: 7, available: 6 })
    );
    assert_eq!(m.state().player(P1).unwrap().commander_tax, 2);
    assert_eq!(owned_cards(&m, P1), 100);
}

#[test]
fn test_lightning_bolt_kills_a_creature() {
    let mut m = seeded();
    let bear = place(&mut m, P2, creature(70, "Bear", 2, 2));
    m.state.players[0].turn.mana.pool.add(ManaColor::Red, 1);
    let idx = give(&mut m, P1, Card::new(CardId(4), "Lightning Bolt", "Instant", 1));
    m.play_card(P1, idx).unwrap();

    let targeting = &m.state().player(P1).unwrap().targeting;
    assert!(targeting.is_targeting);
    assert_eq!(targeting.required, 1);
    let candidates = m.valid_targets(TargetType::CreatureOrPlayer);
    assert!(candidates.contains(&TargetId::Permanent(bear)));
    assert!(candidates.contains(&TargetId::Player(P1)));

    let land = place(&mut m, P2, Card::new(CardId(71), "Swamp", "Basic Land — Swamp", 0));
    assert!(matches!(
        m.select_target(P1, TargetId::Permanent(land)),
        Err(GameError::InvalidTarget(_))
    ));
    assert!(m.select_target(P1, TargetId::Permanent(bear)).unwrap());
    m.confirm_targeting(P1).unwrap();

    assert_eq!(m.state().stack.len(), 1);
    let item = m.state().stack.top().unwrap();
    assert_eq!(item.effects[0].targets, vec![TargetId::Permanent(bear)]);
    assert!(!m.state().player(P1).unwrap().targeting.is_targeting);

    m.pass_priority().unwrap();
    let p2 = m.state().player(P2).unwrap();
    assert!(p2.permanent(bear).is_none());
    assert_eq!(p2.graveyard.len(), 1);
    assert_eq!(m.state().player(P1).unwrap().graveyard.last().unwrap().card.name, "Lightning Bolt");
    assert!(m.state().stack.is_empty());
}

#[test]
fn test_doom_blade_without_creatures() {
    let mut m = seeded();
    m.state.players[0].turn.mana.pool.add(ManaColor::Black, 2);
    let idx = give(&mut m, P1, Card::new(CardId(5), "Doom Blade", "Instant", 2));
    m.play_card(P1, idx).unwrap();
    assert_eq!(
        m.confirm_targeting(P1),
        Err(GameError::NotEnoughTargets { required: 1, available: 0 })
    );
    m.cancel_targeting(P1).unwrap();
    assert_eq!(m.state().player(P1).unwrap().turn.mana.pool.black, 2);
}

#[test]
fn test_stack_resolves_last_in_first_out() {
    let mut m = seeded();
    m.state.players[0].turn.mana.pool.add(ManaColor::Blue, 3);
    m.state.players[1].turn.mana.pool.add(ManaColor::Red, 1);
    let divination = give(&mut m, P1, Card::new(CardId(6), "Divination", "Sorcery", 3));
    m.play_card(P1, divination).unwrap();

    let bolt = give(&mut m, P2, Card::new(CardId(4), "Lightning Bolt", "Instant", 1));
    m.play_card(P2, bolt).unwrap();
    m.select_target(P2, TargetId::Player(P1)).unwrap();
    m.confirm_targeting(P2).unwrap();

    let sorcery = give(&mut m, P1, Card::new(CardId(6), "Divination", "Sorcery", 3));
    assert_eq!(m.play_card(P1, sorcery), Err(GameError::StackNotEmpty));

    let hand_before = m.state().player(P1).unwrap().hand.len();
    m.pass_priority().unwrap();
    assert_eq!(m.state().player(P1).unwrap().life, 37);
    assert_eq!(m.state().player(P1).unwrap().hand.len(), hand_before);
    m.pass_priority().unwrap();
    assert_eq!(m.state().player(P1).unwrap().hand.len(), hand_before + 2);
    m.pass_priority().unwrap();
    assert_eq!(m.resolve_top_of_stack(), Err(GameError::StackEmpty));
}

#[test]
fn test_pending_sorcery_waits_for_empty_stack() {
    let mut m = seeded();
    m.state.players[0].turn.mana.pool.add(ManaColor::Red, 1);
    m.state.players[1].turn.mana.pool.add(ManaColor::Red, 1);
    let spike = Card::new(CardId(80), "Searing Spike", "Sorcery", 1).with_effects(vec![
        SpellEffect::new(EffectKind::Damage, 3, "3 damage to target player").targeting(TargetType::Player),
    ]);
    let sorcery = give(&mut m, P1, spike);
    m.play_card(P1, sorcery).unwrap();
    m.select_target(P1, TargetId::Player(P2)).unwrap();

    let bolt = give(&mut m, P2, Card::new(CardId(4), "Lightning Bolt", "Instant", 1));
    m.play_card(P2, bolt).unwrap();
    m.select_target(P2, TargetId::Player(P1)).unwrap();
    m.confirm_targeting(P2).unwrap();

    assert_eq!(m.confirm_targeting(P1), Err(GameError::StackNotEmpty));
    let p1 = m.state().player(P1).unwrap();
    assert!(p1.targeting.is_targeting);
    assert_eq!(p1.turn.mana.pool.red, 1);
    assert_eq!(p1.hand[sorcery].card.name, "Searing Spike");
    assert_eq!(m.state().stack.len(), 1);

    m.pass_priority().unwrap();
    m.confirm_targeting(P1).unwrap();
    m.pass_priority().unwrap();
    assert_eq!(m.state().player(P1).unwrap().life, 37);
    assert_eq!(m.state().player(P2).unwrap().life, 37);
}

#[test]
fn test_turn_handoff() {
    let mut m = seeded();
    m.draw_card(P1).unwrap();
    assert!(matches!(m.next_turn(P1), Err(GameError::HandOverLimit { .. })));
    assert_eq!(m.active_player(), P1);

    m.update_max_hand_size(P1, 8).unwrap();
    let bear = place(&mut m, P2, creature(72, "Bear", 2, 2));
    m.state.players[1].tapped_creatures.insert(bear);
    m.state.players[1].turn.mana.pool.add(ManaColor::Red, 2);

    assert_eq!(m.next_turn(P1).unwrap(), P2);
    let p2 = m.state().player(P2).unwrap();
    assert!(p2.turn.is_active);
    assert!(!p2.is_tapped(bear));
    assert_eq!(p2.turn.mana.pool.total(), 0);
    assert_eq!((p2.turn.phase, p2.turn.step), (Phase::Beginning, Step::Untap));
    assert!(!m.state().player(P1).unwrap().turn.is_active);
    assert_eq!(m.next_turn(P2).unwrap(), P1);
    assert_eq!(m.state().player(P1).unwrap().turn.turn_number, 2);
}

#[test]
fn test_scry_and_search() {
    let mut m = seeded();
    let top: Vec<usize> = m.state().player(P1).unwrap().library.peek(3).iter().map(|c| c.original_index).collect();
    assert_eq!(m.scry(P1, 3).unwrap(), 3);
    m.handle_scry_decision(P1, &[2]).unwrap();
    let lib = &m.state().player(P1).unwrap().library;
    assert_eq!(lib.remaining()[0].original_index, top[2]);
    let bottom: Vec<usize> = lib.remaining().iter().rev().take(2).map(|c| c.original_index).collect();
    assert_eq!(bottom, vec![top[1], top[0]]);

    m.scry(P1, 2).unwrap();
    assert!(matches!(
        m.handle_scry_decision(P1, &[0, 0]),
        Err(GameError::InvalidScryOrder(_))
    ));
    m.close_scry(P1).unwrap();

    let found = m.search_library(P1, "angel").unwrap();
    assert!(found > 0);
    let hand = m.state().player(P1).unwrap().hand.len();
    m.select_from_search(P1, 0, SearchAction::ToHand).unwrap();
    let p = m.state().player(P1).unwrap();
    assert_eq!(p.hand.len(), hand + 1);
    assert_eq!(p.hand[0].card.name, "Serra Angel");
    assert!(!p.is_searching);
    assert_eq!(owned_cards(&m, P1), 100);
}

#[test]
fn test_zone_conservation_under_random_play() {
    let mut m = new_match(MatchConfig {
        enforce_mana_costs: false,
        ..MatchConfig::default().with_seed(77)
    });
    let mut rng = GameRng::new(Some(77));
    for _ in 0..600 {
        let p = m.state().player(P1).unwrap();
        let pick = |rng: &mut GameRng, len: usize| if len == 0 { 0 } else { rng.random_range(len) };
        let (hand, grave, exile, creatures) =
            (p.hand.len(), p.graveyard.len(), p.exile.len(), p.creatures.len());
        let permanent = p.permanents().nth(pick(&mut rng, creatures + p.lands.len())).map(|c| c.instance_id());

        let _ = match rng.random_range(16) {
            0 => m.draw_card(P1),
            1 => m.discard_card(P1, pick(&mut rng, hand)),
            2 => m.play_card(P1, pick(&mut rng, hand)),
            3 => m.exile_from_hand(P1, pick(&mut rng, hand)),
            4 => m.return_from_graveyard(P1, pick(&mut rng, grave)),
            5 => m.shuffle_from_graveyard(P1, pick(&mut rng, grave)),
            6 => m.shuffle_from_exile(P1, pick(&mut rng, exile)),
            7 => m.return_from_exile_to_battlefield(P1, pick(&mut rng, exile)).map(|_| ()),
            8 => permanent.map_or(Ok(()), |id| m.destroy_permanent(id)),
            9 => permanent.map_or(Ok(()), |id| m.bounce_permanent(id)),
            10 => m.cast_commander(P1).map(|_| ()),
            11 => m.pass_priority(),
            12 => m
                .scry(P1, 3)
                .and_then(|_| m.handle_scry_decision(P1, &[1])),
            13 => m.search_library(P1, "forest").and_then(|_| {
                m.select_from_search(P1, 0, SearchAction::ToBattlefield)
            }),
            14 => m.return_from_graveyard_to_battlefield(P1, pick(&mut rng, grave)).map(|_| ()),
            _ => m.cancel_targeting(P1),
        };
        assert_eq!(owned_cards(&m, P1), 100);
        let lib = &m.state().player(P1).unwrap().library;
        assert!(lib.cursor() <= lib.len());
    }
}

#[test]
fn test_failed_actions_leave_state_unchanged() {
    let mut m = seeded();
    let before = serde_json::to_string(m.state()).unwrap();
    assert!(m.play_card(P2, 0).is_err());
    assert!(m.declare_attacker(P1, 0).is_err());
    assert!(m.next_turn(P2).is_err());
    assert!(m.change_phase(P2, Phase::Ending).is_err());
    assert!(m.draw_multiple(P1, 500).is_err());
    assert!(m.untap_land(P1, 3).is_err());
    assert!(m.confirm_targeting(P1).is_err());
    let after = serde_json::to_string(m.state()).unwrap();
    assert_eq!(before, after);
}

use crate::card::{Card, CardCatalogue, CardKind, Deck, Keyword};
use crate::game::combat::CombatState;
use crate::game::error::{GameError, GameResult};
use crate::game::targeting::TargetingState;
use crate::game::turn::TurnState;
use crate::game::zones::{BattlefieldCard, DrawnCard, GraveyardCard, Library, ShuffledCard};
use crate::ids::{CardId, InstanceId, PlayerId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Battlefield row a permanent sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Row {
    Creatures,
    Lands,
}

/// A reserved draw waiting to be committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawHandle {
    pub player: PlayerId,
    pub count: usize,
}

/// Everything one seat owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub deck: Option<Deck>,
    pub library: Library,
    pub hand: Vec<DrawnCard>,
    /// Creatures and every other non-land permanent
    pub creatures: Vec<BattlefieldCard>,
    pub lands: Vec<BattlefieldCard>,
    pub graveyard: Vec<GraveyardCard>,
    pub exile: Vec<Card>,
    pub command_zone: Option<Card>,
    pub commander_id: Option<CardId>,
    pub tapped_creatures: BTreeSet<InstanceId>,
    pub turn: TurnState,
    pub commander_tax: u32,
    pub life: u32,
    pub combat: CombatState,
    pub targeting: TargetingState,
    pub scry_buffer: Vec<ShuffledCard>,
    pub search_results: Vec<ShuffledCard>,
    pub is_searching: bool,
    pub pending_draw: Option<DrawHandle>,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: &str, life: u32, max_hand_size: usize) -> Self {
        PlayerState {
            id,
            name: name.to_string(),
            deck: None,
            library: Library::default(),
            hand: Vec::new(),
            creatures: Vec::new(),
            lands: Vec::new(),
            graveyard: Vec::new(),
            exile: Vec::new(),
            command_zone: None,
            commander_id: None,
            tapped_creatures: BTreeSet::new(),
            turn: TurnState::new(max_hand_size),
            commander_tax: 0,
            life,
            combat: CombatState::default(),
            targeting: TargetingState::default(),
            scry_buffer: Vec::new(),
            search_results: Vec::new(),
            is_searching: false,
            pending_draw: None,
        }
    }

    /// Fill every zone from the deck: library from the non-commander cards,
    /// commander into the command zone, all other zones empty
    pub fn setup_zones(&mut self, deck: &Deck, catalogue: &CardCatalogue) {
        self.library = Library::new(deck.library_cards(catalogue));
        self.command_zone = deck.commander(catalogue);
        self.commander_id = self.command_zone.as_ref().map(|c| c.id);
        self.hand.clear();
        self.creatures.clear();
        self.lands.clear();
        self.graveyard.clear();
        self.exile.clear();
        self.tapped_creatures.clear();
        self.commander_tax = 0;
        self.combat = CombatState::default();
        self.targeting = TargetingState::default();
        self.scry_buffer.clear();
        self.search_results.clear();
        self.is_searching = false;
        self.pending_draw = None;
    }

    pub fn is_commander(&self, card: &Card) -> bool {
        self.commander_id == Some(card.id)
    }

    pub fn hand_card(&self, index: usize) -> GameResult<&DrawnCard> {
        self.hand.get(index).ok_or(GameError::IndexOutOfRange {
            zone: "hand",
            index,
        })
    }

    pub fn creature_at(&self, index: usize) -> GameResult<&BattlefieldCard> {
        self.creatures.get(index).ok_or(GameError::IndexOutOfRange {
            zone: "creatures",
            index,
        })
    }

    pub fn land_at(&self, index: usize) -> GameResult<&BattlefieldCard> {
        self.lands.get(index).ok_or(GameError::IndexOutOfRange {
            zone: "lands",
            index,
        })
    }

    pub fn find_permanent(&self, id: InstanceId) -> Option<(Row, usize)> {
        if let Some(i) = self.creatures.iter().position(|c| c.instance_id() == id) {
            return Some((Row::Creatures, i));
        }
        self.lands
            .iter()
            .position(|c| c.instance_id() == id)
            .map(|i| (Row::Lands, i))
    }

    pub fn permanent(&self, id: InstanceId) -> Option<&BattlefieldCard> {
        self.permanents().find(|c| c.instance_id() == id)
    }

    pub fn permanent_mut(&mut self, id: InstanceId) -> Option<&mut BattlefieldCard> {
        self.creatures
            .iter_mut()
            .chain(self.lands.iter_mut())
            .find(|c| c.instance_id() == id)
    }

    /// Both battlefield rows, creatures first
    pub fn permanents(&self) -> impl Iterator<Item = &BattlefieldCard> {
        self.creatures.iter().chain(self.lands.iter())
    }

    pub fn is_tapped(&self, id: InstanceId) -> bool {
        self.tapped_creatures.contains(&id) || self.turn.mana.is_land_tapped(id)
    }

    /// Entered this turn and can't ignore it
    pub fn is_summoning_sick(&self, permanent: &BattlefieldCard) -> bool {
        permanent.entered_this_turn && !permanent.card.has_keyword(Keyword::Haste)
    }

    /// Put a card onto the row its kind belongs to
    pub fn place_on_battlefield(
        &mut self,
        card: Card,
        placed_at: Timestamp,
        entered_this_turn: bool,
    ) -> InstanceId {
        let permanent = BattlefieldCard::new(card, placed_at, entered_this_turn);
        let id = permanent.instance_id();
        if permanent.card.kind == CardKind::Land {
            self.lands.push(permanent);
        } else {
            self.creatures.push(permanent);
        }
        id
    }

    /// Take a permanent off the battlefield and drop every reference to it
    /// this player holds
    pub fn remove_permanent(&mut self, id: InstanceId) -> Option<BattlefieldCard> {
        let (row, index) = self.find_permanent(id)?;
        let permanent = match row {
            Row::Creatures => self.creatures.remove(index),
            Row::Lands => self.lands.remove(index),
        };
        self.tapped_creatures.remove(&id);
        self.turn.mana.release_land(id);
        self.combat.forget(id);
        Some(permanent)
    }

    /// Untap step for this player: every permanent untaps, mana records
    /// reset, and creatures lose summoning sickness
    pub fn untap_all(&mut self) {
        self.tapped_creatures.clear();
        self.turn.mana.untap_all();
        for permanent in self.creatures.iter_mut().chain(self.lands.iter_mut()) {
            permanent.entered_this_turn = false;
        }
    }

    pub fn clear_damage(&mut self) {
        for permanent in self.creatures.iter_mut().chain(self.lands.iter_mut()) {
            permanent.damage = 0;
        }
    }

    /// Physical cards this player owns outside the stack. The drawn prefix
    /// of the library is not counted; those cards live in other zones.
    pub fn card_count(&self) -> usize {
        self.library.remaining_len()
            + self.hand.len()
            + self.creatures.len()
            + self.lands.len()
            + self.graveyard.len()
            + self.exile.len()
            + usize::from(self.command_zone.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerState {
        PlayerState::new(PlayerId(1), "Alice", 40, 7)
    }

    #[test]
    fn test_place_routes_by_kind() {
        let mut p = player();
        let forest = p.place_on_battlefield(Card::new(CardId(1), "Forest", "Basic Land — Forest", 0), 1, false);
        let ring = p.place_on_battlefield(Card::new(CardId(2), "Sol Ring", "Artifact", 1), 2, true);
        assert_eq!(p.lands.len(), 1);
        assert_eq!(p.creatures.len(), 1);
        assert_eq!(p.find_permanent(forest), Some((Row::Lands, 0)));
        assert_eq!(p.find_permanent(ring), Some((Row::Creatures, 0)));
    }

    #[test]
    fn test_remove_permanent_clears_references() {
        let mut p = player();
        let bear = p.place_on_battlefield(Card::new(CardId(3), "Bear", "Creature — Bear", 2), 5, false);
        p.tapped_creatures.insert(bear);
        p.combat.attackers.push(bear);
        let removed = p.remove_permanent(bear).unwrap();
        assert_eq!(removed.card.name, "Bear");
        assert!(p.tapped_creatures.is_empty());
        assert!(p.combat.attackers.is_empty());
        assert!(p.remove_permanent(bear).is_none());
    }

    #[test]
    fn test_summoning_sickness() {
        let mut p = player();
        let bear = Card::new(CardId(3), "Bear", "Creature — Bear", 2);
        let raider = bear.clone().with_keywords(&[Keyword::Haste]);
        p.place_on_battlefield(bear, 1, true);
        p.place_on_battlefield(raider, 2, true);
        assert!(p.is_summoning_sick(&p.creatures[0]));
        assert!(!p.is_summoning_sick(&p.creatures[1]));
        p.untap_all();
        assert!(!p.is_summoning_sick(&p.creatures[0]));
    }

    #[test]
    fn test_duplicate_copies_distinct_ids() {
        let mut p = player();
        let a = p.place_on_battlefield(Card::new(CardId(1), "Forest", "Basic Land — Forest", 0), 1, false);
        let b = p.place_on_battlefield(Card::new(CardId(1), "Forest", "Basic Land — Forest", 0), 2, false);
        assert_ne!(a, b);
        assert_eq!(p.find_permanent(b), Some((Row::Lands, 1)));
    }
}

use crate::card::Card;
use crate::game::engine::Match;
use crate::game::error::{GameError, GameResult};
use crate::ids::{InstanceId, PlayerId, Timestamp};
use crate::rng::GameRng;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A card in the library. `original_index` is unique within one library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffledCard {
    pub card: Card,
    pub original_index: usize,
}

/// A card in hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnCard {
    pub card: Card,
    pub drawn_at: Timestamp,
}

/// A permanent on the battlefield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattlefieldCard {
    pub card: Card,
    pub placed_at: Timestamp,
    pub damage: u32,
    pub entered_this_turn: bool,
}

impl BattlefieldCard {
    pub fn new(card: Card, placed_at: Timestamp, entered_this_turn: bool) -> Self {
        BattlefieldCard {
            card,
            placed_at,
            damage: 0,
            entered_this_turn,
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        InstanceId::new(self.card.id, self.placed_at)
    }
}

/// A card in the graveyard, remembering the damage it died with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraveyardCard {
    pub card: Card,
    pub discarded_at: Timestamp,
    pub damage: u32,
}

/// Where a card picked from a library search goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchAction {
    ToHand,
    ToBattlefield,
    ToTop,
}

/// Shuffled library with a draw cursor. Cards before the cursor have been
/// drawn; everything from the cursor on is still face down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    cards: Vec<ShuffledCard>,
    cursor: usize,
    next_index: usize,
}

impl Library {
    pub fn new(cards: Vec<Card>) -> Self {
        let next_index = cards.len();
        let cards = cards
            .into_iter()
            .enumerate()
            .map(|(original_index, card)| ShuffledCard {
                card,
                original_index,
            })
            .collect();
        Library {
            cards,
            cursor: 0,
            next_index,
        }
    }

    pub fn cards(&self) -> &[ShuffledCard] {
        &self.cards
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards not yet drawn, top first
    pub fn remaining(&self) -> &[ShuffledCard] {
        &self.cards[self.cursor..]
    }

    pub fn remaining_len(&self) -> usize {
        self.cards.len() - self.cursor
    }

    /// Draw `count` cards from the top. Nothing moves if there aren't enough.
    pub fn draw(&mut self, count: usize) -> GameResult<Vec<Card>> {
        let remaining = self.remaining_len();
        if count > remaining {
            return Err(GameError::LibraryExhausted {
                requested: count,
                remaining,
            });
        }
        let drawn = self.cards[self.cursor..self.cursor + count]
            .iter()
            .map(|c| c.card.clone())
            .collect();
        self.cursor += count;
        Ok(drawn)
    }

    pub fn shuffle_remaining(&mut self, rng: &mut GameRng) {
        rng.shuffle_from(&mut self.cards, self.cursor);
    }

    /// Put a card somewhere in the undrawn part, bottom included
    pub fn insert_random(&mut self, card: Card, rng: &mut GameRng) -> usize {
        let pos = rng.insert_position(self.cursor, self.cards.len());
        let original_index = self.next_index;
        self.next_index += 1;
        self.cards.insert(
            pos,
            ShuffledCard {
                card,
                original_index,
            },
        );
        original_index
    }

    fn position_undrawn(&self, original_index: usize) -> Option<usize> {
        self.cards[self.cursor..]
            .iter()
            .position(|c| c.original_index == original_index)
            .map(|p| p + self.cursor)
    }

    /// Pull an undrawn card out of the library
    pub fn take(&mut self, original_index: usize) -> Option<Card> {
        self.position_undrawn(original_index)
            .map(|pos| self.cards.remove(pos).card)
    }

    /// Move an undrawn card to the top
    pub fn move_to_top(&mut self, original_index: usize) -> bool {
        match self.position_undrawn(original_index) {
            Some(pos) => {
                let card = self.cards.remove(pos);
                self.cards.insert(self.cursor, card);
                true
            }
            None => false,
        }
    }

    pub fn peek(&self, count: usize) -> Vec<ShuffledCard> {
        self.remaining().iter().take(count).cloned().collect()
    }

    /// Put `top` on top of the library in the given order and `bottom` under
    /// everything else. Cards already drawn are skipped.
    pub fn arrange(&mut self, top: &[usize], bottom: &[usize]) {
        let mut pulled_top = Vec::new();
        for idx in top {
            if let Some(pos) = self.position_undrawn(*idx) {
                pulled_top.push(self.cards.remove(pos));
            }
        }
        let mut pulled_bottom = Vec::new();
        for idx in bottom {
            if let Some(pos) = self.position_undrawn(*idx) {
                pulled_bottom.push(self.cards.remove(pos));
            }
        }
        for (offset, card) in pulled_top.into_iter().enumerate() {
            self.cards.insert(self.cursor + offset, card);
        }
        self.cards.extend(pulled_bottom);
    }

    /// Undrawn cards whose name or type line contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Vec<ShuffledCard> {
        let term = term.to_lowercase();
        self.remaining()
            .iter()
            .filter(|c| {
                c.card.name.to_lowercase().contains(&term)
                    || c.card.type_line.to_lowercase().contains(&term)
            })
            .cloned()
            .collect()
    }
}

fn out_of_range(zone: &'static str, index: usize) -> GameError {
    GameError::IndexOutOfRange { zone, index }
}

impl Match {
    /// Discard a card from hand to the graveyard
    pub fn discard_card(&mut self, player: PlayerId, hand_index: usize) -> GameResult<()> {
        let (p, clock) = self.state.seat(player)?;
        if hand_index >= p.hand.len() {
            return Err(out_of_range("hand", hand_index));
        }
        let card = p.hand.remove(hand_index).card;
        debug!("{} discarded {}", player, card.name);
        p.graveyard.push(GraveyardCard {
            card,
            discarded_at: clock.tick(),
            damage: 0,
        });
        Ok(())
    }

    /// Exile a card straight from hand
    pub fn exile_from_hand(&mut self, player: PlayerId, hand_index: usize) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        if hand_index >= p.hand.len() {
            return Err(out_of_range("hand", hand_index));
        }
        let card = p.hand.remove(hand_index).card;
        debug!("{} exiled {} from hand", player, card.name);
        p.exile.push(card);
        Ok(())
    }

    pub fn destroy_permanent(&mut self, permanent: InstanceId) -> GameResult<()> {
        self.state.destroy_permanent(permanent)
    }

    pub fn exile_permanent(&mut self, permanent: InstanceId) -> GameResult<()> {
        self.state.exile_permanent(permanent)
    }

    pub fn bounce_permanent(&mut self, permanent: InstanceId) -> GameResult<()> {
        self.state.bounce_permanent(permanent)
    }

    /// Graveyard to the top of the hand
    pub fn return_from_graveyard(&mut self, player: PlayerId, index: usize) -> GameResult<()> {
        let (p, clock) = self.state.seat(player)?;
        if index >= p.graveyard.len() {
            return Err(out_of_range("graveyard", index));
        }
        let card = p.graveyard.remove(index).card;
        p.hand.insert(0, DrawnCard { card, drawn_at: clock.tick() });
        Ok(())
    }

    pub fn return_from_graveyard_to_battlefield(
        &mut self,
        player: PlayerId,
        index: usize,
    ) -> GameResult<InstanceId> {
        let (p, clock) = self.state.seat(player)?;
        if index >= p.graveyard.len() {
            return Err(out_of_range("graveyard", index));
        }
        let card = p.graveyard.remove(index).card;
        Ok(p.place_on_battlefield(card, clock.tick(), true))
    }

    pub fn exile_from_graveyard(&mut self, player: PlayerId, index: usize) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        if index >= p.graveyard.len() {
            return Err(out_of_range("graveyard", index));
        }
        let card = p.graveyard.remove(index).card;
        p.exile.push(card);
        Ok(())
    }

    /// Shuffle a graveyard card into the undrawn part of the library
    pub fn shuffle_from_graveyard(&mut self, player: PlayerId, index: usize) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        if index >= p.graveyard.len() {
            return Err(out_of_range("graveyard", index));
        }
        let card = p.graveyard.remove(index).card;
        p.library.insert_random(card, &mut self.rng);
        Ok(())
    }

    /// Exile to hand. Unlike other returns this appends.
    pub fn return_from_exile(&mut self, player: PlayerId, index: usize) -> GameResult<()> {
        let (p, clock) = self.state.seat(player)?;
        if index >= p.exile.len() {
            return Err(out_of_range("exile", index));
        }
        let card = p.exile.remove(index);
        p.hand.push(DrawnCard { card, drawn_at: clock.tick() });
        Ok(())
    }

    pub fn move_from_exile_to_graveyard(&mut self, player: PlayerId, index: usize) -> GameResult<()> {
        let (p, clock) = self.state.seat(player)?;
        if index >= p.exile.len() {
            return Err(out_of_range("exile", index));
        }
        let card = p.exile.remove(index);
        p.graveyard.push(GraveyardCard {
            card,
            discarded_at: clock.tick(),
            damage: 0,
        });
        Ok(())
    }

    pub fn shuffle_from_exile(&mut self, player: PlayerId, index: usize) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        if index >= p.exile.len() {
            return Err(out_of_range("exile", index));
        }
        let card = p.exile.remove(index);
        p.library.insert_random(card, &mut self.rng);
        Ok(())
    }

    pub fn return_from_exile_to_battlefield(
        &mut self,
        player: PlayerId,
        index: usize,
    ) -> GameResult<InstanceId> {
        let (p, clock) = self.state.seat(player)?;
        if index >= p.exile.len() {
            return Err(out_of_range("exile", index));
        }
        let card = p.exile.remove(index);
        Ok(p.place_on_battlefield(card, clock.tick(), true))
    }

    /// Put any card into a player's hand, enriched from the catalogue
    pub fn add_card_to_hand(&mut self, player: PlayerId, card: Card) -> GameResult<()> {
        let card = self.catalogue.enrich(card);
        let (p, clock) = self.state.seat(player)?;
        debug!("Added {} to {}'s hand", card.name, player);
        p.hand.push(DrawnCard { card, drawn_at: clock.tick() });
        Ok(())
    }

    /// Shuffle the undrawn part of the library
    pub fn shuffle_library(&mut self, player: PlayerId) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        p.library.shuffle_remaining(&mut self.rng);
        Ok(())
    }

    /// Look at the top `count` cards. Returns how many are in the scry buffer.
    pub fn scry(&mut self, player: PlayerId, count: usize) -> GameResult<usize> {
        let p = self.state.player_mut(player)?;
        p.scry_buffer = p.library.peek(count);
        Ok(p.scry_buffer.len())
    }

    /// Keep the listed scry cards on top in that order; the rest go to the
    /// bottom. An empty order bottoms everything.
    pub fn handle_scry_decision(&mut self, player: PlayerId, order: &[usize]) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        let buffered = p.scry_buffer.len();
        let mut seen = HashSet::new();
        for &i in order {
            if i >= buffered {
                return Err(GameError::InvalidScryOrder(format!(
                    "index {} out of {} cards",
                    i, buffered
                )));
            }
            if !seen.insert(i) {
                return Err(GameError::InvalidScryOrder(format!("index {} listed twice", i)));
            }
        }
        let top: Vec<usize> = order
            .iter()
            .map(|&i| p.scry_buffer[i].original_index)
            .collect();
        let bottom: Vec<usize> = p
            .scry_buffer
            .iter()
            .enumerate()
            .filter(|(i, _)| !seen.contains(i))
            .map(|(_, c)| c.original_index)
            .collect();
        debug!("{} scried {} to top, {} to bottom", player, top.len(), bottom.len());
        p.library.arrange(&top, &bottom);
        p.scry_buffer.clear();
        Ok(())
    }

    pub fn close_scry(&mut self, player: PlayerId) -> GameResult<()> {
        self.state.player_mut(player)?.scry_buffer.clear();
        Ok(())
    }

    /// Search the undrawn library. Returns the number of matches.
    pub fn search_library(&mut self, player: PlayerId, term: &str) -> GameResult<usize> {
        let p = self.state.player_mut(player)?;
        p.search_results = p.library.search(term);
        p.is_searching = true;
        Ok(p.search_results.len())
    }

    /// Act on one search result and close the search
    pub fn select_from_search(
        &mut self,
        player: PlayerId,
        result_index: usize,
        action: SearchAction,
    ) -> GameResult<()> {
        let (p, clock) = self.state.seat(player)?;
        let original_index = p
            .search_results
            .get(result_index)
            .map(|c| c.original_index)
            .ok_or_else(|| out_of_range("search results", result_index))?;
        match action {
            SearchAction::ToHand => {
                let card = p
                    .library
                    .take(original_index)
                    .ok_or_else(|| GameError::CardNotFound(original_index.to_string()))?;
                p.hand.insert(0, DrawnCard { card, drawn_at: clock.tick() });
            }
            SearchAction::ToBattlefield => {
                let card = p
                    .library
                    .take(original_index)
                    .ok_or_else(|| GameError::CardNotFound(original_index.to_string()))?;
                p.place_on_battlefield(card, clock.tick(), true);
            }
            SearchAction::ToTop => {
                if !p.library.move_to_top(original_index) {
                    warn!("Search result {} is no longer in the library", original_index);
                }
            }
        }
        p.search_results.clear();
        p.is_searching = false;
        debug!("{} took search result {} {:?}", player, original_index, action);
        Ok(())
    }

    pub fn close_search(&mut self, player: PlayerId) -> GameResult<()> {
        let p = self.state.player_mut(player)?;
        p.search_results.clear();
        p.is_searching = false;
        Ok(())
    }
}

// This file is part of brackets.
//
// brackets is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// brackets is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{collections::BTreeSet, fmt, ops::Range};

use chrono::Utc;
use rustc_hash::FxHashSet;

use crate::{
    Id,
    competitor::Competitor,
    error::BracketError,
    matches::Match,
    node_id::{MAX_LEVELS, NodeId, Slot},
};

/// A complete single elimination bracket.
///
/// Every match lives in one arena indexed by [`NodeId`], so the tree never
/// stores parent or child links: they follow from the numbering.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BracketTree {
    levels: u32,
    arena: Vec<Match>,
}

impl BracketTree {
    /// Builds an empty bracket with `levels` rounds.
    ///
    /// # Errors
    ///
    /// If `levels` is `0` or larger than [`MAX_LEVELS`].
    pub fn new(levels: u32) -> Result<Self, BracketError> {
        if levels == 0 || levels > MAX_LEVELS {
            return Err(BracketError::argument(format!(
                "a bracket needs between 1 and {MAX_LEVELS} levels, not {levels}"
            )));
        }

        let arena = (1..1_u32 << levels).map(|id| Match::new(NodeId(id))).collect();

        Ok(Self { levels, arena })
    }

    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// How many competitors the first round holds.
    #[must_use]
    pub fn seats(&self) -> usize {
        1 << self.levels
    }

    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&Match> {
        if node.within(self.levels) {
            self.arena.get(node.arena_index())
        } else {
            None
        }
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Match> {
        if node.within(self.levels) {
            self.arena.get_mut(node.arena_index())
        } else {
            None
        }
    }

    /// Every match, the final first.
    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.arena
    }

    #[must_use]
    pub fn champion(&self) -> Option<&Competitor> {
        self.get(NodeId::FINAL)?.winner.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.champion().is_some()
    }

    fn level_range(&self, level: u32) -> Range<usize> {
        let depth = self.levels - 1 - level;
        (1 << depth) - 1..(1 << (depth + 1)) - 1
    }

    fn is_leaf(&self, node: NodeId) -> bool {
        node.depth() + 1 == self.levels
    }

    /// The matches of one round, left to right.
    ///
    /// # Errors
    ///
    /// If `level` is not below [`BracketTree::levels`].
    pub fn all_matches_at_level(&self, level: u32) -> Result<&[Match], BracketError> {
        if level >= self.levels {
            return Err(BracketError::argument(format!(
                "level {level} is outside a bracket of {} levels",
                self.levels
            )));
        }

        Ok(&self.arena[self.level_range(level)])
    }

    /// Clears the bracket and pairs `ordered[2i]` with `ordered[2i + 1]` in
    /// first round match `i`.
    ///
    /// # Errors
    ///
    /// If `ordered` does not hold exactly [`BracketTree::seats`] competitors.
    pub fn seed_leaves(&mut self, ordered: &[Competitor]) -> Result<(), BracketError> {
        if ordered.len() != self.seats() {
            return Err(BracketError::argument(format!(
                "seeding {} levels takes {} competitors, not {}",
                self.levels,
                self.seats(),
                ordered.len()
            )));
        }

        for game in &mut self.arena {
            *game = Match::new(game.node_id);
        }

        let leaves = self.level_range(0);
        for (game, pair) in self.arena[leaves].iter_mut().zip(ordered.chunks_exact(2)) {
            if let [a, b] = pair {
                game.slot_a = Some(a.clone());
                game.slot_b = Some(b.clone());
            }
        }

        Ok(())
    }

    /// A slot is dead when nothing but a bye can ever occupy it.
    fn slot_is_dead(&self, node: NodeId, slot: Slot) -> bool {
        let Some(game) = self.get(node) else {
            return false;
        };

        match game.slot(slot) {
            Some(competitor) => competitor.bye,
            None => !self.is_leaf(node) && self.is_dead(node.child(slot)),
        }
    }

    fn is_dead(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|game| !game.is_decided())
            && self.slot_is_dead(node, Slot::A)
            && self.slot_is_dead(node, Slot::B)
    }

    /// Gives the match to a lone real competitor facing a dead slot.
    fn decide_by_bye(&mut self, node: NodeId) -> bool {
        let Some(game) = self.get(node) else {
            return false;
        };

        if game.is_decided() {
            return false;
        }

        let lone = match (&game.slot_a, &game.slot_b) {
            (Some(a), _) if a.is_real() && self.slot_is_dead(node, Slot::B) => a.clone(),
            (_, Some(b)) if b.is_real() && self.slot_is_dead(node, Slot::A) => b.clone(),
            _ => return false,
        };

        self.get_mut(node)
            .is_some_and(|game| game.declare_winner(lone, Utc::now()).is_ok())
    }

    /// Copies a winner into the empty parent slot it feeds.
    fn advance(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = node.parent()?;
        let winner = self.get(node)?.winner.clone()?;
        let slot = self.get_mut(parent)?.slot_mut(node.side());

        if slot.is_some() {
            return None;
        }

        *slot = Some(winner);
        Some(parent)
    }

    /// Decides every match a bye settles and advances every winner, until
    /// nothing changes. Returns the changed matches in id order.
    ///
    /// Rounds are visited from the first to the final and each round from
    /// left to right.
    pub fn resolve_byes_and_advance(&mut self) -> Vec<NodeId> {
        let mut changed = BTreeSet::new();

        loop {
            let mut progressed = false;

            for level in 0..self.levels {
                for index in self.level_range(level) {
                    let node = self.arena[index].node_id;

                    if self.decide_by_bye(node) {
                        changed.insert(node);
                        progressed = true;
                    }

                    if let Some(parent) = self.advance(node) {
                        changed.insert(parent);
                        progressed = true;
                    }
                }
            }

            if !progressed {
                break;
            }
        }

        changed.into_iter().collect()
    }

    /// Records that the competitor with `winner_id` won match `node`, moves
    /// them up and lets any byes waiting above settle. Returns the changed
    /// matches, `node` first.
    ///
    /// # Errors
    ///
    /// If the match does not exist, is not between two real competitors, is
    /// already decided, or `winner_id` is not playing in it. Nothing changes
    /// on error.
    pub fn record_result(
        &mut self,
        node: NodeId,
        winner_id: Id,
    ) -> Result<Vec<NodeId>, BracketError> {
        let game = self.get(node).ok_or(BracketError::NotFound(node))?;

        if !game.is_playable() {
            return Err(BracketError::state(format!(
                "match {node} is not between two competitors"
            )));
        }

        if game.is_decided() {
            return Err(BracketError::state(format!(
                "match {node} already has a winner"
            )));
        }

        let winner = [&game.slot_a, &game.slot_b]
            .into_iter()
            .flatten()
            .find(|competitor| competitor.id == Some(winner_id))
            .cloned()
            .ok_or_else(|| {
                BracketError::state(format!(
                    "competitor {winner_id} is not playing in match {node}"
                ))
            })?;

        self.get_mut(node)
            .ok_or(BracketError::NotFound(node))?
            .declare_winner(winner, Utc::now())?;

        let mut changed = vec![node];
        let mut current = node;

        while let Some(parent) = self.advance(current) {
            changed.push(parent);

            if !self.decide_by_bye(parent) {
                break;
            }

            current = parent;
        }

        Ok(changed)
    }

    /// Every match, each carrying the node id that places it.
    #[must_use]
    pub fn flatten(&self) -> Vec<Match> {
        self.arena.clone()
    }

    /// Rebuilds a bracket from matches in any order. Positions without a
    /// match stay empty, then one resolve pass restores anything derivable.
    ///
    /// # Errors
    ///
    /// If `levels` is invalid, a node id is out of range or repeated, or a
    /// match names a winner that is not playing in it.
    pub fn reconstruct(levels: u32, flat: Vec<Match>) -> Result<Self, BracketError> {
        let mut tree = Self::new(levels)?;
        let mut placed = FxHashSet::default();

        for game in flat {
            let node = game.node_id;

            if !node.within(levels) {
                return Err(BracketError::argument(format!(
                    "match {node} does not fit in a bracket of {levels} levels"
                )));
            }

            if !placed.insert(node) {
                return Err(BracketError::argument(format!(
                    "match {node} appears more than once"
                )));
            }

            game.check()?;
            tree.arena[node.arena_index()] = game;
        }

        tree.resolve_byes_and_advance();
        Ok(tree)
    }

    /// # Errors
    ///
    /// If the match does not exist.
    pub fn assign_storage_id(&mut self, node: NodeId, id: Id) -> Result<(), BracketError> {
        self.get_mut(node)
            .ok_or(BracketError::NotFound(node))?
            .storage_id = Some(id);

        Ok(())
    }
}

/// "Final", "Semifinal" and "Quarterfinal" for the last rounds, "Round N" before.
#[must_use]
pub fn round_name(level: u32, levels: u32) -> String {
    match levels.saturating_sub(level) {
        1 => "Final".to_string(),
        2 => "Semifinal".to_string(),
        3 => "Quarterfinal".to_string(),
        _ => format!("Round {}", level + 1),
    }
}

impl fmt::Display for BracketTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in 0..self.levels {
            writeln!(f, "{}:", round_name(level, self.levels))?;

            for game in &self.arena[self.level_range(level)] {
                writeln!(f, "  {game}")?;
            }
        }

        Ok(())
    }
}

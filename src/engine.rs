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

use std::collections::BTreeSet;

use log::debug;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;

use crate::{
    Id,
    competitor::Competitor,
    error::BracketError,
    matches::Match,
    node_id::{MAX_LEVELS, NodeId},
    storage::StoredMatch,
    tree::BracketTree,
};

/// Told about every match the engine changes.
pub trait BracketObserver {
    fn match_changed(&self, bracket_match: &Match);
}

/// Reports changes through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl BracketObserver for LogObserver {
    fn match_changed(&self, bracket_match: &Match) {
        debug!("match changed: {bracket_match}");
    }
}

/// What [`BracketEngine::create_bracket`] hands back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreatedBracket {
    pub tree: BracketTree,
    /// The shuffled and padded field, in seeding order.
    pub competitors: Vec<Competitor>,
    /// Every match seeding or bye resolution touched, in node order.
    pub pending: Vec<Match>,
}

/// Builds brackets from a field of competitors and rebuilds them from
/// storage.
#[derive(Default)]
pub struct BracketEngine {
    observer: Option<Box<dyn BracketObserver>>,
}

impl BracketEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_observer(observer: impl BracketObserver + 'static) -> Self {
        Self {
            observer: Some(Box::new(observer)),
        }
    }

    fn notify<'a>(&self, matches: impl IntoIterator<Item = &'a Match>) {
        if let Some(observer) = &self.observer {
            for bracket_match in matches {
                observer.match_changed(bracket_match);
            }
        }
    }

    /// The fewest rounds that seat `count` competitors, never less than one.
    ///
    /// # Errors
    ///
    /// If `count` is `0` or needs more than [`MAX_LEVELS`] rounds.
    pub fn compute_levels(count: usize) -> Result<u32, BracketError> {
        if count == 0 {
            return Err(BracketError::argument(
                "a bracket needs at least one competitor",
            ));
        }

        match count.checked_next_power_of_two() {
            Some(seats) if seats.trailing_zeros() <= MAX_LEVELS => {
                Ok(seats.trailing_zeros().max(1))
            }
            _ => Err(BracketError::argument(format!(
                "{count} competitors need more than {MAX_LEVELS} levels"
            ))),
        }
    }

    /// Shuffles a copy of `competitors` with `shuffle`, then inserts byes at
    /// positions `0, 2, 4, ...` until the field fills the first round.
    ///
    /// # Errors
    ///
    /// If `competitors` is empty or too large.
    pub fn pad_and_shuffle<F>(
        competitors: &[Competitor],
        shuffle: F,
    ) -> Result<Vec<Competitor>, BracketError>
    where
        F: FnOnce(&mut [Competitor]),
    {
        let levels = Self::compute_levels(competitors.len())?;
        let mut padded = competitors.to_vec();
        shuffle(&mut padded);

        let byes = (1 << levels) - padded.len();
        for position in (0..byes).map(|bye| bye * 2) {
            padded.insert(position, Competitor::bye());
        }

        Ok(padded)
    }

    /// # Errors
    ///
    /// If `competitors` is empty or too large.
    pub fn create_bracket<F>(
        &self,
        competitors: &[Competitor],
        shuffle: F,
    ) -> Result<CreatedBracket, BracketError>
    where
        F: FnOnce(&mut [Competitor]),
    {
        let order = Self::pad_and_shuffle(competitors, shuffle)?;
        self.seed_bracket(order)
    }

    /// Builds a bracket from a field that is already shuffled and padded.
    ///
    /// # Errors
    ///
    /// If the length of `order` is not a power of two.
    pub fn seed_bracket(&self, order: Vec<Competitor>) -> Result<CreatedBracket, BracketError> {
        let levels = Self::compute_levels(order.len())?;
        let mut tree = BracketTree::new(levels)?;
        tree.seed_leaves(&order)?;

        let mut touched: BTreeSet<NodeId> = tree
            .all_matches_at_level(0)?
            .iter()
            .map(|game| game.node_id)
            .collect();
        touched.extend(tree.resolve_byes_and_advance());

        let pending: Vec<Match> = touched
            .into_iter()
            .filter_map(|node| tree.get(node).cloned())
            .collect();
        self.notify(&pending);

        Ok(CreatedBracket {
            tree,
            competitors: order,
            pending,
        })
    }

    /// Rebuilds a bracket from what storage kept. The field is expected to be
    /// padded already, so nothing is shuffled or padded.
    ///
    /// # Errors
    ///
    /// If the field does not fill `levels` rounds, a match names a competitor
    /// that is not in the field, or the matches do not fit the bracket.
    pub fn rebuild_bracket(
        &self,
        levels: u32,
        competitors: &[Competitor],
        matches: &[StoredMatch],
    ) -> Result<BracketTree, BracketError> {
        let seats = 1_usize.checked_shl(levels).unwrap_or_default();
        if competitors.len() != seats {
            return Err(BracketError::argument(format!(
                "a bracket of {levels} levels seats {seats} competitors, not {}",
                competitors.len()
            )));
        }

        let by_id: FxHashMap<Id, Competitor> = competitors
            .iter()
            .filter_map(|competitor| Some((competitor.id?, competitor.clone())))
            .collect();

        let flat = matches
            .iter()
            .map(|stored| stored.hydrate(&by_id))
            .collect::<Result<Vec<_>, _>>()?;

        BracketTree::reconstruct(levels, flat)
    }

    /// [`BracketTree::record_result`], reporting every change.
    ///
    /// # Errors
    ///
    /// See [`BracketTree::record_result`].
    pub fn record_result(
        &self,
        tree: &mut BracketTree,
        node: NodeId,
        winner_id: Id,
    ) -> Result<Vec<NodeId>, BracketError> {
        let changed = tree.record_result(node, winner_id)?;
        self.notify(changed.iter().filter_map(|node| tree.get(*node)));
        Ok(changed)
    }
}

/// The shuffle used outside of tests.
pub fn random_shuffle(competitors: &mut [Competitor]) {
    competitors.shuffle(&mut rand::rng());
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::node_id::Slot;

    fn field(count: u64) -> Vec<Competitor> {
        (1..=count)
            .map(|id| Competitor::with_id(id, &format!("player-{id}")))
            .collect()
    }

    fn keep_order(_: &mut [Competitor]) {}

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<NodeId>>>);

    impl BracketObserver for Recorder {
        fn match_changed(&self, bracket_match: &Match) {
            self.0.borrow_mut().push(bracket_match.node_id);
        }
    }

    #[test]
    fn compute_levels() {
        assert!(matches!(
            BracketEngine::compute_levels(0),
            Err(BracketError::InvalidArgument(_))
        ));

        let expected = [(1, 1), (2, 1), (3, 2), (4, 2), (5, 3), (8, 3), (9, 4)];
        for (count, levels) in expected {
            assert_eq!(BracketEngine::compute_levels(count), Ok(levels), "{count}");
        }

        assert!(BracketEngine::compute_levels(1 << MAX_LEVELS).is_ok());
        assert!(BracketEngine::compute_levels((1 << MAX_LEVELS) + 1).is_err());
    }

    #[test]
    fn compute_levels_is_tight() -> anyhow::Result<()> {
        for count in 2..=2_048_usize {
            let levels = BracketEngine::compute_levels(count)?;
            assert!(1 << levels >= count);
            assert!(count > 1 << (levels - 1));
        }

        Ok(())
    }

    #[test]
    fn exact_powers_of_two_get_no_byes() -> anyhow::Result<()> {
        for count in [2, 4, 8, 16, 32] {
            let padded = BracketEngine::pad_and_shuffle(&field(count), keep_order)?;
            assert_eq!(padded, field(count));
        }

        Ok(())
    }

    #[test]
    fn padding() -> anyhow::Result<()> {
        for count in 1..=40 {
            let competitors = field(count);
            let padded = BracketEngine::pad_and_shuffle(&competitors, keep_order)?;
            let levels = BracketEngine::compute_levels(competitors.len())?;

            assert_eq!(padded.len(), 1 << levels);
            assert_eq!(
                padded.iter().filter(|competitor| competitor.bye).count(),
                padded.len() - competitors.len()
            );
            for competitor in &competitors {
                assert!(padded.contains(competitor));
            }
            for pair in padded.chunks_exact(2) {
                assert!(pair.iter().any(Competitor::is_real), "{count}: {pair:?}");
            }
        }

        Ok(())
    }

    #[test]
    fn byes_go_every_other_slot() -> anyhow::Result<()> {
        let padded = BracketEngine::pad_and_shuffle(&field(5), keep_order)?;
        let byes: Vec<bool> = padded.iter().map(|competitor| competitor.bye).collect();

        assert_eq!(
            byes,
            [true, false, true, false, true, false, false, false]
        );

        Ok(())
    }

    #[test]
    fn shuffle_comes_before_padding() -> anyhow::Result<()> {
        let padded = BracketEngine::pad_and_shuffle(&field(3), |competitors| {
            competitors.reverse();
        })?;

        let names: Vec<String> = padded.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["bye", "player-3 (3)", "player-2 (2)", "player-1 (1)"]);

        Ok(())
    }

    #[test]
    fn create_bracket_needs_competitors() {
        let engine = BracketEngine::new();
        assert!(matches!(
            engine.create_bracket(&[], keep_order),
            Err(BracketError::InvalidArgument(_))
        ));
    }

    #[test]
    fn seed_bracket_needs_a_padded_field() {
        let engine = BracketEngine::new();
        assert!(matches!(
            engine.seed_bracket(field(3)),
            Err(BracketError::InvalidArgument(_))
        ));
    }

    #[test]
    fn create_bracket_shape() -> anyhow::Result<()> {
        let engine = BracketEngine::new();

        for count in 1..=20 {
            let created = engine.create_bracket(&field(count), keep_order)?;
            let tree = &created.tree;

            for game in tree.all_matches_at_level(0)? {
                assert!(game.slot_a.is_some() && game.slot_b.is_some());
            }

            for level in 1..tree.levels() {
                for game in tree.all_matches_at_level(level)? {
                    for (slot, child) in [
                        (&game.slot_a, game.node_id.child(Slot::A)),
                        (&game.slot_b, game.node_id.child(Slot::B)),
                    ] {
                        if let Some(competitor) = slot {
                            let child = tree.get(child).and_then(|game| game.winner.as_ref());
                            assert_eq!(Some(competitor), child);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    #[test]
    fn single_competitor_wins_outright() -> anyhow::Result<()> {
        let created = BracketEngine::new().create_bracket(&field(1), keep_order)?;

        assert_eq!(created.tree.levels(), 1);
        assert_eq!(created.competitors.len(), 2);
        assert_eq!(created.tree.champion(), field(1).first());

        Ok(())
    }

    #[test]
    fn pending_covers_every_touched_match() -> anyhow::Result<()> {
        let created = BracketEngine::new().create_bracket(&field(3), keep_order)?;
        let pending: Vec<NodeId> = created.pending.iter().map(|game| game.node_id).collect();

        // [bye, 1, 2, 3]: player 1 gets a bye into the final.
        assert_eq!(pending, [NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(
            created.tree.get(NodeId::FINAL).and_then(|game| game.slot_a.clone()),
            field(1).first().cloned()
        );

        Ok(())
    }

    #[test]
    fn observer_hears_about_changes() -> anyhow::Result<()> {
        let recorder = Recorder::default();
        let engine = BracketEngine::with_observer(recorder.clone());

        let mut created = engine.create_bracket(&field(4), keep_order)?;
        assert_eq!(*recorder.0.borrow(), [NodeId(2), NodeId(3)]);

        recorder.0.borrow_mut().clear();
        engine.record_result(&mut created.tree, NodeId(3), 4)?;
        assert_eq!(*recorder.0.borrow(), [NodeId(3), NodeId(1)]);

        Ok(())
    }

    #[test]
    fn rebuild_checks_the_field() -> anyhow::Result<()> {
        let engine = BracketEngine::new();

        assert!(matches!(
            engine.rebuild_bracket(2, &field(3), &[]),
            Err(BracketError::InvalidArgument(_))
        ));

        let stranger = StoredMatch {
            storage_id: 1,
            node_id: NodeId(2),
            slot_a: Some(99),
            ..StoredMatch::default()
        };
        assert!(matches!(
            engine.rebuild_bracket(2, &field(4), &[stranger]),
            Err(BracketError::InvalidArgument(_))
        ));

        let empty = engine.rebuild_bracket(2, &field(4), &[])?;
        assert_eq!(empty, BracketTree::new(2)?);

        Ok(())
    }
}

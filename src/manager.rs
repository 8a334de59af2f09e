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

use log::{debug, info};

use crate::{
    Id,
    competitor::Competitor,
    engine::BracketEngine,
    error::BracketError,
    matches::Match,
    node_id::NodeId,
    storage::Storage,
    tree::BracketTree,
};

/// Runs a bracket against a storage collaborator: every change the engine
/// makes is saved before the call returns.
pub struct BracketManager<S: Storage> {
    engine: BracketEngine,
    storage: S,
}

impl<S: Storage> BracketManager<S> {
    #[must_use]
    pub fn new(engine: BracketEngine, storage: S) -> Self {
        Self { engine, storage }
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Replaces whatever is stored with a new bracket for `competitors`.
    ///
    /// # Errors
    ///
    /// If `competitors` is empty or too large, or storage fails.
    pub fn create_bracket<F>(
        &mut self,
        competitors: &[Competitor],
        shuffle: F,
    ) -> anyhow::Result<BracketTree>
    where
        F: FnOnce(&mut [Competitor]),
    {
        let mut order = BracketEngine::pad_and_shuffle(competitors, shuffle)?;

        self.storage.clear_all()?;
        self.storage.save_competitors(&mut order)?;
        info!("saved {} competitors", order.len());

        let created = self.engine.seed_bracket(order)?;
        let pending: Vec<NodeId> = created.pending.iter().map(|game| game.node_id).collect();
        let mut tree = created.tree;
        self.save_matches(&mut tree, &pending)?;

        Ok(tree)
    }

    /// Rebuilds the stored bracket, `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// If storage fails or what it holds does not form a bracket.
    pub fn load_bracket(&mut self) -> anyhow::Result<Option<BracketTree>> {
        let count = self.storage.competitor_count()?;
        if count == 0 {
            return Ok(None);
        }

        let levels = BracketEngine::compute_levels(count)?;
        let competitors = self.storage.read_competitors()?;
        let matches = self.storage.read_all_matches()?;
        debug!("read {count} competitors and {} matches", matches.len());

        Ok(Some(self.engine.rebuild_bracket(
            levels,
            &competitors,
            &matches,
        )?))
    }

    /// # Errors
    ///
    /// If the engine refuses the result or storage fails.
    pub fn record_result(
        &mut self,
        tree: &mut BracketTree,
        node: NodeId,
        winner_id: Id,
    ) -> anyhow::Result<Vec<NodeId>> {
        let changed = self.engine.record_result(tree, node, winner_id)?;
        info!("match {node} won by competitor {winner_id}");

        self.save_matches(tree, &changed)?;
        Ok(changed)
    }

    /// # Errors
    ///
    /// If storage fails.
    pub fn save_all_matches(&mut self, tree: &mut BracketTree) -> anyhow::Result<()> {
        let nodes: Vec<NodeId> = tree.matches().iter().map(|game| game.node_id).collect();
        self.save_matches(tree, &nodes)
    }

    /// # Errors
    ///
    /// If storage fails.
    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.storage.clear_all()?;
        info!("cleared all competitors and matches");
        Ok(())
    }

    /// Creates the matches storage has never seen, then updates them all.
    fn save_matches(&mut self, tree: &mut BracketTree, nodes: &[NodeId]) -> anyhow::Result<()> {
        for node in nodes {
            let game = tree.get(*node).ok_or(BracketError::NotFound(*node))?;

            if game.storage_id.is_none() {
                let id = self.storage.create_match(game)?;
                tree.assign_storage_id(*node, id)?;
                debug!("created match {node} with id {id}");
            }
        }

        let games: Vec<Match> = nodes
            .iter()
            .filter_map(|node| tree.get(*node).cloned())
            .collect();

        self.storage.update_matches(&games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn field(names: &[&str]) -> Vec<Competitor> {
        names.iter().map(|name| Competitor::new(name)).collect()
    }

    #[test]
    fn create_saves_the_padded_field() -> anyhow::Result<()> {
        let mut manager = BracketManager::new(BracketEngine::new(), MemoryStorage::default());
        let tree = manager.create_bracket(&field(&["ada", "grace", "linus"]), |_| {})?;

        let competitors = manager.storage().read_competitors()?;
        assert_eq!(competitors.len(), 4);
        assert!(competitors.iter().all(|competitor| competitor.id.is_some()));
        assert!(competitors.first().is_some_and(|competitor| competitor.bye));

        let stored = manager.storage().read_all_matches()?;
        assert_eq!(stored.len(), 3);
        assert!(tree.matches().iter().all(|game| game.storage_id.is_some()));

        Ok(())
    }

    #[test]
    fn create_replaces_the_old_bracket() -> anyhow::Result<()> {
        let mut manager = BracketManager::new(BracketEngine::new(), MemoryStorage::default());
        manager.create_bracket(&field(&["ada", "grace", "linus"]), |_| {})?;
        manager.create_bracket(&field(&["ada", "grace"]), |_| {})?;

        assert_eq!(manager.storage().competitor_count()?, 2);
        assert_eq!(manager.storage().read_all_matches()?.len(), 1);

        Ok(())
    }

    #[test]
    fn create_refuses_an_empty_field() {
        let mut manager = BracketManager::new(BracketEngine::new(), MemoryStorage::default());
        let error = manager.create_bracket(&[], |_| {});

        assert!(matches!(
            error.map_err(|error| error.downcast::<BracketError>()),
            Err(Ok(BracketError::InvalidArgument(_)))
        ));
    }

    #[test]
    fn load_nothing() -> anyhow::Result<()> {
        let mut manager = BracketManager::new(BracketEngine::new(), MemoryStorage::default());
        assert_eq!(manager.load_bracket()?, None);
        Ok(())
    }

    #[test]
    fn results_are_saved() -> anyhow::Result<()> {
        let mut manager = BracketManager::new(BracketEngine::new(), MemoryStorage::default());
        let field = field(&["ada", "grace", "linus", "ken"]);
        let mut tree = manager.create_bracket(&field, |_| {})?;

        // Only the first round was stored at creation.
        assert_eq!(manager.storage().read_all_matches()?.len(), 2);

        manager.record_result(&mut tree, NodeId(2), 1)?;
        let stored = manager.storage().read_all_matches()?;
        assert_eq!(stored.len(), 3);
        assert!(
            stored
                .iter()
                .any(|game| game.node_id == NodeId::FINAL && game.slot_a == Some(1))
        );

        assert_eq!(manager.load_bracket()?, Some(tree));

        Ok(())
    }

    #[test]
    fn clear() -> anyhow::Result<()> {
        let mut manager = BracketManager::new(BracketEngine::new(), MemoryStorage::default());
        manager.create_bracket(&field(&["ada", "grace"]), |_| {})?;
        manager.clear()?;

        assert_eq!(manager.load_bracket()?, None);
        Ok(())
    }
}

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

use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    Id, competitor::Competitor, error::BracketError, matches::Match, node_id::NodeId,
};

/// Where competitors and matches are kept between runs.
pub trait Storage {
    /// Saves `competitors` in order and assigns each one an id.
    ///
    /// # Errors
    ///
    /// If the write fails.
    fn save_competitors(&mut self, competitors: &mut [Competitor]) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// If the read fails.
    fn read_competitors(&self) -> anyhow::Result<Vec<Competitor>>;

    /// # Errors
    ///
    /// If the read fails.
    fn competitor_count(&self) -> anyhow::Result<usize>;

    /// Saves a new match and returns its storage id.
    ///
    /// # Errors
    ///
    /// If a competitor in the match was never saved, or the write fails.
    fn create_match(&mut self, game: &Match) -> anyhow::Result<Id>;

    /// Inserts or replaces each match by its storage id.
    ///
    /// # Errors
    ///
    /// If a match has no storage id, a competitor in it was never saved, or
    /// the write fails.
    fn update_matches(&mut self, games: &[Match]) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// If the read fails.
    fn read_all_matches(&self) -> anyhow::Result<Vec<StoredMatch>>;

    /// # Errors
    ///
    /// If the write fails.
    fn clear_all(&mut self) -> anyhow::Result<()>;
}

/// A match as storage keeps it: competitors by id only.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StoredMatch {
    pub storage_id: Id,
    pub node_id: NodeId,
    #[serde(default)]
    pub slot_a: Option<Id>,
    #[serde(default)]
    pub slot_b: Option<Id>,
    #[serde(default)]
    pub winner: Option<Id>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

fn saved_id(node: NodeId, competitor: Option<&Competitor>) -> anyhow::Result<Option<Id>> {
    competitor
        .map(|competitor| {
            competitor.id.ok_or_else(|| {
                anyhow::Error::msg(format!("match {node}: {competitor} was never saved"))
            })
        })
        .transpose()
}

impl StoredMatch {
    /// # Errors
    ///
    /// If a competitor in `game` has no id.
    pub fn new(storage_id: Id, game: &Match) -> anyhow::Result<Self> {
        let node = game.node_id;

        Ok(Self {
            storage_id,
            node_id: node,
            slot_a: saved_id(node, game.slot_a.as_ref())?,
            slot_b: saved_id(node, game.slot_b.as_ref())?,
            winner: saved_id(node, game.winner.as_ref())?,
            completed_at: game.completed_at,
        })
    }

    /// Swaps the competitor ids back for the competitors themselves.
    ///
    /// # Errors
    ///
    /// If an id is missing from `competitors`.
    pub fn hydrate(&self, competitors: &FxHashMap<Id, Competitor>) -> Result<Match, BracketError> {
        let find = |id: Option<Id>| {
            id.map(|id| {
                competitors.get(&id).cloned().ok_or_else(|| {
                    BracketError::argument(format!(
                        "match {}: there is no competitor {id}",
                        self.node_id
                    ))
                })
            })
            .transpose()
        };

        Ok(Match {
            node_id: self.node_id,
            slot_a: find(self.slot_a)?,
            slot_b: find(self.slot_b)?,
            winner: find(self.winner)?,
            completed_at: self.completed_at,
            storage_id: Some(self.storage_id),
        })
    }
}

/// Everything a bracket stores, in the shape it is written to disk.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Records {
    #[serde(default)]
    last_id: Id,
    #[serde(default)]
    competitors: Vec<Competitor>,
    #[serde(default)]
    matches: Vec<StoredMatch>,
}

impl Records {
    fn next_id(&mut self) -> Id {
        self.last_id += 1;
        self.last_id
    }

    fn save_competitors(&mut self, competitors: &mut [Competitor]) {
        for competitor in competitors {
            competitor.id = Some(self.next_id());
            self.competitors.push(competitor.clone());
        }
    }

    fn create_match(&mut self, game: &Match) -> anyhow::Result<Id> {
        let mut stored = StoredMatch::new(0, game)?;
        stored.storage_id = self.next_id();

        let id = stored.storage_id;
        self.matches.push(stored);
        Ok(id)
    }

    fn update_matches(&mut self, games: &[Match]) -> anyhow::Result<()> {
        let updates = games
            .iter()
            .map(|game| {
                let id = game.storage_id.ok_or_else(|| {
                    anyhow::Error::msg(format!("match {} was never created", game.node_id))
                })?;
                StoredMatch::new(id, game)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        for update in updates {
            if let Some(stored) = self
                .matches
                .iter_mut()
                .find(|stored| stored.storage_id == update.storage_id)
            {
                *stored = update;
            } else {
                self.matches.push(update);
            }
        }

        Ok(())
    }

    fn clear_all(&mut self) {
        self.competitors.clear();
        self.matches.clear();
    }
}

/// Keeps everything in memory, for tests and for embedding.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryStorage(pub Records);

impl Storage for MemoryStorage {
    fn save_competitors(&mut self, competitors: &mut [Competitor]) -> anyhow::Result<()> {
        self.0.save_competitors(competitors);
        Ok(())
    }

    fn read_competitors(&self) -> anyhow::Result<Vec<Competitor>> {
        Ok(self.0.competitors.clone())
    }

    fn competitor_count(&self) -> anyhow::Result<usize> {
        Ok(self.0.competitors.len())
    }

    fn create_match(&mut self, game: &Match) -> anyhow::Result<Id> {
        self.0.create_match(game)
    }

    fn update_matches(&mut self, games: &[Match]) -> anyhow::Result<()> {
        self.0.update_matches(games)
    }

    fn read_all_matches(&self) -> anyhow::Result<Vec<StoredMatch>> {
        Ok(self.0.matches.clone())
    }

    fn clear_all(&mut self) -> anyhow::Result<()> {
        self.0.clear_all();
        Ok(())
    }
}

/// Keeps everything in one RON file, rewritten after every change.
#[derive(Clone, Debug)]
pub struct RonStorage {
    path: PathBuf,
    records: Records,
}

impl RonStorage {
    /// Opens the file at `path`. A missing file is an empty bracket.
    ///
    /// # Errors
    ///
    /// If the file can't be read or isn't valid RON.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let records = match fs::read_to_string(path) {
            Ok(string) => match ron::from_str(string.as_str()) {
                Ok(records) => records,
                Err(err) => {
                    return Err(anyhow::Error::msg(format!(
                        "RON: {}: {err}",
                        path.display(),
                    )));
                }
            },
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Records::default(),
                _ => return Err(anyhow::Error::msg(err.to_string())),
            },
        };

        debug!("opened {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> anyhow::Result<()> {
        let string = ron::ser::to_string_pretty(&self.records, ron::ser::PrettyConfig::default())?;
        let mut file = File::create(&self.path)?;
        file.write_all(string.as_bytes())?;

        Ok(())
    }
}

impl Storage for RonStorage {
    fn save_competitors(&mut self, competitors: &mut [Competitor]) -> anyhow::Result<()> {
        self.records.save_competitors(competitors);
        self.write()
    }

    fn read_competitors(&self) -> anyhow::Result<Vec<Competitor>> {
        Ok(self.records.competitors.clone())
    }

    fn competitor_count(&self) -> anyhow::Result<usize> {
        Ok(self.records.competitors.len())
    }

    fn create_match(&mut self, game: &Match) -> anyhow::Result<Id> {
        let id = self.records.create_match(game)?;
        self.write()?;
        Ok(id)
    }

    fn update_matches(&mut self, games: &[Match]) -> anyhow::Result<()> {
        self.records.update_matches(games)?;
        self.write()
    }

    fn read_all_matches(&self) -> anyhow::Result<Vec<StoredMatch>> {
        Ok(self.records.matches.clone())
    }

    fn clear_all(&mut self) -> anyhow::Result<()> {
        self.records.clear_all();
        self.write()
    }
}

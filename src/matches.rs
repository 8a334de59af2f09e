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

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    competitor::Competitor,
    error::BracketError,
    node_id::{NodeId, Slot},
};

/// One contest in the bracket.
///
/// The tree performs every state transition; a match only guards that its
/// winner is one of the two competitors in it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Match {
    pub node_id: NodeId,
    #[serde(default)]
    pub slot_a: Option<Competitor>,
    #[serde(default)]
    pub slot_b: Option<Competitor>,
    #[serde(default)]
    pub winner: Option<Competitor>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Assigned the first time the match is saved.
    #[serde(default)]
    pub storage_id: Option<Id>,
}

impl Match {
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn slot(&self, slot: Slot) -> Option<&Competitor> {
        match slot {
            Slot::A => self.slot_a.as_ref(),
            Slot::B => self.slot_b.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut Option<Competitor> {
        match slot {
            Slot::A => &mut self.slot_a,
            Slot::B => &mut self.slot_b,
        }
    }

    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// Both slots hold real competitors, so only a played result can decide it.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        matches!(
            (&self.slot_a, &self.slot_b),
            (Some(a), Some(b)) if a.is_real() && b.is_real()
        )
    }

    /// # Errors
    ///
    /// If the winner is in neither slot.
    pub fn check(&self) -> Result<(), BracketError> {
        match &self.winner {
            Some(winner)
                if self.slot_a.as_ref() != Some(winner) && self.slot_b.as_ref() != Some(winner) =>
            {
                Err(BracketError::argument(format!(
                    "match {}: the winner {winner} is not playing in it",
                    self.node_id
                )))
            }
            _ => Ok(()),
        }
    }

    /// # Errors
    ///
    /// If `winner` occupies neither slot. The match is unchanged on error.
    pub fn declare_winner(
        &mut self,
        winner: Competitor,
        at: DateTime<Utc>,
    ) -> Result<(), BracketError> {
        if self.slot_a.as_ref() != Some(&winner) && self.slot_b.as_ref() != Some(&winner) {
            return Err(BracketError::state(format!(
                "match {}: {winner} is not playing in it",
                self.node_id
            )));
        }

        self.winner = Some(winner);
        self.completed_at = Some(at);
        Ok(())
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = |competitor: &Option<Competitor>| {
            competitor
                .as_ref()
                .map_or_else(|| "TBD".to_string(), ToString::to_string)
        };

        write!(
            f,
            "#{}: {} vs {}",
            self.node_id,
            slot(&self.slot_a),
            slot(&self.slot_b)
        )?;

        if let Some(winner) = &self.winner {
            write!(f, " -> {winner}")?;
        }

        Ok(())
    }
}

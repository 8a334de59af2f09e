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

//! Positions in the bracket.
//!
//! Matches are numbered like a binary heap: the final is `1` and the two
//! matches feeding match `n` are `2n` and `2n + 1`. Every round is therefore a
//! run of consecutive ids, and parents and children are found with
//! arithmetic alone.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The deepest bracket we build, about a million matches.
pub const MAX_LEVELS: u32 = 20;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// One of the two competitor slots of a match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Slot {
    A,
    B,
}

impl NodeId {
    pub const FINAL: Self = Self(1);

    /// `level` counts rounds from the first (`0`) to the final (`levels - 1`).
    #[must_use]
    pub fn from_position(levels: u32, level: u32, index: u32) -> Option<Self> {
        if levels > MAX_LEVELS || level >= levels {
            return None;
        }

        let width = 1 << (levels - 1 - level);
        (index < width).then_some(Self(width + index))
    }

    #[must_use]
    pub fn within(self, levels: u32) -> bool {
        levels <= MAX_LEVELS && self.0 >= 1 && self.0 < 1 << levels
    }

    /// Distance from the final, which has depth `0`.
    #[must_use]
    pub fn depth(self) -> u32 {
        self.0.max(1).ilog2()
    }

    #[must_use]
    pub fn level(self, levels: u32) -> Option<u32> {
        levels.checked_sub(self.depth() + 1)
    }

    /// Position from the left within its round.
    #[must_use]
    pub fn index(self) -> u32 {
        self.0.max(1) - (1 << self.depth())
    }

    #[must_use]
    pub fn parent(self) -> Option<Self> {
        (self.0 > 1).then_some(Self(self.0 / 2))
    }

    /// The match whose winner fills `slot` of this one.
    #[must_use]
    pub fn child(self, slot: Slot) -> Self {
        match slot {
            Slot::A => Self(self.0 * 2),
            Slot::B => Self(self.0 * 2 + 1),
        }
    }

    /// The slot of the parent this match's winner moves into.
    #[must_use]
    pub fn side(self) -> Slot {
        if self.0 % 2 == 0 { Slot::A } else { Slot::B }
    }

    pub(crate) fn arena_index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string.trim_start_matches('#').parse::<u32>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a NodeId!"
            ))),
        }
    }
}

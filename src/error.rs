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

use thiserror::Error;

use crate::node_id::NodeId;

/// Everything the bracket core can refuse to do.
///
/// Validation always happens before any state changes, so a tree is never
/// left half updated by a failed call.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum BracketError {
    #[error("bracket: invalid argument: {0}")]
    InvalidArgument(String),
    #[error("bracket: there is no match {0}")]
    NotFound(NodeId),
    #[error("bracket: invalid state: {0}")]
    InvalidState(String),
}

impl BracketError {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

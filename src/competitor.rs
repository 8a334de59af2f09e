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

use serde::{Deserialize, Serialize};

use crate::Id;

/// An entrant in the bracket, or a bye standing in for a missing one.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Competitor {
    /// Assigned by storage, `None` until the competitor is saved.
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bye: bool,
}

impl Competitor {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            bye: false,
        }
    }

    #[must_use]
    pub fn with_id(id: Id, name: &str) -> Self {
        Self {
            id: Some(id),
            ..Self::new(name)
        }
    }

    /// A placeholder used to pad the field to a power of two.
    #[must_use]
    pub fn bye() -> Self {
        Self {
            id: None,
            name: String::new(),
            bye: true,
        }
    }

    #[must_use]
    pub fn is_real(&self) -> bool {
        !self.bye
    }
}

impl fmt::Display for Competitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bye {
            write!(f, "bye")
        } else if let Some(id) = self.id {
            write!(f, "{} ({id})", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

//! Single elimination tournament brackets.
//!
//! A field of competitors is shuffled, padded with byes up to a power of two
//! and seeded into a complete binary tree of matches. Byes settle themselves
//! as soon as the bracket is built, results move winners toward the final,
//! and a bracket can be rebuilt from its stored matches in any order.
//!
//! ## Layout
//!
//! * [`tree::BracketTree`] - the bracket itself: seeding, byes, results
//! * [`engine::BracketEngine`] - sizing, padding, building and rebuilding
//! * [`storage::Storage`] - what a bracket needs from persistence
//! * [`manager::BracketManager`] - an engine wired to a storage
//!
//! ## Levels
//!
//! Level `0` is the first round and level `levels - 1` the final. Matches are
//! numbered like a binary heap, see [`node_id`].

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

#![deny(clippy::panic)]

pub mod competitor;
pub mod engine;
pub mod error;
pub mod manager;
pub mod matches;
pub mod node_id;
pub mod storage;
pub mod tree;
pub mod utils;

/// Storage identifier of a competitor or a match.
pub type Id = u64;
pub const HOME: &str = "brackets";
pub const DATA_FILE: &str = "bracket.ron";

pub const COPYRIGHT: &str = r".SH COPYRIGHT
Copyright (C) 2016-2026 Developers of the brackets project

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Copyright (c) 2016-2026 Developers of the brackets project
Licensed under the AGPLv3"
);

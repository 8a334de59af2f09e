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

use std::{io::Write as _, path::PathBuf};

use brackets::{COPYRIGHT, Id, LONG_VERSION, node_id::NodeId};
use clap::{CommandFactory, Parser, Subcommand};

/// Single Elimination Brackets
///
/// Keeps one tournament bracket in a data file. Byes are handed out and
/// settled automatically, so only real matches need a result.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Single Elimination Brackets")]
pub(crate) struct Args {
    /// Whether to log on the debug level
    #[arg(long)]
    pub debug: bool,

    /// Whether the application is being run by systemd
    #[arg(long)]
    pub systemd: bool,

    /// Where to keep the bracket instead of the data folder
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Build the manpage
    #[arg(long)]
    pub man: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Start a new bracket, replacing the saved one
    New {
        /// The competitors, shuffled before seeding
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Print every round
    Show,

    /// Print one round, the first round is 0
    Round { level: u32 },

    /// Record the winner of a match
    #[command(name = "result")]
    Record {
        /// The match, as printed after '#'
        node: NodeId,

        /// The winner, as printed in parentheses
        competitor: Id,
    },

    /// Remove the saved bracket
    Clear,
}

impl Args {
    pub(crate) fn generate_man_page() -> anyhow::Result<()> {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Self::command().name("brackets").long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-10-16");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        std::fs::write("brackets.1", buffer)?;
        Ok(())
    }
}

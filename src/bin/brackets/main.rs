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

#![deny(clippy::expect_used)]
#![deny(clippy::indexing_slicing)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

mod command_line;

use brackets::{
    DATA_FILE, Id,
    competitor::Competitor,
    engine::{BracketEngine, LogObserver, random_shuffle},
    manager::BracketManager,
    node_id::NodeId,
    storage::RonStorage,
    tree::{BracketTree, round_name},
    utils::{self, create_data_folder, data_file},
};
use clap::Parser;
use log::{error, info};

use crate::command_line::{Args, Command};

type Manager = BracketManager<RonStorage>;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger("brackets", args.debug, args.systemd);

    if args.man {
        return Args::generate_man_page();
    }

    let path = if let Some(path) = args.data_file {
        path
    } else {
        create_data_folder()?;
        data_file(DATA_FILE)
    };

    let storage = RonStorage::open(&path)?;
    info!("using {}", storage.path().display());
    let mut manager = BracketManager::new(BracketEngine::with_observer(LogObserver), storage);

    let result = match args.command {
        Some(Command::New { names }) => new_bracket(&mut manager, &names),
        Some(Command::Show) | None => show(&mut manager),
        Some(Command::Round { level }) => show_round(&mut manager, level),
        Some(Command::Record { node, competitor }) => record(&mut manager, node, competitor),
        Some(Command::Clear) => manager.clear(),
    };

    if let Err(error) = &result {
        error!("{error}");
    }

    result
}

fn load(manager: &mut Manager) -> anyhow::Result<BracketTree> {
    manager.load_bracket()?.ok_or_else(|| {
        anyhow::Error::msg("there is no bracket yet, start one with 'brackets new'")
    })
}

fn new_bracket(manager: &mut Manager, names: &[String]) -> anyhow::Result<()> {
    let competitors: Vec<Competitor> = names.iter().map(|name| Competitor::new(name)).collect();
    let tree = manager.create_bracket(&competitors, random_shuffle)?;

    print!("{tree}");
    print_champion(&tree);
    Ok(())
}

fn show(manager: &mut Manager) -> anyhow::Result<()> {
    let tree = load(manager)?;

    print!("{tree}");
    print_champion(&tree);
    Ok(())
}

fn show_round(manager: &mut Manager, level: u32) -> anyhow::Result<()> {
    let tree = load(manager)?;
    let matches = tree.all_matches_at_level(level)?;

    println!("{}:", round_name(level, tree.levels()));
    for game in matches {
        println!("  {game}");
    }

    Ok(())
}

fn record(manager: &mut Manager, node: NodeId, competitor: Id) -> anyhow::Result<()> {
    let mut tree = load(manager)?;
    let changed = manager.record_result(&mut tree, node, competitor)?;

    for game in changed.iter().filter_map(|node| tree.get(*node)) {
        println!("= {game}");
    }

    print_champion(&tree);
    Ok(())
}

fn print_champion(tree: &BracketTree) {
    if let Some(champion) = tree.champion() {
        println!("champion: {champion}");
    }
}

use std::{env, fs, io::Write, path::PathBuf};

use chrono::Utc;
use env_logger::Builder;
use log::LevelFilter;

use crate::HOME;

/// `RUST_LOG` wins when set. Otherwise everything logs at Info, and `name`
/// at Debug when `debug` is set.
pub fn init_logger(name: &str, debug: bool, systemd: bool) {
    let mut builder = Builder::new();

    if systemd {
        builder.format(|formatter, record| {
            writeln!(formatter, "[{}]: {}", record.level(), record.args())
        });
    } else {
        builder.format(|formatter, record| {
            writeln!(
                formatter,
                "{} [{}] ({}): {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S %z"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    }

    if let Ok(var) = env::var("RUST_LOG") {
        builder.parse_filters(&var);
    } else {
        builder.filter(None, LevelFilter::Info);

        if debug {
            builder.filter(Some(name), LevelFilter::Debug);
        }
    }

    builder.init();
}

fn data_folder() -> PathBuf {
    dirs::data_dir().unwrap_or_default().join(HOME)
}

#[must_use]
pub fn data_file(file: &str) -> PathBuf {
    data_folder().join(file)
}

/// # Errors
///
/// If the folder can't be created.
pub fn create_data_folder() -> anyhow::Result<()> {
    fs::create_dir_all(data_folder())?;
    Ok(())
}

//! yeep - terminal soundboard for the effect library
//!
//! Run with: cargo run
//!
//!   yeep             interactive list, Enter plays, q quits
//!   yeep <effect>    play one effect and exit once it has rung out
//!   yeep --list      print the effect names

mod app;
mod ui;

use std::{fs::File, sync::Mutex};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;
use yeep::{EngineConfig, Yeep};

use app::Soundboard;

enum Mode {
    Interactive,
    List,
    OneShot(String),
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let mode = match std::env::args().nth(1).as_deref() {
        None => Mode::Interactive,
        Some("--list") | Some("-l") => Mode::List,
        Some(name) => Mode::OneShot(name.to_string()),
    };

    match mode {
        Mode::List => {
            let yeep = Yeep::new(EngineConfig::default())?;
            for name in yeep.effects() {
                println!("{name}");
            }
            Ok(())
        }
        Mode::OneShot(name) => {
            // Fail before touching the audio device
            if !Yeep::new(EngineConfig::default())?.registry().contains(&name) {
                return Err(eyre!("unknown effect {name:?}, see yeep --list"));
            }
            init_logging(false)?;
            Soundboard::open()?.play_once(&name)
        }
        Mode::Interactive => {
            init_logging(true)?;
            Soundboard::open()?.run()
        }
    }
}

/// Install a subscriber only when `YEEP_LOG` is set.
///
/// The interactive UI owns the terminal, so its logs go to `yeep.log`.
fn init_logging(to_file: bool) -> EyreResult<()> {
    let Ok(filter) = EnvFilter::try_from_env("YEEP_LOG") else {
        return Ok(());
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if to_file {
        let file = File::create("yeep.log").wrap_err("failed to create yeep.log")?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

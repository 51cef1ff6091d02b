#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

mod commands;
mod slot;

use commands::{InputThread, UiCommand};
use flipper_lib::{Error, Flipper, FlipperConfig};
use parking_lot::Mutex;
use slot::{Stats, StatsListener, TerminalSlot};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::time::Duration;
use std::{env, thread};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

// How often the UI thread looks for work
const FRAME: Duration = Duration::from_millis(50);

fn main() -> Result<(), Error> {
    // Setup logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    let env_filter = EnvFilter::from_default_env();
    let max_level = match env_filter.max_level_hint() {
        Some(l) => l,
        None => LevelFilter::ERROR,
    };
    let show_debug = cfg!(debug_assertions) || max_level <= LevelFilter::DEBUG;
    tracing_subscriber::fmt::fmt()
        .with_target(false)
        .with_file(show_debug)
        .with_line_number(show_debug)
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    // Optional config file as the only argument
    let config = match env::args().nth(1) {
        Some(path) => FlipperConfig::load(Path::new(&path))?,
        None => FlipperConfig::default(),
    };
    if let Err(e) = config.checked_flip_interval() {
        tracing::warn!("{}", e);
    }

    // Setup async
    // We create and enter the runtime on the main thread so that
    // the flipper can spawn its scheduler from here.
    let rt = tokio::runtime::Runtime::new()?;
    let _main_rt = rt.enter();

    let (flipper, mut presenter) = Flipper::new(config.clone(), TerminalSlot::new(&config));
    let flipper = Arc::new(flipper);

    let stats = Arc::new(Mutex::new(Stats::default()));
    flipper.set_listener(StatsListener {
        stats: stats.clone(),
    });
    flipper.on_attach();

    // Input is read on its own thread, leaving the main thread for the UI
    let (to_ui, from_input) = mpsc::channel();
    let input = InputThread::new(
        flipper.clone(),
        rt.handle().clone(),
        to_ui,
        config.flip_interval(),
    );
    let input_thread = thread::spawn(move || input.run());

    // Run the UI
    loop {
        presenter.pump();
        while let Ok(command) = from_input.try_recv() {
            match command {
                UiCommand::Click => presenter.on_item_clicked(),
            }
        }
        if presenter.is_disposed() {
            break;
        }
        thread::sleep(FRAME);
    }

    match input_thread.join() {
        Ok(Err(e)) => tracing::error!("{}", e),
        Err(_) => tracing::error!("Input thread panicked"),
        Ok(Ok(())) => {}
    }

    rt.block_on(flipper.shutdown())?;

    let stats = stats.lock().clone();
    tracing::info!(
        "Done: started {} times, finished {} times, {} clicks",
        stats.starts,
        stats.finishes,
        stats.clicks
    );

    Ok(())
}

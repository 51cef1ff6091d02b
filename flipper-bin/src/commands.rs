use flipper_lib::{Error, ErrorKind, Flipper, Mode};
use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Things the input thread asks of the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Click,
}

#[derive(Debug, Clone)]
pub struct Command {
    cmd: &'static str,
    usage_params: &'static str,
    desc: &'static str,
}

impl Command {
    fn usage(&self, msg: String) -> Result<(), Error> {
        Err(ErrorKind::Usage(msg, format!("Usage: /{} {}", self.cmd, self.usage_params)).into())
    }
}

const COMMANDS: [Command; 8] = [
    Command {
        cmd: "clear",
        usage_params: "",
        desc: "drop everything queued and start over",
    },
    Command {
        cmd: "click",
        usage_params: "",
        desc: "click on the text being shown",
    },
    Command {
        cmd: "help",
        usage_params: "",
        desc: "show this list",
    },
    Command {
        cmd: "interval",
        usage_params: "<milliseconds>",
        desc: "change the flip interval from the next flip on",
    },
    Command {
        cmd: "last",
        usage_params: "<text>",
        desc: "queue text at the back (same as typing text without a command)",
    },
    Command {
        cmd: "priority",
        usage_params: "<text>",
        desc: "show text right now, ahead of the queue (also: !<text>)",
    },
    Command {
        cmd: "quit",
        usage_params: "",
        desc: "stop flipping and exit",
    },
    Command {
        cmd: "size",
        usage_params: "",
        desc: "print how many items are waiting",
    },
];

/// What a line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    Text(&'a str),
    Command(&'a str, &'a str),
}

pub fn parse_line(line: &str) -> Input<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(text) = line.strip_prefix('!') {
        return Input::Command("priority", text);
    }
    match line.strip_prefix('/') {
        Some(rest) => {
            let (cmd, args) = rest.split_once(' ').unwrap_or((rest, ""));
            Input::Command(cmd, args)
        }
        None => Input::Text(line),
    }
}

/// The stdin side of the terminal host
pub struct InputThread {
    flipper: Arc<Flipper>,
    rt: Handle,
    to_ui: Sender<UiCommand>,
    interval: Duration,
}

impl InputThread {
    pub fn new(
        flipper: Arc<Flipper>,
        rt: Handle,
        to_ui: Sender<UiCommand>,
        interval: Duration,
    ) -> InputThread {
        InputThread {
            flipper,
            rt,
            to_ui,
            interval,
        }
    }

    /// Feed stdin into the flipper until `/quit` or end of input
    pub fn run(mut self) -> Result<(), Error> {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            match self.handle_line(&line) {
                Ok(true) => {
                    self.flipper.dispose();
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => println!("{}", e),
            }
        }

        tracing::info!("End of input, letting the flipper run out");
        self.wind_down();
        self.flipper.dispose();
        Ok(())
    }

    /// Returns true if we should exit
    fn handle_line(&mut self, line: &str) -> Result<bool, Error> {
        let (cmd, args) = match parse_line(line) {
            Input::Text(text) => {
                if !self.flipper.add_text(text) {
                    tracing::debug!("ignored blank line");
                }
                return Ok(false);
            }
            Input::Command(cmd, args) => (cmd, args),
        };

        let Some(command) = COMMANDS.iter().find(|c| c.cmd == cmd) else {
            return Err(ErrorKind::Usage(
                format!("Unknown command: /{cmd}"),
                "Try /help".to_owned(),
            )
            .into());
        };

        match command.cmd {
            "clear" => self.flipper.clear(),
            "click" => {
                let _ = self.to_ui.send(UiCommand::Click);
            }
            "help" => help(),
            "interval" => match args.trim().parse::<u64>() {
                Ok(0) => command.usage("The interval must be positive".to_owned())?,
                Ok(ms) => {
                    self.flipper.set_flip_interval(ms);
                    self.interval = Duration::from_millis(ms);
                }
                Err(e) => command.usage(format!("Bad interval: {e}"))?,
            },
            "last" => {
                if !self.flipper.add_text_last(args) {
                    command.usage("Missing text".to_owned())?;
                }
            }
            "priority" => {
                if !self.flipper.add_text_first(args) {
                    command.usage("Missing text".to_owned())?;
                }
            }
            "quit" => return Ok(true),
            "size" => println!("{} waiting", self.rt.block_on(self.flipper.queue_size())),
            _ => {}
        }

        Ok(false)
    }

    // Give whatever is queued a chance to be seen before we exit
    fn wind_down(&self) {
        loop {
            let waiting = self.rt.block_on(self.flipper.queue_size());
            if self.flipper.is_disposed() || waiting == 0 {
                return;
            }
            if self.flipper.mode() == Mode::CircularRotate {
                std::thread::sleep(lap_time(self.interval, waiting));
                return;
            }
            // The one on display is still counted until its time is up
            std::thread::sleep(self.interval.min(MAX_WIND_DOWN));
        }
    }
}

const MAX_WIND_DOWN: Duration = Duration::from_secs(60 * 60);

// How long one full rotation takes, capped
fn lap_time(interval: Duration, items: usize) -> Duration {
    u32::try_from(items)
        .ok()
        .and_then(|n| interval.checked_mul(n))
        .map_or(MAX_WIND_DOWN, |lap| lap.min(MAX_WIND_DOWN))
}

fn help() {
    println!("Type text to queue it. Commands:");
    for c in COMMANDS.iter() {
        println!("  /{} {}", c.cmd, c.usage_params);
        println!("      {}", c.desc);
    }
}

use flipper_lib::{FlipperConfig, FlipperListener, TextSlot};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Renders the slot as a single line on stdout
pub struct TerminalSlot {
    padding: usize,
    color: Option<(u8, u8, u8)>,
}

impl TerminalSlot {
    pub fn new(config: &FlipperConfig) -> TerminalSlot {
        TerminalSlot {
            padding: config.padding_dp.max(0.0) as usize / 2,
            color: parse_hex_color(&config.text_color),
        }
    }

    fn render(&self, text: &str) -> String {
        let pad = " ".repeat(self.padding);
        match self.color {
            // Black is the default and would vanish on dark terminals
            Some((r, g, b)) if (r, g, b) != (0, 0, 0) => {
                format!("{pad}\x1b[38;2;{r};{g};{b}m{text}\x1b[0m")
            }
            _ => format!("{pad}{text}"),
        }
    }
}

impl TextSlot for TerminalSlot {
    fn set_text(&mut self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", self.render(text));
        let _ = out.flush();
    }

    fn clear(&mut self) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", self.render("--"));
        let _ = out.flush();
    }
}

fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some((r, g, b))
}

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub starts: usize,
    pub finishes: usize,
    pub clicks: usize,
}

/// Logs listener callbacks and counts them for the exit summary
pub struct StatsListener {
    pub stats: Arc<Mutex<Stats>>,
}

impl FlipperListener for StatsListener {
    fn on_item_click(&mut self, text: &str, index: usize) {
        tracing::info!("clicked #{}: {}", index, text);
        self.stats.lock().clicks += 1;
    }

    fn on_flip_start(&mut self) {
        tracing::info!("flipping started");
        self.stats.lock().starts += 1;
    }

    fn on_flip_finish(&mut self) {
        tracing::info!("nothing left to flip");
        self.stats.lock().finishes += 1;
    }
}

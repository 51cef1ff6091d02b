//! A queue-driven rotating text announcer.
//!
//! Producers hand text to a [Flipper]. A background [Scheduler] task owns the
//! queue and the advance timer and decides what to show next according to the
//! configured [Mode]. The [Presenter], which lives on the host's UI thread,
//! puts the text into a [TextSlot] and notifies the [FlipperListener].
//!
//! ```no_run
//! use flipper_lib::{Flipper, FlipperConfig, Mode, TextSlot};
//!
//! struct Stdout;
//! impl TextSlot for Stdout {
//!     fn set_text(&mut self, text: &str) {
//!         println!("{text}");
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (flipper, mut presenter) = Flipper::new(FlipperConfig::with_mode(Mode::PriorityInsert), Stdout);
//! flipper.on_attach();
//! flipper.add_text("yesterday's news");
//! flipper.add_text_priority("breaking news");
//! presenter.run().await;
//! # }
//! ```

#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

pub mod comms;

mod config;
pub use config::{FlipperConfig, Mode, DEFAULT_FLIP_INTERVAL_MS};

mod error;
pub use error::{Error, ErrorKind};

mod flipper;
pub use flipper::Flipper;

mod presenter;
pub use presenter::{DisplayState, FlipperListener, Presenter, TextSlot};

mod scheduler;
pub use scheduler::Scheduler;

mod store;
pub use store::MessageStore;

/// Lifecycle of a flipper, shared by the facade, scheduler and presenter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Created, not on screen yet
    Detached,

    /// On screen and flipping
    Attached,

    /// Torn down. Nothing more will happen.
    Disposed,
}

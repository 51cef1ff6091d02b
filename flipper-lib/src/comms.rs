use crate::presenter::FlipperListener;
use std::fmt;
use tokio::sync::oneshot;

/// This is a message sent to the Scheduler. Everything that touches the queue
/// or the timer goes through here, so the Scheduler handles them strictly one
/// at a time in the order they were sent. There is no return value unless the
/// message carries a reply channel.
#[derive(Debug)]
pub enum ToSchedulerMessage {
    /// The host put the slot on screen. Starts flipping.
    Attach,

    /// Normal add. Appended (or, when rotating, added to the end of the lap).
    AddLast(String),

    /// Priority add. Shown immediately, in front of everything queued.
    AddFirst(String),

    /// Drop everything queued and start over.
    Clear,

    /// Change the interval used by future arm operations
    SetInterval(u64),

    /// Reply with the number of queued items
    QueueSize(oneshot::Sender<usize>),
}

/// This is a message sent from the Scheduler (or the facade) to the Presenter.
/// These are applied on the UI context in the order they were sent.
pub enum ToPresenterMessage {
    /// Put `text` in the slot. `finished` is set when nothing is queued
    /// behind it.
    Show {
        text: String,
        index: usize,
        finished: bool,
    },

    /// An advance found nothing left to show
    Finished,

    /// Clear was processed
    Reset,

    /// Replace the registered listener
    SetListener(Option<Box<dyn FlipperListener + Send>>),
}

impl fmt::Debug for ToPresenterMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToPresenterMessage::Show {
                text,
                index,
                finished,
            } => f
                .debug_struct("Show")
                .field("text", text)
                .field("index", index)
                .field("finished", finished)
                .finish(),
            ToPresenterMessage::Finished => write!(f, "Finished"),
            ToPresenterMessage::Reset => write!(f, "Reset"),
            ToPresenterMessage::SetListener(l) => {
                write!(f, "SetListener({})", if l.is_some() { "Some" } else { "None" })
            }
        }
    }
}

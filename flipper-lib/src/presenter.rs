use crate::comms::ToPresenterMessage;
use crate::RunState;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch::Receiver as WatchReceiver;

/// Whatever puts the current text on screen. Transitions and styling are up
/// to the implementation.
pub trait TextSlot {
    fn set_text(&mut self, text: &str);

    /// Called when the flipper is cleared
    fn clear(&mut self) {}
}

/// Notifications about what the flipper is doing. All are optional.
///
/// These are always called from the UI context, i.e. from whoever drives the
/// [Presenter].
pub trait FlipperListener {
    /// The displayed text was clicked
    fn on_item_click(&mut self, _text: &str, _index: usize) {}

    /// The first text was displayed (again after a clear)
    fn on_flip_start(&mut self) {}

    /// The queue ran dry
    fn on_flip_finish(&mut self) {}
}

/// What is on screen right now
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub current_text: Option<String>,
    pub current_index: Option<usize>,
    pub has_started: bool,
}

/// The UI-side half of a flipper.
///
/// The Presenter is the only thing that changes the [DisplayState], renders
/// into the [TextSlot], and calls the [FlipperListener]. Keep it on your UI
/// thread and either call [pump](Presenter::pump) once per frame, or await
/// [run](Presenter::run) on a local task.
pub struct Presenter<S: TextSlot> {
    slot: S,
    inbox: UnboundedReceiver<ToPresenterMessage>,
    read_runstate: WatchReceiver<RunState>,
    listener: Option<Box<dyn FlipperListener + Send>>,
    state: DisplayState,
}

impl<S: TextSlot> Presenter<S> {
    pub fn new(
        slot: S,
        inbox: UnboundedReceiver<ToPresenterMessage>,
        read_runstate: WatchReceiver<RunState>,
    ) -> Presenter<S> {
        Presenter {
            slot,
            inbox,
            read_runstate,
            listener: None,
            state: DisplayState::default(),
        }
    }

    pub fn display_state(&self) -> &DisplayState {
        &self.state
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn is_disposed(&self) -> bool {
        *self.read_runstate.borrow() == RunState::Disposed
    }

    /// Apply everything that has arrived so far without waiting.
    /// Returns how many messages were handled.
    pub fn pump(&mut self) -> usize {
        let mut count = 0;
        while let Ok(message) = self.inbox.try_recv() {
            self.apply(message);
            count += 1;
        }
        count
    }

    /// Apply messages as they arrive until the flipper is disposed or dropped
    pub async fn run(&mut self) {
        loop {
            if self.is_disposed() {
                break;
            }
            tokio::select! {
                changed = self.read_runstate.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.apply(message),
                        None => break,
                    }
                }
            }
        }
    }

    /// Forward a click on the slot to the listener
    pub fn on_item_clicked(&mut self) {
        if self.is_disposed() {
            return;
        }
        if let (Some(text), Some(listener)) = (&self.state.current_text, &mut self.listener) {
            listener.on_item_click(text, self.state.current_index.unwrap_or(0));
        }
    }

    fn apply(&mut self, message: ToPresenterMessage) {
        // Posts may still be in flight when the flipper is torn down
        if self.is_disposed() {
            tracing::trace!("presenter dropping {:?} after dispose", message);
            return;
        }

        match message {
            ToPresenterMessage::Show {
                text,
                index,
                finished,
            } => self.show(text, index, finished),
            ToPresenterMessage::Finished => {
                if self.state.has_started {
                    self.fire_finish();
                }
            }
            ToPresenterMessage::Reset => {
                self.state = DisplayState::default();
                self.slot.clear();
            }
            ToPresenterMessage::SetListener(listener) => self.listener = listener,
        }
    }

    fn show(&mut self, text: String, index: usize, finished: bool) {
        self.slot.set_text(&text);
        self.state.current_text = Some(text);
        self.state.current_index = Some(index);

        if !self.state.has_started {
            self.state.has_started = true;
            if let Some(listener) = &mut self.listener {
                listener.on_flip_start();
            }
        } else if finished {
            self.fire_finish();
        }
    }

    fn fire_finish(&mut self) {
        if let Some(listener) = &mut self.listener {
            listener.on_flip_finish();
        }
    }
}

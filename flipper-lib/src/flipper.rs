use crate::comms::{ToPresenterMessage, ToSchedulerMessage};
use crate::config::{FlipperConfig, Mode};
use crate::error::{Error, ErrorKind};
use crate::presenter::{FlipperListener, Presenter, TextSlot};
use crate::scheduler::Scheduler;
use crate::RunState;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// The producer-facing half of a flipper.
///
/// Every call posts a message to the scheduler and returns immediately; none
/// of them block or wait for the text to be displayed. Share it (e.g. in an
/// `Arc`) with anything that produces text. Once disposed, every call is a
/// harmless no-op.
pub struct Flipper {
    mode: Mode,
    to_scheduler: UnboundedSender<ToSchedulerMessage>,
    to_presenter: UnboundedSender<ToPresenterMessage>,
    write_runstate: watch::Sender<RunState>,
    scheduler_task: Mutex<Option<JoinHandle<()>>>,
}

impl Flipper {
    /// Create a flipper rendering into `slot`, and spawn its scheduler.
    ///
    /// This must be called from within a tokio runtime. The returned
    /// [Presenter] belongs on your UI thread.
    pub fn new<S: TextSlot>(config: FlipperConfig, slot: S) -> (Flipper, Presenter<S>) {
        let (to_scheduler, scheduler_inbox) = unbounded_channel();
        let (to_presenter, presenter_inbox) = unbounded_channel();
        let (write_runstate, read_runstate) = watch::channel(RunState::Detached);

        let scheduler = Scheduler::new(
            &config,
            scheduler_inbox,
            to_presenter.clone(),
            read_runstate.clone(),
        );
        let presenter = Presenter::new(slot, presenter_inbox, read_runstate);
        let task = tokio::spawn(scheduler.run());

        tracing::info!("Flipper created ({} mode)", config.mode);

        let flipper = Flipper {
            mode: config.mode,
            to_scheduler,
            to_presenter,
            write_runstate,
            scheduler_task: Mutex::new(Some(task)),
        };
        (flipper, presenter)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Queue `text` with the mode's normal policy. Returns false if the text
    /// was rejected (blank, or the flipper is disposed).
    pub fn add_text(&self, text: impl Into<String>) -> bool {
        Self::report(self.try_add(text.into(), false))
    }

    /// Show `text` immediately, ahead of everything queued. In modes without
    /// priority support this is the same as [add_text](Flipper::add_text).
    pub fn add_text_priority(&self, text: impl Into<String>) -> bool {
        Self::report(self.try_add(text.into(), true))
    }

    /// Pushed messages (e.g. from a websocket) go first
    pub fn add_text_first(&self, text: impl Into<String>) -> bool {
        self.add_text_priority(text)
    }

    /// History goes last
    pub fn add_text_last(&self, text: impl Into<String>) -> bool {
        self.add_text(text)
    }

    /// Like [add_text](Flipper::add_text) or [add_text_priority](Flipper::add_text_priority)
    /// but says why the text was not accepted
    pub fn try_add(&self, text: String, priority: bool) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(ErrorKind::InvalidInput("blank text".to_owned()).into());
        }
        let message = if priority {
            ToSchedulerMessage::AddFirst(text)
        } else {
            ToSchedulerMessage::AddLast(text)
        };
        self.post(message)
    }

    /// Drop everything queued and reset the display, as if freshly created
    pub fn clear(&self) {
        let _ = Self::report(self.post(ToSchedulerMessage::Clear));
    }

    /// Change the flip interval. Takes effect the next time the timer is armed.
    pub fn set_flip_interval(&self, ms: u64) {
        let _ = Self::report(self.post(ToSchedulerMessage::SetInterval(ms)));
    }

    pub fn set_listener<L: FlipperListener + Send + 'static>(&self, listener: L) {
        self.send_listener(Some(Box::new(listener)));
    }

    pub fn remove_listener(&self) {
        self.send_listener(None);
    }

    /// The number of items in the queue, counting everything posted before
    /// this call. Outside circular mode the item on display counts until its
    /// interval is up. Zero once disposed.
    pub async fn queue_size(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.post(ToSchedulerMessage::QueueSize(tx)).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// The host put the slot on screen; start flipping
    pub fn on_attach(&self) {
        let _ = Self::report(self.post(ToSchedulerMessage::Attach));
        if !self.is_disposed() {
            self.write_runstate.send_replace(RunState::Attached);
        }
    }

    /// The host took the slot off screen. This is final.
    pub fn on_detach(&self) {
        self.dispose();
    }

    /// Stop the timer and throw away anything not yet processed. Messages
    /// already handed to the presenter are dropped unapplied.
    pub fn dispose(&self) {
        if self.write_runstate.send_replace(RunState::Disposed) != RunState::Disposed {
            tracing::info!("Flipper disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        *self.write_runstate.borrow() == RunState::Disposed
    }

    /// Dispose, then wait for the scheduler task to finish
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.dispose();
        let task = self.scheduler_task.lock().take();
        if let Some(task) = task {
            task.await?;
        }
        Ok(())
    }

    fn post(&self, message: ToSchedulerMessage) -> Result<(), Error> {
        if self.is_disposed() {
            return Err(ErrorKind::PostAfterDispose.into());
        }
        self.to_scheduler
            .send(message)
            .map_err(|_| ErrorKind::PostAfterDispose.into())
    }

    fn send_listener(&self, listener: Option<Box<dyn FlipperListener + Send>>) {
        if self.is_disposed() {
            return;
        }
        let _ = self
            .to_presenter
            .send(ToPresenterMessage::SetListener(listener));
    }

    // Producers get a bool, the reason goes to the log
    fn report(result: Result<(), Error>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("{}", e);
                false
            }
        }
    }
}

impl Drop for Flipper {
    fn drop(&mut self) {
        self.dispose();
    }
}

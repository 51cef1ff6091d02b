use crate::comms::{ToPresenterMessage, ToSchedulerMessage};
use crate::config::{interval_or_default, FlipperConfig, Mode};
use crate::store::MessageStore;
use crate::RunState;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::watch::Receiver as WatchReceiver;
use tokio::time::Instant;

/// The scheduler owns the message queue and the advance timer.
///
/// It runs as a single task and handles its inbox one message at a time, so
/// nothing else ever touches the queue. What to display is handed on to the
/// [Presenter](crate::Presenter) over an ordered channel.
///
/// You normally get one of these running by creating a [Flipper](crate::Flipper).
pub struct Scheduler {
    mode: Mode,
    interval: Duration,
    store: MessageStore,

    inbox: UnboundedReceiver<ToSchedulerMessage>,
    to_presenter: UnboundedSender<ToPresenterMessage>,
    read_runstate: WatchReceiver<RunState>,

    // When the next advance happens. None means idle.
    deadline: Option<Instant>,

    // Nothing is displayed or advanced until the host attaches
    attached: bool,

    // The slot holds an item that has not yet had its full interval
    showing: bool,

    // Something was displayed since the last finish or clear
    unfinished: bool,

    index: Option<usize>,
}

impl Scheduler {
    pub fn new(
        config: &FlipperConfig,
        inbox: UnboundedReceiver<ToSchedulerMessage>,
        to_presenter: UnboundedSender<ToPresenterMessage>,
        read_runstate: WatchReceiver<RunState>,
    ) -> Scheduler {
        Scheduler {
            mode: config.mode,
            interval: config.flip_interval(),
            store: MessageStore::new(),
            inbox,
            to_presenter,
            read_runstate,
            deadline: None,
            attached: false,
            showing: false,
            unfinished: false,
            index: None,
        }
    }

    /// This runs the scheduler until the flipper is disposed (or dropped).
    /// Anything still waiting in the inbox at that point is discarded.
    pub async fn run(mut self) {
        tracing::debug!(
            "Scheduler starting: mode={} interval={}ms",
            self.mode,
            self.interval.as_millis()
        );

        loop {
            if *self.read_runstate.borrow() == RunState::Disposed {
                break;
            }

            let deadline = self.deadline;

            // Listen on runstate, the advance timer and the inbox, in that order
            tokio::select! {
                biased;
                changed = self.read_runstate.changed() => {
                    if changed.is_err() {
                        // The flipper is gone
                        break;
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.deadline = None;
                    self.advance();
                },
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => break,
                    }
                }
            }
        }

        self.deadline = None;
        self.inbox.close();
        let mut discarded = 0;
        while self.inbox.try_recv().is_ok() {
            discarded += 1;
        }
        self.store.clear();
        tracing::debug!("Scheduler shut down, discarded {} pending messages", discarded);
    }

    pub(crate) fn handle_message(&mut self, message: ToSchedulerMessage) {
        tracing::trace!("scheduler handling {:?}", message);
        match message {
            ToSchedulerMessage::Attach => self.attach(),
            ToSchedulerMessage::AddLast(text) => self.add_last(text),
            ToSchedulerMessage::AddFirst(text) => self.add_first(text),
            ToSchedulerMessage::Clear => self.clear(),
            ToSchedulerMessage::SetInterval(ms) => {
                self.interval = interval_or_default(ms);
                tracing::debug!("Flip interval now {}ms", self.interval.as_millis());
            }
            ToSchedulerMessage::QueueSize(reply) => {
                let _ = reply.send(self.store.len());
            }
        }
    }

    fn attach(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;

        if !self.showing && !self.store.is_empty() {
            self.advance();
        } else {
            self.arm();
        }
    }

    fn add_last(&mut self, text: String) {
        if self.mode == Mode::CircularRotate && self.showing {
            // The displayed item sits at the back; keep the new one ahead of it
            self.store.insert_before_last(text);
        } else {
            self.store.append_last(text);
        }

        if self.attached && !self.showing {
            self.advance();
        }
    }

    fn add_first(&mut self, text: String) {
        if !self.mode.supports_priority() {
            tracing::debug!("{} mode has no priority adds, appending instead", self.mode);
            self.add_last(text);
            return;
        }

        // Whatever is on display stays queued behind this and gets shown again
        self.store.insert_first(text);

        // Preempt whatever is armed
        if self.attached {
            self.show_front();
        }
    }

    fn clear(&mut self) {
        self.store.clear();
        self.deadline = None;
        self.showing = false;
        self.unfinished = false;
        self.index = None;
        let _ = self.to_presenter.send(ToPresenterMessage::Reset);
    }

    /// Move on to the next item according to the mode
    pub(crate) fn advance(&mut self) {
        match self.mode {
            Mode::LinearDrain | Mode::PriorityInsert => {
                // The displayed item stays at the front until its time is up
                if self.showing {
                    let _ = self.store.take_front();
                }
                self.show_front();
            }
            Mode::CircularRotate => {
                match self.store.rotate_front() {
                    Some(text) => self.show(text, false),
                    None => self.showing = false,
                }
                self.arm();
            }
        }
    }

    // Display the front item without removing it
    fn show_front(&mut self) {
        if let Some(text) = self.store.front() {
            let text = text.to_owned();
            let finished = self.mode == Mode::PriorityInsert && self.store.len() == 1;
            self.show(text, finished);
            return;
        }

        self.showing = false;
        if self.mode == Mode::LinearDrain {
            // Stop here. Adds will restart us.
            self.deadline = None;
            if self.unfinished {
                self.unfinished = false;
                let _ = self.to_presenter.send(ToPresenterMessage::Finished);
            }
        } else {
            // Keep polling even when empty
            self.arm();
        }
    }

    fn show(&mut self, text: String, finished: bool) {
        let index = match (self.mode, self.index) {
            (_, None) => 0,
            (Mode::CircularRotate, Some(i)) => (i + 1) % self.store.len().max(1),
            (_, Some(i)) => i + 1,
        };
        self.index = Some(index);
        self.showing = true;
        self.unfinished = true;

        tracing::debug!("showing #{}: {}", index, text);
        let _ = self.to_presenter.send(ToPresenterMessage::Show {
            text,
            index,
            finished,
        });

        self.arm();
    }

    /// (Re)start the countdown to the next advance
    fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> Vec<&str> {
        self.store.iter().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::sync::watch;

    struct Harness {
        scheduler: Scheduler,
        from_scheduler: UnboundedReceiver<ToPresenterMessage>,
        _write_runstate: watch::Sender<RunState>,
        _to_scheduler: UnboundedSender<ToSchedulerMessage>,
    }

    impl Harness {
        fn new(mode: Mode) -> Harness {
            let (to_scheduler, inbox) = unbounded_channel();
            let (to_presenter, from_scheduler) = unbounded_channel();
            let (write_runstate, read_runstate) = watch::channel(RunState::Detached);
            let config = FlipperConfig {
                flip_interval_ms: 1000,
                mode,
                ..Default::default()
            };
            Harness {
                scheduler: Scheduler::new(&config, inbox, to_presenter, read_runstate),
                from_scheduler,
                _write_runstate: write_runstate,
                _to_scheduler: to_scheduler,
            }
        }

        fn send(&mut self, message: ToSchedulerMessage) {
            self.scheduler.handle_message(message);
        }

        fn add(&mut self, text: &str) {
            self.send(ToSchedulerMessage::AddLast(text.to_owned()));
        }

        fn add_first(&mut self, text: &str) {
            self.send(ToSchedulerMessage::AddFirst(text.to_owned()));
        }

        // Drains what the presenter would have received, in a compact form
        fn output(&mut self) -> Vec<String> {
            let mut out = Vec::new();
            while let Ok(message) = self.from_scheduler.try_recv() {
                out.push(match message {
                    ToPresenterMessage::Show {
                        text,
                        index,
                        finished: false,
                    } => format!("{text}@{index}"),
                    ToPresenterMessage::Show {
                        text,
                        index,
                        finished: true,
                    } => format!("{text}@{index}!"),
                    ToPresenterMessage::Finished => "finished".to_owned(),
                    ToPresenterMessage::Reset => "reset".to_owned(),
                    ToPresenterMessage::SetListener(_) => "listener".to_owned(),
                });
            }
            out
        }
    }

    #[test]
    fn test_nothing_happens_before_attach() {
        let mut h = Harness::new(Mode::LinearDrain);
        h.add("a");
        h.add("b");
        assert!(h.output().is_empty());
        assert!(!h.scheduler.is_armed());
        assert_eq!(h.scheduler.queued(), vec!["a", "b"]);

        h.send(ToSchedulerMessage::Attach);
        assert_eq!(h.output(), vec!["a@0"]);
        assert!(h.scheduler.is_armed());
        assert_eq!(h.scheduler.queued(), vec!["a", "b"]);

        // a second attach is ignored
        h.send(ToSchedulerMessage::Attach);
        assert!(h.output().is_empty());
    }

    #[test]
    fn test_linear_drain() {
        let mut h = Harness::new(Mode::LinearDrain);
        h.send(ToSchedulerMessage::Attach);
        assert!(h.scheduler.is_armed());

        // The first add is shown at once, the rest wait their turn
        h.add("a");
        h.add("b");
        h.add("c");
        assert_eq!(h.output(), vec!["a@0"]);

        h.scheduler.advance();
        h.scheduler.advance();
        assert_eq!(h.output(), vec!["b@1", "c@2"]);
        assert!(h.scheduler.is_armed());
        assert_eq!(h.scheduler.queued(), vec!["c"]);

        h.scheduler.advance();
        assert_eq!(h.output(), vec!["finished"]);
        assert!(!h.scheduler.is_armed());
        assert!(h.scheduler.queued().is_empty());

        // A later add starts things up again
        h.add("d");
        assert_eq!(h.output(), vec!["d@3"]);
        assert!(h.scheduler.is_armed());
    }

    #[test]
    fn test_linear_empty_tick_without_display_is_silent() {
        let mut h = Harness::new(Mode::LinearDrain);
        h.send(ToSchedulerMessage::Attach);
        h.scheduler.advance();
        assert!(h.output().is_empty());
        assert!(!h.scheduler.is_armed());
    }

    #[test]
    fn test_priority_preempts() {
        let mut h = Harness::new(Mode::PriorityInsert);
        h.send(ToSchedulerMessage::Attach);
        h.add("a");
        h.add("b");
        h.add("c");
        // "a" was the only item when it went up
        assert_eq!(h.output(), vec!["a@0!"]);

        h.add_first("urgent");
        assert_eq!(h.output(), vec!["urgent@1"]);
        assert_eq!(h.scheduler.queued(), vec!["urgent", "a", "b", "c"]);

        for _ in 0..3 {
            h.scheduler.advance();
        }
        assert_eq!(h.output(), vec!["a@2", "b@3", "c@4!"]);

        // Polling continues on an empty queue
        h.scheduler.advance();
        assert!(h.output().is_empty());
        assert!(h.scheduler.queued().is_empty());
        assert!(h.scheduler.is_armed());

        // and an add after the queue ran dry is shown immediately
        h.add("d");
        assert_eq!(h.output(), vec!["d@5!"]);
    }

    #[test]
    fn test_priority_interrupted_item_comes_back() {
        let mut h = Harness::new(Mode::PriorityInsert);
        h.send(ToSchedulerMessage::Attach);
        h.add("A");
        h.add("B");
        assert_eq!(h.output(), vec!["A@0!"]);
        assert_eq!(h.scheduler.queued(), vec!["A", "B"]);

        h.add_first("URGENT");
        assert_eq!(h.output(), vec!["URGENT@1"]);
        assert_eq!(h.scheduler.queued(), vec!["URGENT", "A", "B"]);

        h.scheduler.advance();
        h.scheduler.advance();
        assert_eq!(h.output(), vec!["A@2", "B@3!"]);
        assert_eq!(h.scheduler.queued(), vec!["B"]);
    }

    #[test]
    fn test_priority_falls_back_in_other_modes() {
        let mut h = Harness::new(Mode::LinearDrain);
        h.send(ToSchedulerMessage::Attach);
        h.add("a");
        h.add("b");
        h.add_first("urgent");
        assert_eq!(h.output(), vec!["a@0"]);
        assert_eq!(h.scheduler.queued(), vec!["a", "b", "urgent"]);
    }

    #[test]
    fn test_priority_before_attach_only_queues() {
        let mut h = Harness::new(Mode::PriorityInsert);
        h.add("a");
        h.add_first("urgent");
        assert!(h.output().is_empty());
        assert_eq!(h.scheduler.queued(), vec!["urgent", "a"]);
        h.send(ToSchedulerMessage::Attach);
        assert_eq!(h.output(), vec!["urgent@0"]);
    }

    #[test]
    fn test_circular_rotation_is_periodic() {
        let mut h = Harness::new(Mode::CircularRotate);
        h.send(ToSchedulerMessage::Attach);
        h.add("a");
        h.add("b");
        h.add("c");
        assert_eq!(h.output(), vec!["a@0"]);
        for _ in 0..8 {
            h.scheduler.advance();
            assert_eq!(h.scheduler.queued().len(), 3);
        }
        assert_eq!(
            h.output(),
            vec!["b@1", "c@2", "a@0", "b@1", "c@2", "a@0", "b@1", "c@2"]
        );
        assert!(h.scheduler.is_armed());
    }

    #[test]
    fn test_circular_seeded_before_attach() {
        let mut h = Harness::new(Mode::CircularRotate);
        h.add("a");
        h.add("b");
        h.send(ToSchedulerMessage::Attach);
        for _ in 0..3 {
            h.scheduler.advance();
        }
        assert_eq!(h.output(), vec!["a@0", "b@1", "a@0", "b@1"]);
    }

    #[test]
    fn test_circular_empty_keeps_polling() {
        let mut h = Harness::new(Mode::CircularRotate);
        h.send(ToSchedulerMessage::Attach);
        h.scheduler.advance();
        assert!(h.output().is_empty());
        assert!(h.scheduler.is_armed());
    }

    #[test]
    fn test_clear_resets() {
        let mut h = Harness::new(Mode::PriorityInsert);
        h.send(ToSchedulerMessage::Attach);
        h.add("a");
        h.add("b");
        h.send(ToSchedulerMessage::Clear);
        assert_eq!(h.output(), vec!["a@0!", "reset"]);
        assert!(h.scheduler.queued().is_empty());
        assert!(!h.scheduler.is_armed());

        // fresh numbering, immediate display
        h.add("c");
        assert_eq!(h.output(), vec!["c@0!"]);
    }

    #[test]
    fn test_queue_size_reply() {
        let mut h = Harness::new(Mode::LinearDrain);
        h.add("a");
        h.add("b");
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        h.send(ToSchedulerMessage::QueueSize(tx));
        assert_eq!(rx.try_recv().unwrap(), 2);
    }

    #[test]
    fn test_set_interval() {
        let mut h = Harness::new(Mode::LinearDrain);
        h.send(ToSchedulerMessage::SetInterval(250));
        assert_eq!(h.scheduler.interval, Duration::from_millis(250));
        h.send(ToSchedulerMessage::SetInterval(0));
        assert_eq!(h.scheduler.interval, Duration::from_millis(10_000));
    }
}

use std::collections::VecDeque;

/// The queue of text waiting to be flipped in.
///
/// The store is owned by the [Scheduler](crate::Scheduler) task and is never
/// shared, so it does no locking of its own.
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    queue: VecDeque<String>,
}

impl MessageStore {
    pub fn new() -> MessageStore {
        MessageStore {
            queue: VecDeque::new(),
        }
    }

    /// Add to the back (history, normal adds)
    pub fn append_last(&mut self, text: String) {
        self.queue.push_back(text);
    }

    /// Add to the front (pushed, high priority adds)
    pub fn insert_first(&mut self, text: String) {
        self.queue.push_front(text);
    }

    /// Add just ahead of the last item. With circular rotation the last item
    /// is the one on display, so this puts `text` at the end of the current lap.
    /// On an empty store this is the same as `append_last`.
    pub fn insert_before_last(&mut self, text: String) {
        let at = self.queue.len().saturating_sub(1);
        self.queue.insert(at, text);
    }

    /// The front item, left where it is
    pub fn front(&self) -> Option<&str> {
        self.queue.front().map(|s| s.as_str())
    }

    /// Remove and return the front item
    pub fn take_front(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Return the front item, moving it to the back
    pub fn rotate_front(&mut self) -> Option<String> {
        let text = self.queue.pop_front()?;
        self.queue.push_back(text.clone());
        Some(text)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(|s| s.as_str())
    }
}

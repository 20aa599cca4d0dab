//! Append-only conversation log.

use std::sync::Arc;

use chrono::Utc;

use super::{Message, MessageDraft, MessageId};
use crate::observer::SessionObserver;

/// System message appended by [`ConversationLog::clear`].
pub const CLEAR_GREETING: &str = "Chat cleared. How can I help you?";

/// Append-only, time-ordered sequence of messages.
///
/// Insertion order is display order is causal order. Once appended, a
/// message is never mutated or removed; `clear` is the single exception and
/// replaces the whole sequence. The observer is notified after every
/// append.
pub struct ConversationLog {
    messages: Vec<Message>,
    /// Keeps counting across `clear` so ids never repeat within a session.
    next_seq: u64,
    last_timestamp_ms: i64,
    observer: Arc<dyn SessionObserver>,
}

impl ConversationLog {
    /// Creates an empty log reporting appends to `observer`.
    pub fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            messages: Vec::new(),
            next_seq: 0,
            last_timestamp_ms: 0,
            observer,
        }
    }

    /// Finalizes `draft` with an id and timestamp, inserts it at the tail,
    /// and returns the immutable message.
    pub fn append(&mut self, draft: MessageDraft) -> Message {
        let created_at = Utc::now();
        // Clamp to non-decreasing so id order equals append order even if
        // the wall clock steps backwards.
        let timestamp_ms = created_at.timestamp_millis().max(self.last_timestamp_ms);
        self.last_timestamp_ms = timestamp_ms;

        let message = Message {
            id: MessageId::new(timestamp_ms, self.next_seq),
            role: draft.role,
            agent: draft.agent,
            body: draft.body,
            created_at,
        };
        self.next_seq += 1;

        self.messages.push(message.clone());
        self.observer.message_appended(&message);
        message
    }

    /// Looks up a message by id.
    pub fn find(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    /// Position of a message in log order.
    pub fn index_of(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|message| message.id == id)
    }

    /// Message at `index` in log order.
    pub fn message_at(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// The most recently appended message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replaces the entire sequence with a single system greeting.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.append(MessageDraft::system(CLEAR_GREETING));
    }

    /// Read-only copy of the log for export; the live log stays append-only
    /// from the caller's perspective.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::conversation::MessageRole;
    use crate::observer::NullObserver;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct AppendRecorder {
        appended: Mutex<Vec<Message>>,
    }

    impl AppendRecorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                appended: Mutex::new(Vec::new()),
            })
        }
    }

    impl SessionObserver for AppendRecorder {
        fn message_appended(&self, message: &Message) {
            self.appended.lock().unwrap().push(message.clone());
        }
    }

    fn plain_log() -> ConversationLog {
        ConversationLog::new(Arc::new(NullObserver))
    }

    #[test]
    fn test_snapshot_preserves_order_and_ids_are_unique() {
        let mut log = plain_log();

        for i in 0..50 {
            log.append(MessageDraft::user(format!("message {i}")));
        }

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 50);
        for (i, message) in snapshot.iter().enumerate() {
            assert_eq!(message.body.as_text(), Some(format!("message {i}").as_str()));
        }

        let ids: HashSet<MessageId> = snapshot.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 50);

        // Append order equals id order even within one millisecond
        let mut sorted = snapshot.clone();
        sorted.sort_by_key(|m| m.id);
        assert_eq!(sorted, snapshot);
    }

    #[test]
    fn test_find_and_index_of() {
        let mut log = plain_log();
        let first = log.append(MessageDraft::user("one"));
        let second = log.append(MessageDraft::agent(AgentId::Spacex, "two"));

        assert_eq!(log.find(second.id), Some(&second));
        assert_eq!(log.index_of(first.id), Some(0));
        assert_eq!(log.index_of(second.id), Some(1));

        let absent: MessageId = "1-999".parse().unwrap();
        assert_eq!(log.find(absent), None);
        assert_eq!(log.index_of(absent), None);
    }

    #[test]
    fn test_clear_leaves_exactly_one_system_message() {
        let mut log = plain_log();
        for _ in 0..10 {
            log.append(MessageDraft::user("hello"));
        }

        log.clear();

        assert_eq!(log.len(), 1);
        let greeting = log.message_at(0).unwrap();
        assert_eq!(greeting.role, MessageRole::System);
        assert_eq!(greeting.body.as_text(), Some(CLEAR_GREETING));

        // Clearing an already-cleared log still yields exactly one message
        log.clear();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_clear_on_an_empty_log() {
        let mut log = plain_log();
        log.clear();

        assert_eq!(log.len(), 1);
        assert_eq!(log.message_at(0).unwrap().body.as_text(), Some(CLEAR_GREETING));
    }

    #[test]
    fn test_ids_do_not_repeat_across_clear() {
        let mut log = plain_log();
        let before = log.append(MessageDraft::user("before"));

        log.clear();
        let after = log.append(MessageDraft::user("after"));

        assert_ne!(before.id, after.id);
        assert!(before.id < after.id);
    }

    #[test]
    fn test_snapshot_is_a_defensive_copy() {
        let mut log = plain_log();
        log.append(MessageDraft::user("kept"));

        let mut snapshot = log.snapshot();
        snapshot.clear();

        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_observer_sees_every_append_including_clear_greeting() {
        let recorder = AppendRecorder::new();
        let mut log = ConversationLog::new(recorder.clone());

        log.append(MessageDraft::user("first"));
        log.append(MessageDraft::system("second"));
        log.clear();

        let appended = recorder.appended.lock().unwrap();
        assert_eq!(appended.len(), 3);
        assert_eq!(appended[0].body.as_text(), Some("first"));
        assert_eq!(appended[2].body.as_text(), Some(CLEAR_GREETING));
    }
}

//! Conversation storage seam.

use std::collections::HashMap;

use crate::types::{Conversation, Participant};

/// Storage operations the tracker needs. Synchronous on purpose: the
/// tracker runs single-threaded behind the gateway's mutex, and records are
/// never partially mutated across an await point.
pub trait ConversationStore: Send {
    fn get(&self, id: &str) -> Option<&Conversation>;
    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation>;
    fn put(&mut self, conversation: Conversation);
    /// Remove a conversation; returns whether it existed.
    fn delete(&mut self, id: &str) -> bool;
    /// All conversations in insertion order.
    fn list(&self) -> Vec<&Conversation>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn participant(&self, id: &str) -> Option<&Participant>;
    fn participant_mut(&mut self, id: &str) -> Option<&mut Participant>;
    fn put_participant(&mut self, participant: Participant);
}

/// In-process store; the default. Keeps insertion order for the recency
/// queries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: HashMap<String, Conversation>,
    order: Vec<String>,
    participants: HashMap<String, Participant>,
}

impl ConversationStore for MemoryStore {
    fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.get_mut(id)
    }

    fn put(&mut self, conversation: Conversation) {
        if !self.conversations.contains_key(&conversation.conversation_id) {
            self.order.push(conversation.conversation_id.clone());
        }
        self.conversations.insert(conversation.conversation_id.clone(), conversation);
    }

    fn delete(&mut self, id: &str) -> bool {
        let removed = self.conversations.remove(id).is_some();
        if removed {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    fn list(&self) -> Vec<&Conversation> {
        self.order.iter().filter_map(|id| self.conversations.get(id)).collect()
    }

    fn len(&self) -> usize {
        self.conversations.len()
    }

    fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    fn participant_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    fn put_participant(&mut self, participant: Participant) {
        self.participants.insert(participant.participant_id.clone(), participant);
    }
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::Utc};

    #[test]
    fn listing_preserves_insertion_order_across_updates() {
        let mut store = MemoryStore::default();
        let now = Utc::now();
        store.put(Conversation::new("a", "+15550000001", now));
        store.put(Conversation::new("b", "+15550000002", now));
        store.put(Conversation::new("c", "+15550000003", now));

        // Re-putting an existing id must not move it to the back.
        store.put(Conversation::new("a", "+15550000001", now));

        let ids: Vec<&str> =
            store.list().iter().map(|c| c.conversation_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn delete_removes_record_and_order_entry() {
        let mut store = MemoryStore::default();
        let now = Utc::now();
        store.put(Conversation::new("a", "+15550000001", now));
        store.put(Conversation::new("b", "+15550000002", now));

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert_eq!(store.len(), 1);
        let ids: Vec<&str> =
            store.list().iter().map(|c| c.conversation_id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn participants_are_keyed_by_id() {
        let mut store = MemoryStore::default();
        let now = Utc::now();
        store.put_participant(Participant::new("+15550000001", now));

        if let Some(participant) = store.participant_mut("+15550000001") {
            participant.total_events = 3;
        }
        assert_eq!(store.participant("+15550000001").map(|p| p.total_events), Some(3));
        assert!(store.participant("+15559999999").is_none());
    }
}

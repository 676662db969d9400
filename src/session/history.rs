use std::sync::Arc;

use crate::chat::Conversation;
use crate::storage::ConversationStore;

/// In-memory conversation list backed by a [`ConversationStore`].
///
/// Persistence is best-effort on both ends: a load failure starts from an
/// empty list, a save failure is logged and swallowed. A failed save must
/// never fail a send that already streamed successfully.
pub struct ConversationHistory {
    store: Arc<dyn ConversationStore>,
    conversations: Vec<Conversation>,
}

impl ConversationHistory {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        let conversations = match store.load() {
            Ok(conversations) => conversations,
            Err(err) => {
                log::warn!("failed to load conversation history: {err}");
                Vec::new()
            }
        };
        Self {
            store,
            conversations,
        }
    }

    /// Replace the stored copy of `conversation` (matched by id) or append
    /// it, then persist the whole list.
    pub fn upsert(&mut self, conversation: Conversation) {
        match self
            .conversations
            .iter_mut()
            .find(|existing| existing.id == conversation.id)
        {
            Some(existing) => *existing = conversation,
            None => self.conversations.push(conversation),
        }
        self.persist();
    }

    pub fn remove(&mut self, id: &str) {
        self.conversations.retain(|conversation| conversation.id != id);
        self.persist();
    }

    /// Conversations ordered most recently updated first.
    pub fn sorted_recent(&self) -> Vec<&Conversation> {
        let mut conversations: Vec<&Conversation> = self.conversations.iter().collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.conversations) {
            log::warn!("failed to persist conversation history: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentType;
    use crate::storage::InMemoryStore;

    #[test]
    fn upsert_replaces_by_id() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = ConversationHistory::new(store.clone());

        let mut conversation = Conversation::new(AgentType::TradingAgent);
        history.upsert(conversation.clone());
        conversation.touch();
        history.upsert(conversation.clone());

        assert_eq!(history.len(), 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn sorted_recent_orders_by_updated_at_descending() {
        let mut history = ConversationHistory::new(Arc::new(InMemoryStore::new()));

        let older = Conversation::new(AgentType::TradingAgent);
        let mut newer = Conversation::new(AgentType::InvestmentAdvisor);
        newer.updated_at = older.updated_at + chrono::Duration::seconds(5);

        history.upsert(older.clone());
        history.upsert(newer.clone());

        let sorted = history.sorted_recent();
        assert_eq!(sorted[0].id, newer.id);
        assert_eq!(sorted[1].id, older.id);
    }

    #[test]
    fn remove_drops_the_conversation() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = ConversationHistory::new(store.clone());

        let conversation = Conversation::new(AgentType::TradingAgent);
        history.upsert(conversation.clone());
        history.remove(&conversation.id);

        assert!(history.is_empty());
        assert!(store.load().unwrap().is_empty());
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::agent::AgentType;

/// Memoized agent-type → server conversation id map.
///
/// One instance is shared by every controller in the process (clone the
/// handle, it is an `Arc` underneath). Entries are written once, on the
/// first successful resolution for an agent; failed resolutions cache
/// nothing. The lock is never held across an await.
#[derive(Clone, Default)]
pub struct ConversationIdCache {
    inner: Arc<Mutex<HashMap<AgentType, u64>>>,
}

impl ConversationIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, agent: AgentType) -> Option<u64> {
        self.inner.lock().expect("id cache lock poisoned").get(&agent).copied()
    }

    pub fn insert(&self, agent: AgentType, id: u64) {
        self.inner
            .lock()
            .expect("id cache lock poisoned")
            .insert(agent, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_is_shared_between_clones() {
        let cache = ConversationIdCache::new();
        let other = cache.clone();

        assert_eq!(cache.get(AgentType::TradingAgent), None);
        other.insert(AgentType::TradingAgent, 9);
        assert_eq!(cache.get(AgentType::TradingAgent), Some(9));
        assert_eq!(cache.get(AgentType::InvestmentAdvisor), None);
    }
}

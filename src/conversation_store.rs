//! # Conversation Store Module
//!
//! Per-sender conversation tracking. The store is an explicit abstraction so
//! the dispatcher can be driven against test doubles, and the default
//! in-memory implementation is bounded in size and forgets idle senders.

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::ConversationConfig;
use crate::conversation::ConversationState;

/// Storage for the conversation state of each sender
pub trait ConversationStore: Send + Sync {
    /// Current state, `None` for a sender with no conversation
    fn get(&self, sender: &str) -> Option<ConversationState>;

    fn set_state(&self, sender: &str, state: ConversationState);

    /// Forget the sender; the next event starts a new conversation
    fn remove(&self, sender: &str);

    /// Number of tracked conversations
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current state, starting a new conversation in `Menu` when absent
    fn get_or_create(&self, sender: &str) -> ConversationState {
        match self.get(sender) {
            Some(state) => state,
            None => {
                debug!(sender = %sender, "Starting new conversation");
                let state = ConversationState::default();
                self.set_state(sender, state);
                state
            }
        }
    }
}

/// In-memory conversation store with capacity and idle-time bounds
///
/// Writes are always admitted. When the capacity is reached the least recently
/// used sender is evicted, and a sender idle for longer than the configured
/// time is forgotten. Either
/// way the sender simply starts over at the welcome menu.
pub struct InMemoryConversationStore {
    states: Cache<String, ConversationState>,
}

impl InMemoryConversationStore {
    pub fn new(config: &ConversationConfig) -> Self {
        Self {
            states: Cache::builder()
                .max_capacity(config.max_conversations)
                .eviction_policy(EvictionPolicy::lru())
                .time_to_idle(config.idle_timeout())
                .build(),
        }
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(&ConversationConfig::default())
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn get(&self, sender: &str) -> Option<ConversationState> {
        self.states.get(sender)
    }

    fn set_state(&self, sender: &str, state: ConversationState) {
        self.states.insert(sender.to_string(), state);
    }

    fn remove(&self, sender: &str) {
        self.states.invalidate(sender);
    }

    fn len(&self) -> u64 {
        self.states.run_pending_tasks();
        self.states.entry_count()
    }
}

/// Per-sender async locks serializing the handling of each sender's events
///
/// Different senders never contend. Locks follow the same bounds as the
/// store so they do not accumulate either.
pub struct SenderLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl SenderLocks {
    pub fn new(config: &ConversationConfig) -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(config.max_conversations)
                .eviction_policy(EvictionPolicy::lru())
                .time_to_idle(config.idle_timeout())
                .build(),
        }
    }

    /// The lock guarding `sender`, created on first use
    pub fn lock_for(&self, sender: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(sender.to_string(), || Arc::new(Mutex::new(())))
    }
}

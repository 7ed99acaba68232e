use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

// ============================================================================
// Idempotency Registry
// ============================================================================
//
// Maps (owner, request kind, caller key) to the aggregate created for it.
// A key is reserved before any side effect happens, so a retried call that
// races the original observes the reservation instead of creating a twin.
// The reservation stays pending until the aggregate is persisted; only a
// committed entry is ever handed back as an existing request.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyScope {
    pub owner_id: Uuid,
    pub kind: &'static str,
    pub key: String,
}

impl IdempotencyScope {
    pub fn new(owner_id: Uuid, kind: &'static str, key: impl Into<String>) -> Self {
        Self { owner_id, kind, key: key.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The key was free and now belongs to the candidate id
    New(Uuid),
    /// The key was already used for this aggregate
    Existing(Uuid),
    /// Another call holds the key and has not persisted its aggregate yet
    InProgress(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Pending(Uuid),
    Committed(Uuid),
}

impl Entry {
    fn id(self) -> Uuid {
        match self {
            Entry::Pending(id) | Entry::Committed(id) => id,
        }
    }
}

#[derive(Default)]
pub struct IdempotencyRegistry {
    entries: RwLock<HashMap<IdempotencyScope, Entry>>,
}

impl IdempotencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reserve(&self, scope: IdempotencyScope, candidate_id: Uuid) -> Reservation {
        let mut entries = self.entries.write().await;
        match entries.get(&scope) {
            Some(Entry::Committed(existing)) => Reservation::Existing(*existing),
            Some(Entry::Pending(holder)) => Reservation::InProgress(*holder),
            None => {
                entries.insert(scope, Entry::Pending(candidate_id));
                Reservation::New(candidate_id)
            }
        }
    }

    /// Mark a pending reservation as persisted so replays can resolve it
    pub async fn commit(&self, scope: &IdempotencyScope, candidate_id: Uuid) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(scope) {
            if entry.id() == candidate_id {
                *entry = Entry::Committed(candidate_id);
            }
        }
    }

    /// Drop a reservation whose creation failed so the caller may retry
    pub async fn release(&self, scope: &IdempotencyScope, candidate_id: Uuid) {
        let mut entries = self.entries.write().await;
        if entries.get(scope) == Some(&Entry::Pending(candidate_id)) {
            entries.remove(scope);
        }
    }

    /// The committed aggregate for a key; pending reservations are not visible
    pub async fn lookup(&self, scope: &IdempotencyScope) -> Option<Uuid> {
        match self.entries.read().await.get(scope) {
            Some(Entry::Committed(id)) => Some(*id),
            _ => None,
        }
    }
}

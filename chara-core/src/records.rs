use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entity::{Character, CharacterId, CharacterPatch, NewCharacter};

/// Narrow CRUD surface of the record store.
///
/// The store is authoritative for identity: it assigns ids on insert and
/// must never hand out an id twice. Failures are plain `anyhow` errors;
/// the lifecycle turns them into internal errors.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record.
    async fn find(&self, id: CharacterId) -> Result<Option<Character>>;

    /// All records, ordered by id.
    async fn list(&self) -> Result<Vec<Character>>;

    /// Insert and return the record with its new id.
    async fn insert(&self, data: NewCharacter) -> Result<Character>;

    /// Apply a partial update. `None` when the record no longer exists.
    async fn update(&self, id: CharacterId, patch: CharacterPatch) -> Result<Option<Character>>;

    /// Delete. Returns whether a record was actually removed.
    async fn remove(&self, id: CharacterId) -> Result<bool>;
}

#[derive(Default)]
struct MemoryState {
    last_id: CharacterId,
    rows: BTreeMap<CharacterId, Character>,
}

/// In-process record store. Ids come from a counter that only grows.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, id: CharacterId) -> Result<Option<Character>> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Character>> {
        Ok(self.state.read().await.rows.values().cloned().collect())
    }

    async fn insert(&self, data: NewCharacter) -> Result<Character> {
        let mut state = self.state.write().await;
        state.last_id += 1;

        let record = Character {
            id: state.last_id,
            name: data.name,
            age: data.age,
            image_ref: data.image_ref,
        };
        state.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: CharacterId, patch: CharacterPatch) -> Result<Option<Character>> {
        let mut state = self.state.write().await;
        let Some(existing) = state.rows.get_mut(&id) else {
            return Ok(None);
        };

        *existing = patch.apply_to(existing);
        Ok(Some(existing.clone()))
    }

    async fn remove(&self, id: CharacterId) -> Result<bool> {
        Ok(self.state.write().await.rows.remove(&id).is_some())
    }
}

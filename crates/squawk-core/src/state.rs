//! Persisted bot state.
//!
//! The state is a JSON object whose top-level keys ("slots") are declared by
//! a [`StateSchema`] together with their default values. A [`StateStore`]
//! owns the object and writes it back through an injected [`Persistence`]
//! capability.
//!
//! # Lifecycle
//!
//! 1. [`StateStore::load`] reads the blob once at startup.
//! 2. [`StateStore::reconcile`] inserts the defaults of missing slots.
//! 3. Handlers mutate the store in place and call [`StateStore::save`] after
//!    every mutation. There is no batching: the process has no clean
//!    shutdown hook, so every change is flushed immediately.
//!
//! [`StateStore::init`] performs steps 1 and 2 and saves only when
//! reconciliation changed something.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{PersistenceError, PersistenceResult, StateError, StateResult};

/// Slot holding the user-defined template commands (`name → template`).
pub const TEMPLATE_COMMANDS_SLOT: &str = "template_commands";

// =============================================================================
// Persistence capability
// =============================================================================

/// Storage backend for the state blob.
///
/// The store treats the blob as an opaque JSON object; implementations only
/// move it to and from their medium.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Loads the named blob.
    async fn load_blob(&self, name: &str) -> PersistenceResult<Value>;

    /// Replaces the named blob.
    async fn save_blob(&self, name: &str, value: &Value) -> PersistenceResult<()>;
}

/// In-memory [`Persistence`] that counts writes.
///
/// Unknown blobs load as an empty object.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Value>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a blob (builder pattern).
    pub fn with_blob(self, name: impl Into<String>, value: Value) -> Self {
        self.lock().insert(name.into(), value);
        self
    }

    /// Returns the number of completed saves.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Returns a copy of the named blob.
    pub fn blob(&self, name: &str) -> Option<Value> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        // A poisoned map still holds consistent JSON values.
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn load_blob(&self, name: &str) -> PersistenceResult<Value> {
        Ok(self
            .lock()
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    async fn save_blob(&self, name: &str, value: &Value) -> PersistenceResult<()> {
        self.lock().insert(name.to_string(), value.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Declared state slots and their default values.
///
/// Slots are kept sorted by name, which gives reconciliation a stable order.
///
/// ```rust
/// use serde_json::json;
/// use squawk_core::StateSchema;
///
/// let schema = StateSchema::new()
///     .slot("template_commands", json!({}))
///     .slot("quotes", json!([]));
/// assert_eq!(schema.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSchema {
    slots: BTreeMap<String, Value>,
}

impl StateSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a slot (builder pattern).
    pub fn slot(mut self, name: impl Into<String>, default: Value) -> Self {
        self.slots.insert(name.into(), default);
        self
    }

    /// Returns the default of a declared slot.
    pub fn default_of(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Returns true if the slot is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Iterates over `(slot, default)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of declared slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot is declared.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl FromIterator<(String, Value)> for StateSchema {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// StateStore
// =============================================================================

/// The mutable, persisted state of one bot instance.
///
/// A store is owned by exactly one bot and handed to handlers by mutable
/// reference; it is never shared across instances.
pub struct StateStore {
    name: String,
    values: Map<String, Value>,
    persistence: Arc<dyn Persistence>,
}

impl StateStore {
    /// Loads the named blob from `persistence`.
    ///
    /// Fails with [`PersistenceError::Malformed`] if the blob is not a JSON
    /// object.
    pub async fn load(
        persistence: Arc<dyn Persistence>,
        name: impl Into<String>,
    ) -> PersistenceResult<Self> {
        let name = name.into();
        let values = match persistence.load_blob(&name).await? {
            Value::Object(map) => map,
            other => {
                return Err(PersistenceError::malformed(
                    &name,
                    format!("expected a JSON object, found {}", json_type(&other)),
                ));
            }
        };

        debug!(blob = %name, slots = values.len(), "State loaded");

        Ok(Self {
            name,
            values,
            persistence,
        })
    }

    /// Loads the blob, reconciles it against `schema`, and saves it if
    /// reconciliation added any slot.
    pub async fn init(
        persistence: Arc<dyn Persistence>,
        name: impl Into<String>,
        schema: &StateSchema,
    ) -> PersistenceResult<Self> {
        let mut store = Self::load(persistence, name).await?;
        if store.reconcile(schema) {
            store.save().await?;
        }
        Ok(store)
    }

    /// Inserts the default of every schema slot that is missing.
    ///
    /// Returns true if anything was inserted. Existing slots are never
    /// touched, so a second call with the same schema returns false.
    pub fn reconcile(&mut self, schema: &StateSchema) -> bool {
        let mut is_dirty = false;
        for (slot, default) in schema.iter() {
            if !self.values.contains_key(slot) {
                info!(slot = %slot, "Adding missing state slot");
                self.values.insert(slot.to_string(), default.clone());
                is_dirty = true;
            }
        }
        is_dirty
    }

    /// Writes the whole state through the persistence capability.
    pub async fn save(&self) -> PersistenceResult<()> {
        let blob = Value::Object(self.values.clone());
        self.persistence.save_blob(&self.name, &blob).await?;
        debug!(blob = %self.name, "State saved");
        Ok(())
    }

    /// Returns the blob name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all slots.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Returns a slot's value.
    pub fn get(&self, slot: &str) -> Option<&Value> {
        self.values.get(slot)
    }

    /// Returns a slot's value mutably.
    pub fn get_mut(&mut self, slot: &str) -> Option<&mut Value> {
        self.values.get_mut(slot)
    }

    /// Replaces a slot's value.
    pub fn set(&mut self, slot: impl Into<String>, value: Value) {
        self.values.insert(slot.into(), value);
    }

    /// Returns an object slot.
    pub fn object(&self, slot: &str) -> StateResult<&Map<String, Value>> {
        self.require(slot)?
            .as_object()
            .ok_or_else(|| wrong_type(slot, "an object"))
    }

    /// Returns an object slot mutably.
    pub fn object_mut(&mut self, slot: &str) -> StateResult<&mut Map<String, Value>> {
        self.require_mut(slot)?
            .as_object_mut()
            .ok_or_else(|| wrong_type(slot, "an object"))
    }

    /// Returns a list slot.
    pub fn list(&self, slot: &str) -> StateResult<&Vec<Value>> {
        self.require(slot)?
            .as_array()
            .ok_or_else(|| wrong_type(slot, "a list"))
    }

    /// Returns a list slot mutably.
    pub fn list_mut(&mut self, slot: &str) -> StateResult<&mut Vec<Value>> {
        self.require_mut(slot)?
            .as_array_mut()
            .ok_or_else(|| wrong_type(slot, "a list"))
    }

    /// Returns an integer slot.
    pub fn counter(&self, slot: &str) -> StateResult<i64> {
        self.require(slot)?
            .as_i64()
            .ok_or_else(|| wrong_type(slot, "an integer"))
    }

    /// Adds one to an integer slot and returns the new value.
    pub fn increment(&mut self, slot: &str) -> StateResult<i64> {
        let next = self.counter(slot)?.saturating_add(1);
        self.set(slot, Value::from(next));
        Ok(next)
    }

    /// Returns the template command map.
    pub fn template_commands(&self) -> StateResult<&Map<String, Value>> {
        self.object(TEMPLATE_COMMANDS_SLOT)
    }

    /// Returns the template command map mutably.
    pub fn template_commands_mut(&mut self) -> StateResult<&mut Map<String, Value>> {
        self.object_mut(TEMPLATE_COMMANDS_SLOT)
    }

    /// Looks up a template by command name.
    ///
    /// Returns `None` if the template slot is absent or the entry is not a
    /// string.
    pub fn template(&self, name: &str) -> Option<&str> {
        self.template_commands().ok()?.get(name)?.as_str()
    }

    fn require(&self, slot: &str) -> StateResult<&Value> {
        self.values
            .get(slot)
            .ok_or_else(|| StateError::MissingSlot(slot.to_string()))
    }

    fn require_mut(&mut self, slot: &str) -> StateResult<&mut Value> {
        self.values
            .get_mut(slot)
            .ok_or_else(|| StateError::MissingSlot(slot.to_string()))
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("name", &self.name)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

fn wrong_type(slot: &str, expected: &'static str) -> StateError {
    StateError::WrongType {
        slot: slot.to_string(),
        expected,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> StateSchema {
        StateSchema::new()
            .slot("template_commands", json!({}))
            .slot("counter", json!(0))
    }

    #[tokio::test]
    async fn test_init_fills_defaults_and_saves_once() {
        let persistence = Arc::new(MemoryStore::new().with_blob("state.json", json!({})));
        let store = StateStore::init(persistence.clone(), "state.json", &schema())
            .await
            .unwrap();

        let expected = json!({"template_commands": {}, "counter": 0});
        assert_eq!(Value::Object(store.values().clone()), expected);
        assert_eq!(persistence.saves(), 1);
        assert_eq!(persistence.blob("state.json"), Some(expected));
    }

    #[tokio::test]
    async fn test_init_complete_state_does_not_save() {
        let persistence = Arc::new(
            MemoryStore::new().with_blob("s", json!({"template_commands": {"hi": "hello"}, "counter": 4})),
        );
        let store = StateStore::init(persistence.clone(), "s", &schema()).await.unwrap();

        assert_eq!(persistence.saves(), 0);
        assert_eq!(store.counter("counter").unwrap(), 4);
        assert_eq!(store.template("hi"), Some("hello"));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let persistence = Arc::new(MemoryStore::new());
        let mut store = StateStore::load(persistence, "s").await.unwrap();

        assert!(store.reconcile(&schema()));
        let after_first = store.values().clone();
        assert!(!store.reconcile(&schema()));
        assert_eq!(store.values(), &after_first);
    }

    #[tokio::test]
    async fn test_reconcile_keeps_existing_values() {
        let persistence = Arc::new(MemoryStore::new().with_blob("s", json!({"counter": 9, "extra": true})));
        let mut store = StateStore::load(persistence, "s").await.unwrap();

        assert!(store.reconcile(&schema()));
        assert_eq!(store.counter("counter").unwrap(), 9);
        assert_eq!(store.get("extra"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_load_rejects_non_object() {
        let persistence = Arc::new(MemoryStore::new().with_blob("s", json!([1, 2])));
        let err = StateStore::load(persistence, "s").await.unwrap_err();
        assert!(matches!(err, PersistenceError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_typed_access_errors() {
        let persistence = Arc::new(MemoryStore::new().with_blob("s", json!({"quotes": "nope"})));
        let mut store = StateStore::load(persistence, "s").await.unwrap();

        assert!(matches!(store.list("quotes"), Err(StateError::WrongType { .. })));
        assert!(matches!(store.increment("missing"), Err(StateError::MissingSlot(_))));
        assert_eq!(store.template("anything"), None);
    }

    #[tokio::test]
    async fn test_increment() {
        let persistence = Arc::new(MemoryStore::new().with_blob("s", json!({"bigbrain_counter": 1})));
        let mut store = StateStore::load(persistence, "s").await.unwrap();

        assert_eq!(store.increment("bigbrain_counter").unwrap(), 2);
        assert_eq!(store.counter("bigbrain_counter").unwrap(), 2);
    }
}

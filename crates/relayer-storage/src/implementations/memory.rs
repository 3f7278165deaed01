//! In-memory storage backend.
//!
//! Nothing survives a restart. Entries stored with a TTL are hidden once
//! expired and dropped by `cleanup_expired`.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use relayer_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Slot {
	value: Vec<u8>,
	expires_at: Option<Instant>,
}

impl Slot {
	fn is_expired(&self, now: Instant) -> bool {
		self.expires_at.is_some_and(|at| now >= at)
	}
}

/// HashMap-backed storage.
pub struct MemoryStorage {
	store: RwLock<HashMap<String, Slot>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self {
			store: RwLock::new(HashMap::new()),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		match store.get(key) {
			Some(slot) if !slot.is_expired(Instant::now()) => Ok(slot.value.clone()),
			_ => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let expires_at = ttl
			.filter(|ttl| !ttl.is_zero())
			.map(|ttl| Instant::now() + ttl);
		self.store
			.write()
			.await
			.insert(key.to_string(), Slot { value, expires_at });
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		self.store.write().await.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.get(key)
			.is_some_and(|slot| !slot.is_expired(Instant::now())))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let now = Instant::now();
		let mut store = self.store.write().await;
		let before = store.len();
		store.retain(|_, slot| !slot.is_expired(now));
		Ok(before - store.len())
	}
}

/// Memory storage takes no settings.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).deny_unknown().validate(config)
	}
}

/// Creates a memory backend. The section must be empty.
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryStorage::new()))
}

/// Registry for the memory backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();
		let value = b"payload".to_vec();

		storage.set_bytes("k", value.clone(), None).await.unwrap();
		assert_eq!(storage.get_bytes("k").await.unwrap(), value);
		assert!(storage.exists("k").await.unwrap());

		storage.delete("k").await.unwrap();
		assert!(!storage.exists("k").await.unwrap());
		assert!(matches!(
			storage.get_bytes("k").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_ttl_expiry_and_cleanup() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("short", b"a".to_vec(), Some(Duration::from_secs(10)))
			.await
			.unwrap();
		storage.set_bytes("forever", b"b".to_vec(), None).await.unwrap();

		tokio::time::advance(Duration::from_secs(9)).await;
		assert!(storage.exists("short").await.unwrap());

		tokio::time::advance(Duration::from_secs(1)).await;
		assert!(!storage.exists("short").await.unwrap());
		assert!(storage.get_bytes("short").await.is_err());

		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert!(storage.exists("forever").await.unwrap());
	}

	#[test]
	fn test_factory_rejects_settings() {
		let empty = toml::Value::Table(toml::map::Map::new());
		assert!(create_storage(&empty).is_ok());

		let configured: toml::Value = toml::from_str("storage_path = \"x\"").unwrap();
		assert!(matches!(
			create_storage(&configured),
			Err(StorageError::Configuration(_))
		));
	}
}

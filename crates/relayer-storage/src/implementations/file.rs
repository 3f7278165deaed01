//! File storage backend.
//!
//! One file per key under `storage_path`. Every file starts with a 16 byte
//! header holding the expiry so expired entries can be swept without
//! decoding their payload:
//!
//! - `[0..4]`: magic `RLYS`
//! - `[4..6]`: format version, little-endian u16
//! - `[6..14]`: expiry as UNIX seconds, little-endian u64, 0 = never
//! - `[14..16]`: reserved

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use relayer_types::{
	current_timestamp, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, StorageKey,
	ValidationError,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

const DEFAULT_STORAGE_PATH: &str = "./data/storage";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
	expires_at: u64,
}

impl Header {
	const MAGIC: &'static [u8; 4] = b"RLYS";
	const VERSION: u16 = 1;
	const SIZE: usize = 16;

	fn with_ttl(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			current_timestamp().saturating_add(ttl.as_secs().max(1))
		};
		Self { expires_at }
	}

	fn encode(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&Self::VERSION.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE || &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Missing storage header".into()));
		}
		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}
		let mut expiry = [0u8; 8];
		expiry.copy_from_slice(&bytes[6..14]);
		Ok(Self {
			expires_at: u64::from_le_bytes(expiry),
		})
	}

	fn is_expired(&self, now: u64) -> bool {
		self.expires_at != 0 && now >= self.expires_at
	}
}

/// Default TTLs per storage namespace, from `ttl_<namespace>` settings.
#[derive(Debug, Clone, Default)]
pub struct TtlConfig {
	ttls: HashMap<StorageKey, Duration>,
}

impl TtlConfig {
	fn from_config(config: &toml::Value) -> Self {
		let ttls = StorageKey::all()
			.filter_map(|key| {
				config
					.get(format!("ttl_{}", key.as_str()))
					.and_then(|v| v.as_integer())
					.map(|secs| (key, Duration::from_secs(secs.max(0) as u64)))
			})
			.collect();
		Self { ttls }
	}

	fn for_key(&self, key: &str) -> Duration {
		key.split(':')
			.next()
			.and_then(|ns| ns.parse::<StorageKey>().ok())
			.and_then(|ns| self.ttls.get(&ns).copied())
			.unwrap_or(Duration::ZERO)
	}
}

/// File-per-key storage.
pub struct FileStorage {
	base_path: PathBuf,
	ttl_config: TtlConfig,
}

impl FileStorage {
	pub fn new(base_path: PathBuf, ttl_config: TtlConfig) -> Self {
		Self {
			base_path,
			ttl_config,
		}
	}

	fn file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}

	async fn read_entry(&self, path: &Path) -> Result<Option<(Header, Vec<u8>)>, StorageError> {
		let data = match fs::read(path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};
		let header = Header::decode(&data)?;
		Ok(Some((header, data[Header::SIZE..].to_vec())))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		match self.read_entry(&self.file_path(key)).await? {
			Some((header, payload)) if !header.is_expired(current_timestamp()) => Ok(payload),
			_ => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let ttl = ttl.unwrap_or_else(|| self.ttl_config.for_key(key));
		let mut data = Vec::with_capacity(Header::SIZE + value.len());
		data.extend_from_slice(&Header::with_ttl(ttl).encode());
		data.extend_from_slice(&value);

		// write then rename so readers never see a partial file
		let path = self.file_path(key);
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.file_path(key)).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self
			.read_entry(&self.file_path(key))
			.await?
			.is_some_and(|(header, _)| !header.is_expired(current_timestamp())))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let now = current_timestamp();
		let mut removed = 0;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension().and_then(|e| e.to_str()) != Some("bin") {
				continue;
			}
			match self.read_entry(&path).await {
				Ok(Some((header, _))) if header.is_expired(now) => {
					if let Err(e) = fs::remove_file(&path).await {
						tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired file");
					} else {
						removed += 1;
					}
				},
				Ok(_) => {},
				Err(e) => {
					tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable file");
				},
			}
		}
		Ok(removed)
	}
}

/// Settings: optional `storage_path` and `ttl_<namespace>` seconds.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let mut optional = vec![Field::new("storage_path", FieldType::String).with_validator(
			|v| match v.as_str() {
				Some(path) if path.trim().is_empty() => Err("must not be empty".into()),
				_ => Ok(()),
			},
		)];
		optional.extend(StorageKey::all().map(|key| {
			Field::new(
				format!("ttl_{}", key.as_str()),
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			)
		}));
		Schema::new(vec![], optional).deny_unknown().validate(config)
	}
}

/// Creates a file backend.
///
/// - `storage_path`: base directory (default `./data/storage`)
/// - `ttl_history`, `ttl_history_index`: default TTL in seconds, 0 keeps forever
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		TtlConfig::from_config(config),
	)))
}

/// Registry for the file backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

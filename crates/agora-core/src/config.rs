//! Runtime configuration shared by the desktop shell and the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::attachment::DEFAULT_BUCKET;
use crate::backend::{ChatBackend, LocalBackend, MemoryBackend, SupabaseBackend};
use crate::error::{ChatError, ChatResult};
use crate::identity::{IdentityStore, MemoryIdentityStore};
use crate::storage::Storage;

/// Database file inside the data directory
pub const DATABASE_FILE: &str = "agora.redb";

/// Which backend the room talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// redb and blob files in the data directory
    Local,
    /// Nothing persisted
    Memory,
    /// Hosted project
    Supabase { url: String, anon_key: String },
}

/// Identity store and backend for one app instance
#[derive(Clone)]
pub struct ChatServices {
    pub identity: Arc<dyn IdentityStore>,
    pub backend: Arc<dyn ChatBackend>,
}

/// Everything needed to open a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub data_dir: PathBuf,
    pub backend: BackendConfig,
    pub bucket: String,
}

impl ChatConfig {
    /// Local backend in `data_dir` with the default bucket
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backend: BackendConfig::Local,
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }

    /// Assemble a config from command-line and environment values.
    ///
    /// A hosted URL selects the hosted backend and then requires a key;
    /// `memory` wins over both.
    pub fn resolve(
        data_dir: impl Into<PathBuf>,
        url: Option<String>,
        anon_key: Option<String>,
        bucket: Option<String>,
        memory: bool,
    ) -> ChatResult<Self> {
        let backend = match (memory, url.filter(|u| !u.trim().is_empty())) {
            (true, _) => BackendConfig::Memory,
            (false, Some(url)) => {
                let anon_key = anon_key
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        ChatError::Config("a backend URL needs an anon key as well".to_string())
                    })?;
                BackendConfig::Supabase { url, anon_key }
            }
            (false, None) => BackendConfig::Local,
        };

        Ok(Self {
            data_dir: data_dir.into(),
            backend,
            bucket: bucket
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    /// Open the device database (identity and local messages).
    pub fn open_storage(&self) -> ChatResult<Storage> {
        Storage::new(self.database_path())
    }

    /// Build the configured backend.
    ///
    /// The local backend shares `storage` with the identity gate, since the
    /// database file can only be opened once.
    pub fn connect(&self, storage: &Storage) -> ChatResult<Arc<dyn ChatBackend>> {
        let backend: Arc<dyn ChatBackend> = match &self.backend {
            BackendConfig::Local => Arc::new(LocalBackend::new(
                storage.clone(),
                self.blobs_dir(),
                &self.bucket,
            )),
            BackendConfig::Memory => Arc::new(MemoryBackend::new()),
            BackendConfig::Supabase { url, anon_key } => {
                Arc::new(SupabaseBackend::new(url, anon_key.clone(), self.bucket.clone())?)
            }
        };
        info!(backend = backend.kind(), bucket = %self.bucket, "Backend ready");
        Ok(backend)
    }

    /// Open the identity store and the backend together.
    ///
    /// The memory backend pairs with an in-memory identity slot so that
    /// nothing touches the data directory; every other backend uses the
    /// device database.
    pub fn open(&self) -> ChatResult<ChatServices> {
        if self.backend == BackendConfig::Memory {
            return Ok(ChatServices {
                identity: Arc::new(MemoryIdentityStore::default()),
                backend: Arc::new(MemoryBackend::new()),
            });
        }
        let storage = self.open_storage()?;
        let backend = self.connect(&storage)?;
        Ok(ChatServices {
            identity: Arc::new(storage),
            backend,
        })
    }

    /// Data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

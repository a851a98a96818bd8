use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};
use crate::hive::{DataHive, JsonMetaHive, LocalDataHive, MetaHive};
use crate::object::BlobCodec;

/// default chunk size in MiB
pub const DEFAULT_CHUNK_SIZE_MB: u64 = 50;

/// transport configuration stored in transport.toml
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// upper bound on the size of one stored chunk, in MiB
    #[serde(default = "default_chunk_size_mb")]
    pub chunk_size_mb: u64,
    /// where chunks and chain entries live
    #[serde(default)]
    pub data: DataBackend,
    /// where tags and chain edges live
    #[serde(default)]
    pub meta: MetaBackend,
}

/// data hive selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DataBackend {
    /// one file per object in a local directory
    Local { path: PathBuf },
}

impl Default for DataBackend {
    fn default() -> Self {
        DataBackend::Local {
            path: PathBuf::from("hive"),
        }
    }
}

/// meta hive selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum MetaBackend {
    /// a single JSON database file
    Json { path: PathBuf },
}

impl Default for MetaBackend {
    fn default() -> Self {
        MetaBackend::Json {
            path: PathBuf::from("hive/db.json"),
        }
    }
}

fn default_chunk_size_mb() -> u64 {
    DEFAULT_CHUNK_SIZE_MB
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// load config from file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    /// chunk size in bytes
    pub fn chunk_size(&self) -> usize {
        (self.chunk_size_mb as usize).saturating_mul(1024 * 1024)
    }

    /// blob codec for the configured chunk size
    pub fn codec(&self) -> Result<BlobCodec> {
        BlobCodec::new(self.chunk_size())
    }

    /// open the configured data hive
    pub fn open_data(&self) -> Result<Box<dyn DataHive>> {
        match &self.data {
            DataBackend::Local { path } => Ok(Box::new(LocalDataHive::open(path)?)),
        }
    }

    /// open the configured meta hive
    pub fn open_meta(&self) -> Result<Box<dyn MetaHive>> {
        match &self.meta {
            MetaBackend::Json { path } => Ok(Box::new(JsonMetaHive::open(path)?)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size_mb: DEFAULT_CHUNK_SIZE_MB,
            data: DataBackend::default(),
            meta: MetaBackend::default(),
        }
    }
}

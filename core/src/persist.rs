use crate::config::IndexConfig;
use crate::index::ReadyIndex;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub num_items: usize,
    pub vocabulary_size: usize,
    pub fingerprint: String,
    pub created_at: String,
    pub config: IndexConfig,
}

impl MetaFile {
    pub fn describe(index: &ReadyIndex) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            num_items: index.corpus().len(),
            vocabulary_size: index.features().ncols(),
            fingerprint: index.fingerprint().to_string(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            config: index.config().clone(),
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn snapshot(&self) -> PathBuf { self.root.join("index.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write `index.bin` and `meta.json` under the snapshot root.
pub fn save_index(paths: &IndexPaths, index: &ReadyIndex) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.snapshot())?;
    let bytes = bincode::serialize(index)?;
    f.write_all(&bytes)?;
    let meta = MetaFile::describe(index);
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), items = meta.num_items, bytes = bytes.len(), "snapshot written");
    Ok(meta)
}

/// Read a snapshot back, rejecting unknown versions and snapshots whose
/// corpus no longer matches the recorded fingerprint.
pub fn load_index(paths: &IndexPaths) -> Result<ReadyIndex> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {} (expected {})", meta.version, SNAPSHOT_VERSION);
    }
    let mut f = File::open(paths.snapshot()).with_context(|| format!("opening {}", paths.snapshot().display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let index: ReadyIndex = bincode::deserialize(&buf).context("decoding snapshot")?;
    let actual = index.corpus().fingerprint();
    if actual != meta.fingerprint || index.fingerprint() != meta.fingerprint {
        bail!("snapshot fingerprint mismatch: meta has {}, corpus hashes to {}", meta.fingerprint, actual);
    }
    let (items, rows, sim) = (index.corpus().len(), index.features().nrows(), index.similarity().len());
    if items != rows || items != sim || !index.similarity().is_well_formed() {
        bail!("snapshot dimension mismatch: {items} items, {rows} feature rows, {sim}x{sim} similarity matrix");
    }
    tracing::info!(root = %paths.root.display(), items = meta.num_items, "snapshot loaded");
    Ok(index)
}

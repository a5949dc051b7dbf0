use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::InvertedIndex;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn for_index(index: &InvertedIndex, created_at: impl Into<String>) -> Self {
        Self {
            num_docs: index.num_docs() as u32,
            num_terms: index.num_terms() as u32,
            created_at: created_at.into(),
            version: FORMAT_VERSION,
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
    pub fn index(&self) -> PathBuf { self.root.join("index.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = BufWriter::new(File::create(paths.index())?);
    bincode::serialize_into(&mut f, index)?;
    f.flush()?;
    Ok(())
}

/// Reads and validates the index blob. Any failure is fatal and names the file.
pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let path = paths.index();
    read_index(&path).map_err(|e| Error::load(&path, e))
}

fn read_index(path: &Path) -> Result<InvertedIndex> {
    let mut buf = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut buf)?;
    let index: InvertedIndex = bincode::deserialize(&buf)?;
    index.validate()?;
    Ok(index)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    read_meta(&path).map_err(|e| Error::load(&path, e))
}

fn read_meta(path: &Path) -> Result<MetaFile> {
    let mut buf = String::new();
    File::open(path)?.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion { found: meta.version, expected: FORMAT_VERSION });
    }
    Ok(meta)
}

/// Persists the blob and its metadata side by side.
pub fn save(paths: &IndexPaths, index: &InvertedIndex, created_at: &str) -> Result<MetaFile> {
    save_index(paths, index)?;
    let meta = MetaFile::for_index(index, created_at);
    save_meta(paths, &meta)?;
    Ok(meta)
}

/// Loads metadata and blob, checking that they describe the same index.
pub fn load(paths: &IndexPaths) -> Result<(InvertedIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    let index = load_index(paths)?;
    if meta.num_docs as usize != index.num_docs() || meta.num_terms as usize != index.num_terms() {
        return Err(Error::load(
            paths.meta(),
            Error::CorruptIndex(format!(
                "metadata lists {} documents and {} terms, blob has {} and {}",
                meta.num_docs,
                meta.num_terms,
                index.num_docs(),
                index.num_terms()
            )),
        ));
    }
    tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), root = %paths.root.display(), "loaded index");
    Ok((index, meta))
}

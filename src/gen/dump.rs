//! Raw byte dumps for debugging generator output

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

pub trait ByteDump {
    /// Persists `bytes` verbatim under `name`
    fn dump(&mut self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Writes each dump to a file of the given name below `root`
#[derive(Clone, Debug)]
pub struct DirectoryDump {
    root: PathBuf,
}

impl DirectoryDump {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ByteDump for DirectoryDump {
    fn dump(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(name);
        log::debug!("dumping {} bytes to {}", bytes.len(), path.display());
        std::fs::write(path, bytes)
    }
}

/// Keeps dumps in memory, replacing earlier dumps of the same name
#[derive(Clone, Debug, Default)]
pub struct MemoryDump {
    pub entries: BTreeMap<String, Vec<u8>>,
}

impl ByteDump for MemoryDump {
    fn dump(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.entries.insert(name.to_owned(), bytes.to_vec());
        Ok(())
    }
}

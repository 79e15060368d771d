use crate::error::Result;
use crate::models::Reading;
use crate::readers::ReadingReader;
use crate::utils::SingleFlightCache;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Identity of one version of a source file. Length and modification time
/// catch ordinary rewrites; the SHA-256 of the contents catches a same-length
/// rewrite inside one mtime tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
    pub digest: String,
}

impl SourceIdentity {
    pub fn of(path: &Path) -> Result<Self> {
        let path = fs::canonicalize(path)?;
        let metadata = fs::metadata(&path)?;

        let mut hasher = Sha256::new();
        io::copy(&mut File::open(&path)?, &mut hasher)?;

        Ok(Self {
            path,
            len: metadata.len(),
            modified: metadata.modified().ok(),
            digest: format!("{:x}", hasher.finalize()),
        })
    }
}

/// Process-wide store of loaded reading sets, memoized per source identity.
pub struct SeriesStore {
    reader: ReadingReader,
    cache: SingleFlightCache<SourceIdentity, Vec<Reading>>,
    parse_count: AtomicUsize,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::with_reader(ReadingReader::new())
    }

    pub fn with_reader(reader: ReadingReader) -> Self {
        Self {
            reader,
            cache: SingleFlightCache::new(),
            parse_count: AtomicUsize::new(0),
        }
    }

    /// Load the readings for `path`, parsing only if this exact version of the
    /// file has not been loaded before.
    pub fn load(&self, path: &Path) -> Result<Arc<Vec<Reading>>> {
        let identity = SourceIdentity::of(path)?;
        self.load_identity(&identity)
    }

    pub fn load_identity(&self, identity: &SourceIdentity) -> Result<Arc<Vec<Reading>>> {
        // A newer version of the same file replaces whatever was cached for it
        let superseded = self
            .cache
            .invalidate_where(|key| key.path == identity.path && key != identity)?;
        if superseded > 0 {
            info!(
                "Source {} changed, dropped {} stale cache entries",
                identity.path.display(),
                superseded
            );
        }

        self.cache.get_or_try_insert_with(identity, || {
            self.parse_count.fetch_add(1, Ordering::SeqCst);
            debug!("Parsing readings from {}", identity.path.display());
            let readings = self.reader.read_readings(&identity.path)?;
            info!(
                "Loaded {} readings from {}",
                readings.len(),
                identity.path.display()
            );
            Ok(readings)
        })
    }

    /// Drop any cached readings for `path`.
    pub fn invalidate(&self, path: &Path) -> Result<usize> {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.cache.invalidate_where(|key| key.path == path)
    }

    pub fn clear(&self) -> Result<()> {
        self.cache.clear()
    }

    /// Number of times a source was actually parsed (cache misses).
    pub fn parse_count(&self) -> usize {
        self.parse_count.load(Ordering::SeqCst)
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use std::io::Write;
    use std::thread;
    use tempfile::NamedTempFile;

    fn sample_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "city,timestamp,temperature,season").unwrap();
        writeln!(file, "Lima,2015-06-01,17.0,summer").unwrap();
        writeln!(file, "Lima,2015-06-02,17.5,summer").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_repeated_load_is_memoized() -> Result<()> {
        let file = sample_file();
        let store = SeriesStore::new();

        let first = store.load(file.path())?;
        let second = store.load(file.path())?;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.parse_count(), 1);
        assert_eq!(first.len(), 2);

        Ok(())
    }

    #[test]
    fn test_changed_file_is_reloaded() -> Result<()> {
        let mut file = sample_file();
        let store = SeriesStore::new();

        assert_eq!(store.load(file.path())?.len(), 2);

        writeln!(file, "Lima,2015-06-03,18.0,summer")?;
        file.flush()?;

        assert_eq!(store.load(file.path())?.len(), 3);
        assert_eq!(store.parse_count(), 2);

        Ok(())
    }

    #[test]
    fn test_concurrent_loads_parse_once() {
        let file = sample_file();
        let store = Arc::new(SeriesStore::new());
        let path = file.path().to_path_buf();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let store = store.clone();
                let path = path.clone();
                thread::spawn(move || store.load(&path).map(|r| r.len()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 2);
        }
        assert_eq!(store.parse_count(), 1);
    }

    #[test]
    fn test_invalidate_forces_reparse() -> Result<()> {
        let file = sample_file();
        let store = SeriesStore::new();

        store.load(file.path())?;
        assert_eq!(store.invalidate(file.path())?, 1);
        store.load(file.path())?;
        assert_eq!(store.parse_count(), 2);

        Ok(())
    }

    #[test]
    fn test_same_length_rewrite_with_same_mtime_is_reloaded() -> Result<()> {
        let file = sample_file();
        let store = SeriesStore::new();

        let first = store.load(file.path())?;
        assert_eq!(first[0].temperature, 17.0);
        let modified = fs::metadata(file.path())?.modified()?;

        let contents = fs::read_to_string(file.path())?.replace("17.0", "19.0");
        fs::write(file.path(), contents)?;
        File::options()
            .write(true)
            .open(file.path())?
            .set_modified(modified)?;

        let second = store.load(file.path())?;
        assert_eq!(second[0].temperature, 19.0);
        assert_eq!(store.parse_count(), 2);

        Ok(())
    }

    #[test]
    fn test_identity_digest_tracks_contents() -> Result<()> {
        let file = sample_file();
        let before = SourceIdentity::of(file.path())?;
        assert_eq!(before.digest.len(), 64);
        assert_eq!(SourceIdentity::of(file.path())?, before);

        let contents = fs::read_to_string(file.path())?.replace("17.5", "16.5");
        fs::write(file.path(), contents)?;
        assert_ne!(SourceIdentity::of(file.path())?.digest, before.digest);

        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let store = SeriesStore::new();
        let result = store.load(Path::new("/nonexistent/readings.csv"));
        assert!(matches!(result, Err(ProcessingError::Io(_))));
    }
}

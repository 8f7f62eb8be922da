use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use chrono::{DateTime, Utc};
use crate::common::constants::MIME_SNIFF_LEN;
use crate::common::mime;
use crate::error::{FsError, Result};
use crate::node::{NodeKind, NodePath};
use super::{Entry, StorageAdapter, Visibility};

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: Vec<u8>,
    last_modified: DateTime<Utc>,
    visibility: Visibility,
}

#[derive(Debug, Clone)]
struct MemoryDirectory {
    last_modified: DateTime<Utc>,
    visibility: Visibility,
}

/// 内存后端的共享状态。根目录 ("") 总是存在且不出现在 `directories` 中。
#[derive(Debug, Default)]
struct MemoryStore {
    files: BTreeMap<String, MemoryFile>,
    directories: BTreeMap<String, MemoryDirectory>,
}

impl MemoryStore {
    fn has_directory(&self, path: &str) -> bool {
        path.is_empty() || self.directories.contains_key(path)
    }

    /// `path` 及其所有祖先都不能是文件，否则同一路径会既是文件又是目录。
    fn check_no_file_at_or_above(&self, path: &str) -> Result<()> {
        let mut current = NodePath::new(path);
        while !current.is_root() {
            if self.files.contains_key(current.as_str()) {
                return Err(FsError::mismatch(current.as_str(), NodeKind::Directory));
            }
            current = match current.parent() {
                Some(parent) => parent,
                None => break,
            };
        }
        Ok(())
    }

    /// 创建 `path` 及其所有父目录 (已存在的保持不变)。
    fn ensure_directory(&mut self, path: &str) -> Result<()> {
        self.check_no_file_at_or_above(path)?;
        let mut current = NodePath::new(path);
        while !current.is_root() {
            self.directories
                .entry(current.as_str().to_string())
                .or_insert_with(|| MemoryDirectory {
                    last_modified: Utc::now(),
                    visibility: Visibility::Public,
                });
            current = match current.parent() {
                Some(parent) => parent,
                None => break,
            };
        }
        Ok(())
    }

    /// 写入文件。`visibility` 为 `None` 时沿用已有文件的可见性 (新文件为公开)。
    fn put_file(&mut self, path: &str, contents: Vec<u8>, visibility: Option<Visibility>) -> Result<()> {
        if self.has_directory(path) {
            return Err(FsError::mismatch(path, NodeKind::File));
        }
        if let Some(parent) = NodePath::new(path).parent() {
            self.ensure_directory(parent.as_str())?;
        }
        let visibility = visibility
            .or_else(|| self.files.get(path).map(|f| f.visibility))
            .unwrap_or_default();
        self.files.insert(
            path.to_string(),
            MemoryFile {
                contents,
                last_modified: Utc::now(),
                visibility,
            },
        );
        Ok(())
    }

    fn file(&self, path: &str) -> Result<&MemoryFile> {
        self.files.get(path).ok_or_else(|| FsError::NotFound(path.to_string()))
    }
}

/// 判断 `candidate` 是否位于目录 `dir` 之下；`deep` 为 false 时只接受直接子项。
fn is_listed(dir: &str, candidate: &str, deep: bool) -> bool {
    let rest = if dir.is_empty() {
        candidate
    } else {
        match candidate.strip_prefix(dir).and_then(|r| r.strip_prefix('/')) {
            Some(rest) => rest,
            None => return false,
        }
    };
    !rest.is_empty() && (deep || !rest.contains('/'))
}

fn key(path: &str) -> String {
    NodePath::new(path).as_str().to_string()
}

/// In-memory storage adapter.
///
/// Clones share the same store, which is how [`MemoryRegistry`] hands out
/// named backends. Declares no optional features.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemoryAdapter {
    /// 创建一个独立的、不属于任何注册表的内存后端。
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, MemoryStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 两个适配器是否共享同一份存储。
    pub fn shares_store_with(&self, other: &MemoryAdapter) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }
}

impl StorageAdapter for MemoryAdapter {
    fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.store().files.contains_key(&key(path)))
    }

    fn directory_exists(&self, path: &str) -> Result<bool> {
        Ok(self.store().has_directory(&key(path)))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = key(path);
        Ok(self.store().file(&path)?.contents.clone())
    }

    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.read(path)?)))
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        self.store().put_file(&key(path), contents.to_vec(), None)
    }

    fn write_stream(&self, path: &str, contents: &mut dyn Read) -> Result<()> {
        let mut buffer = Vec::new();
        contents.read_to_end(&mut buffer)?;
        self.store().put_file(&key(path), buffer, None)
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.store().files.remove(&key(path));
        Ok(())
    }

    fn delete_directory(&self, path: &str) -> Result<()> {
        let path = key(path);
        let mut store = self.store();
        store.files.retain(|p, _| !is_listed(&path, p, true));
        store.directories.retain(|p, _| *p != path && !is_listed(&path, p, true));
        Ok(())
    }

    fn create_directory(&self, path: &str) -> Result<()> {
        self.store().ensure_directory(&key(path))
    }

    fn move_file(&self, source: &str, destination: &str) -> Result<()> {
        let (source, destination) = (key(source), key(destination));
        let mut store = self.store();
        let file = store.file(&source)?.clone();
        if source == destination {
            return Ok(());
        }
        // 先写入目标，失败时源文件保持不变
        store.put_file(&destination, file.contents, Some(file.visibility))?;
        store.files.remove(&source);
        Ok(())
    }

    fn copy(&self, source: &str, destination: &str) -> Result<()> {
        let (source, destination) = (key(source), key(destination));
        let mut store = self.store();
        let contents = store.file(&source)?.contents.clone();
        store.put_file(&destination, contents, None)
    }

    fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        let path = key(path);
        let mut store = self.store();
        if let Some(file) = store.files.get_mut(&path) {
            file.visibility = visibility;
            return Ok(());
        }
        match store.directories.get_mut(&path) {
            Some(dir) => {
                dir.visibility = visibility;
                Ok(())
            }
            None => Err(FsError::NotFound(path)),
        }
    }

    fn visibility(&self, path: &str) -> Result<Visibility> {
        let path = key(path);
        let store = self.store();
        if let Some(file) = store.files.get(&path) {
            return Ok(file.visibility);
        }
        if path.is_empty() {
            return Ok(Visibility::Public);
        }
        store
            .directories
            .get(&path)
            .map(|d| d.visibility)
            .ok_or(FsError::NotFound(path))
    }

    fn mime_type(&self, path: &str) -> Result<String> {
        let path = NodePath::new(path);
        let store = self.store();
        let file = store.file(path.as_str())?;
        let head = &file.contents[..file.contents.len().min(MIME_SNIFF_LEN)];
        Ok(mime::detect(head, path.extension()))
    }

    fn last_modified(&self, path: &str) -> Result<DateTime<Utc>> {
        let path = key(path);
        let store = self.store();
        if let Some(file) = store.files.get(&path) {
            return Ok(file.last_modified);
        }
        store
            .directories
            .get(&path)
            .map(|d| d.last_modified)
            .ok_or(FsError::NotFound(path))
    }

    fn file_size(&self, path: &str) -> Result<u64> {
        let path = key(path);
        Ok(self.store().file(&path)?.contents.len() as u64)
    }

    fn list_contents(&self, path: &str, deep: bool) -> Result<Vec<Entry>> {
        let path = key(path);
        let store = self.store();

        let directories = store
            .directories
            .iter()
            .filter(|(p, _)| is_listed(&path, p, deep))
            .map(|(p, d)| Entry {
                last_modified: Some(d.last_modified),
                visibility: Some(d.visibility),
                ..Entry::directory(p.clone())
            });
        let files = store
            .files
            .iter()
            .filter(|(p, _)| is_listed(&path, p, deep))
            .map(|(p, f)| Entry {
                size: Some(f.contents.len() as u64),
                last_modified: Some(f.last_modified),
                visibility: Some(f.visibility),
                ..Entry::file(p.clone())
            });

        let mut entries: Vec<Entry> = directories.chain(files).collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

/// Registry of named in-memory backends.
///
/// Asking for the same name twice returns adapters over the same store.
/// The registry is an ordinary value: create one, pass it to whatever needs
/// it, and `reset` it between tests.
//
// // 命名内存后端的注册表。同名返回共享同一存储的适配器。
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    stores: Mutex<HashMap<String, Arc<Mutex<MemoryStore>>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn stores(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<MemoryStore>>>> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 获取 (或创建) 名为 `name` 的内存后端。
    pub fn adapter(&self, name: &str) -> MemoryAdapter {
        let store = self.stores().entry(name.to_string()).or_default().clone();
        MemoryAdapter { store }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores().keys().cloned().collect();
        names.sort();
        names
    }

    /// 移除一个命名后端。已发出的适配器仍持有旧存储，但之后同名请求会得到新存储。
    pub fn remove(&self, name: &str) -> bool {
        self.stores().remove(name).is_some()
    }

    pub fn reset(&self) {
        let count = {
            let mut stores = self.stores();
            let count = stores.len();
            stores.clear();
            count
        };
        tracing::debug!(count, "memory registry reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use crate::storage::EntryKind;

    #[test]
    fn test_write_creates_parent_directories() {
        let adapter = MemoryAdapter::new();
        adapter.write("a/b/c.txt", b"hello").unwrap();

        assert!(adapter.file_exists("a/b/c.txt").unwrap());
        assert!(adapter.directory_exists("a").unwrap());
        assert!(adapter.directory_exists("a/b").unwrap());
        assert!(adapter.directory_exists("").unwrap());
        assert!(!adapter.directory_exists("a/b/c.txt").unwrap());
        assert_eq!(adapter.file_size("/a/b/c.txt").unwrap(), 5);
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let adapter = MemoryAdapter::new();
        assert!(matches!(adapter.read("nope.txt"), Err(FsError::NotFound(p)) if p == "nope.txt"));
        assert!(matches!(adapter.move_file("nope.txt", "x"), Err(FsError::NotFound(_))));
        // 删除不存在的文件是幂等的
        adapter.delete("nope.txt").unwrap();
    }

    #[test]
    fn test_stream_roundtrip() {
        let adapter = MemoryAdapter::new();
        adapter.write_stream("s.bin", &mut Cursor::new(vec![1u8, 2, 3])).unwrap();
        let mut out = Vec::new();
        adapter.read_stream("s.bin").unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_move_copy_and_delete_directory() {
        let adapter = MemoryAdapter::new();
        adapter.write("src/one.txt", b"1").unwrap();
        adapter.copy("src/one.txt", "dst/copy.txt").unwrap();
        adapter.move_file("src/one.txt", "dst/moved.txt").unwrap();

        assert!(!adapter.file_exists("src/one.txt").unwrap());
        assert_eq!(adapter.read("dst/copy.txt").unwrap(), b"1");
        assert_eq!(adapter.read("dst/moved.txt").unwrap(), b"1");

        adapter.delete_directory("dst").unwrap();
        assert!(!adapter.directory_exists("dst").unwrap());
        assert!(!adapter.file_exists("dst/copy.txt").unwrap());
        assert!(adapter.directory_exists("src").unwrap());
    }

    #[test]
    fn test_listing_shallow_and_deep() {
        let adapter = MemoryAdapter::new();
        adapter.write("top.txt", b"t").unwrap();
        adapter.write("dir/inner.txt", b"i").unwrap();
        adapter.write("dir/sub/deep.txt", b"d").unwrap();
        adapter.write("dirx/other.txt", b"o").unwrap();

        let shallow: Vec<String> = adapter.list_contents("", false).unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(shallow, vec!["dir", "dirx", "top.txt"]);

        let dir: Vec<Entry> = adapter.list_contents("dir", true).unwrap();
        let paths: Vec<&str> = dir.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["dir/inner.txt", "dir/sub", "dir/sub/deep.txt"]);
        assert_eq!(dir[0].kind, EntryKind::File);
        assert_eq!(dir[0].size, Some(1));
        assert_eq!(dir[1].kind, EntryKind::Directory);
    }

    #[test]
    fn test_visibility() {
        let adapter = MemoryAdapter::new();
        adapter.write("secret.txt", b"s").unwrap();
        assert_eq!(adapter.visibility("secret.txt").unwrap(), Visibility::Public);
        adapter.set_visibility("secret.txt", Visibility::Private).unwrap();
        assert_eq!(adapter.visibility("secret.txt").unwrap(), Visibility::Private);

        // 覆盖写入保留可见性
        adapter.write("secret.txt", b"s2").unwrap();
        assert_eq!(adapter.visibility("secret.txt").unwrap(), Visibility::Private);
        assert!(matches!(adapter.set_visibility("ghost", Visibility::Private), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_move_keeps_visibility() {
        let adapter = MemoryAdapter::new();
        adapter.write("private/key.pem", b"k").unwrap();
        adapter.set_visibility("private/key.pem", Visibility::Private).unwrap();
        adapter.write("public/key.pem", b"old").unwrap();

        adapter.move_file("private/key.pem", "public/key.pem").unwrap();
        assert_eq!(adapter.visibility("public/key.pem").unwrap(), Visibility::Private);
        assert_eq!(adapter.read("public/key.pem").unwrap(), b"k");
        assert!(!adapter.file_exists("private/key.pem").unwrap());

        // 移动到自身什么也不做
        adapter.move_file("public/key.pem", "/public/key.pem").unwrap();
        assert!(adapter.file_exists("public/key.pem").unwrap());
    }

    #[test]
    fn test_file_and_directory_stay_exclusive() {
        let adapter = MemoryAdapter::new();
        adapter.write("a", b"file").unwrap();

        match adapter.write("a/b.txt", b"nested") {
            Err(FsError::NodeTypeMismatch { path, expected, .. }) => {
                assert_eq!(path, "a");
                assert_eq!(expected, NodeKind::Directory);
            }
            other => panic!("expected NodeTypeMismatch, got {:?}", other),
        }
        assert!(matches!(adapter.create_directory("a/deeper"), Err(FsError::NodeTypeMismatch { .. })));
        assert!(matches!(adapter.create_directory("a"), Err(FsError::NodeTypeMismatch { .. })));
        assert!(adapter.file_exists("a").unwrap());
        assert!(!adapter.directory_exists("a").unwrap());
        assert!(!adapter.file_exists("a/b.txt").unwrap());

        adapter.create_directory("dir").unwrap();
        match adapter.write("dir", b"x") {
            Err(FsError::NodeTypeMismatch { path, expected, .. }) => {
                assert_eq!(path, "dir");
                assert_eq!(expected, NodeKind::File);
            }
            other => panic!("expected NodeTypeMismatch, got {:?}", other),
        }
        assert!(!adapter.file_exists("dir").unwrap());

        // 目标冲突时移动失败，源文件保持不变
        assert!(adapter.move_file("a", "dir").is_err());
        assert!(adapter.file_exists("a").unwrap());
        assert!(adapter.copy("a", "a/copy.txt").is_err());
    }

    #[test]
    fn test_mime_type_sniffs_content() {
        let adapter = MemoryAdapter::new();
        adapter.write("pixel", b"\x89PNG\r\n\x1a\n0000").unwrap();
        adapter.write("notes.txt", b"hello").unwrap();
        assert_eq!(adapter.mime_type("pixel").unwrap(), "image/png");
        assert_eq!(adapter.mime_type("notes.txt").unwrap(), "text/plain");
    }

    #[test]
    fn test_registry_shares_and_resets() {
        let registry = MemoryRegistry::new();
        let a = registry.adapter("default");
        let b = registry.adapter("default");
        let other = registry.adapter("other");

        assert!(a.shares_store_with(&b));
        assert!(!a.shares_store_with(&other));
        a.write("x.txt", b"x").unwrap();
        assert!(b.file_exists("x.txt").unwrap());
        assert_eq!(registry.names(), vec!["default", "other"]);

        registry.reset();
        assert!(!registry.contains("default"));
        let fresh = registry.adapter("default");
        assert!(!fresh.file_exists("x.txt").unwrap());
        assert!(!fresh.shares_store_with(&a));
    }
}

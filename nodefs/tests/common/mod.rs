#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use chrono::{DateTime, Utc};
use nodefs::storage::{Decorator, Entry, Link, MemoryAdapter};
use nodefs::{Filesystem, Result, StorageAdapter, Visibility};

/// 一个最小的 PNG 文件头，足够让 mime 嗅探识别为 image/png。
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01";

/// 记录每种后端调用次数的共享计数器。
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<Mutex<BTreeMap<&'static str, usize>>>);

impl Calls {
    fn record(&self, name: &'static str) {
        *self.0.lock().unwrap().entry(name).or_default() += 1;
    }

    pub fn get(&self, name: &str) -> usize {
        self.0.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.lock().unwrap().values().sum()
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, usize> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// 统计经过它的每一次存储调用，然后原样转发。
#[derive(Debug)]
pub struct Counting {
    inner: Link,
    calls: Calls,
}

impl Counting {
    pub fn new(inner: Link, calls: Calls) -> Self {
        Self { inner, calls }
    }
}

impl Decorator for Counting {
    fn inner(&self) -> &dyn StorageAdapter {
        self.inner.as_ref()
    }

    fn inner_mut(&mut self) -> &mut Link {
        &mut self.inner
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        self.calls.record("file_exists");
        self.inner.file_exists(path)
    }

    fn directory_exists(&self, path: &str) -> Result<bool> {
        self.calls.record("directory_exists");
        self.inner.directory_exists(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.calls.record("read");
        self.inner.read(path)
    }

    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        self.calls.record("read_stream");
        self.inner.read_stream(path)
    }

    fn visibility(&self, path: &str) -> Result<Visibility> {
        self.calls.record("visibility");
        self.inner.visibility(path)
    }

    fn mime_type(&self, path: &str) -> Result<String> {
        self.calls.record("mime_type");
        self.inner.mime_type(path)
    }

    fn last_modified(&self, path: &str) -> Result<DateTime<Utc>> {
        self.calls.record("last_modified");
        self.inner.last_modified(path)
    }

    fn file_size(&self, path: &str) -> Result<u64> {
        self.calls.record("file_size");
        self.inner.file_size(path)
    }

    fn list_contents(&self, path: &str, deep: bool) -> Result<Vec<Entry>> {
        self.calls.record("list_contents");
        self.inner.list_contents(path, deep)
    }
}

/// 什么也不做的装饰器，用来把链加深。
#[derive(Debug)]
pub struct Passthrough {
    inner: Link,
}

impl Decorator for Passthrough {
    fn inner(&self) -> &dyn StorageAdapter {
        self.inner.as_ref()
    }

    fn inner_mut(&mut self) -> &mut Link {
        &mut self.inner
    }
}

/// 辅助函数：在 `adapter` 外面包 `levels` 层 Passthrough。
pub fn wrap(adapter: Link, levels: usize) -> Link {
    let mut link = adapter;
    for _ in 0..levels {
        link = Box::new(Passthrough { inner: link });
    }
    link
}

/// 辅助函数：创建一个经过计数装饰器的内存文件系统。
///
/// 返回的 `MemoryAdapter` 与文件系统共享存储，可以绕过计数器直接准备数据。
pub fn counted_memory_fs(name: &str) -> (Filesystem, MemoryAdapter, Calls) {
    let backend = MemoryAdapter::new();
    let calls = Calls::default();
    let fs = Filesystem::from_link(name, Box::new(Counting::new(Box::new(backend.clone()), calls.clone())));
    (fs, backend, calls)
}

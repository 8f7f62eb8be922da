use nodefs::storage::MemoryRegistry;
use nodefs::{Filesystem, StorageAdapter};

#[test]
fn test_same_name_shares_store() {
    let registry = MemoryRegistry::new();
    let uploads = Filesystem::new("uploads", registry.adapter("uploads"));
    let again = Filesystem::new("uploads-again", registry.adapter("uploads"));
    let other = Filesystem::new("other", registry.adapter("other"));

    uploads.write("a.txt", b"shared").unwrap();
    assert_eq!(again.file("a.txt").unwrap().contents().unwrap(), b"shared");
    assert!(!other.has("a.txt").unwrap());
    assert_eq!(registry.names(), vec!["other".to_string(), "uploads".to_string()]);
}

#[test]
fn test_reset_gives_fresh_stores() {
    let registry = MemoryRegistry::new();
    let before = registry.adapter("cache");
    before.write("k", b"v").unwrap();

    registry.reset();
    assert!(!registry.contains("cache"));

    let after = registry.adapter("cache");
    assert!(!after.file_exists("k").unwrap());
    assert!(!after.shares_store_with(&before));
    assert!(before.file_exists("k").unwrap());

    assert!(registry.remove("cache"));
    assert!(!registry.remove("cache"));
}

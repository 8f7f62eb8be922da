use nodefs::storage::{MemoryAdapter, UrlPrefixAdapter};
use nodefs::{Filesystem, FilesystemConfig, FsError};

const PREFIXES: [&str; 3] = [
    "https://a.example.com/",
    "https://b.example.com",
    "https://c.example.com/static",
];

fn sharded() -> Filesystem {
    let mut config = FilesystemConfig::new("sharded");
    config.url_prefixes = PREFIXES.iter().map(|p| p.to_string()).collect();
    Filesystem::from_config(&config, Box::new(MemoryAdapter::new())).unwrap()
}

#[test]
fn test_same_path_same_prefix_across_instances() {
    let first = sharded();
    let second = sharded();
    for path in ["a.png", "docs/readme.md", "deep/nested/file.tar.gz", "ünïcode.txt"] {
        let url = first.public_url(path).unwrap();
        assert_eq!(url, first.public_url(path).unwrap());
        assert_eq!(url, second.public_url(path).unwrap());
    }
}

#[test]
fn test_paths_are_spread_over_prefixes() {
    let fs = sharded();
    let hosts: std::collections::HashSet<String> = (0..64)
        .map(|i| fs.public_url(&format!("file-{}.bin", i)).unwrap())
        .map(|url| url.host_str().unwrap().to_string())
        .collect();
    assert!(hosts.len() > 1);
    assert!(hosts.iter().all(|h| h.ends_with(".example.com")));
}

#[test]
fn test_prefix_path_is_kept() {
    let url = UrlPrefixAdapter::new(Box::new(MemoryAdapter::new()), ["https://c.example.com/static"]).unwrap();
    let fs = Filesystem::from_link("single", Box::new(url));
    for path in ["a.png", "/b/c.png", "x/../y.png"] {
        let url = fs.public_url(path).unwrap();
        assert!(url.as_str().starts_with("https://c.example.com/static/"), "{}", url);
    }
    assert_eq!(
        fs.public_url("x/../y.png").unwrap().as_str(),
        "https://c.example.com/static/y.png"
    );
}

#[test]
fn test_empty_prefix_list_rejected() {
    let empty: [&str; 0] = [];
    assert!(matches!(
        UrlPrefixAdapter::new(Box::new(MemoryAdapter::new()), empty),
        Err(FsError::NoUrlPrefixes)
    ));
}

#[test]
fn test_invalid_prefix_reported_on_use() {
    let url = UrlPrefixAdapter::new(Box::new(MemoryAdapter::new()), ["not a url"]).unwrap();
    let fs = Filesystem::from_link("broken", Box::new(url));
    assert!(matches!(
        fs.public_url("a.png"),
        Err(FsError::InvalidUrlPrefix { prefix, .. }) if prefix == "not a url"
    ));
}

#[test]
fn test_file_public_url_through_node() {
    let fs = sharded();
    let file = fs.write("img/logo.svg", b"<svg/>").unwrap();
    assert_eq!(file.public_url().unwrap(), fs.public_url("img/logo.svg").unwrap());
}

#[test]
fn test_reserved_characters_stay_in_path() {
    let fs = sharded();
    for path in ["notes#1.txt", "a?b.txt", "100%.txt", "dir with space/x.png"] {
        let url = fs.public_url(path).unwrap();
        assert_eq!(url.fragment(), None, "{}", path);
        assert_eq!(url.query(), None, "{}", path);
        let last = url.path_segments().unwrap().last().unwrap().to_string();
        assert!(!last.contains('#') && !last.contains('?'), "{}", url);
    }
    assert!(fs.public_url("notes#1.txt").unwrap().as_str().ends_with("/notes%231.txt"));
    assert!(fs.public_url("100%.txt").unwrap().as_str().ends_with("/100%25.txt"));
}

use forgecache::cache::{CacheRoots, CacheScheme, FileCache, Scope};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_scope_isolation() {
    let dir = tempdir().unwrap();
    let cache = FileCache::new(CacheRoots::new(dir.path().join("u"), dir.path().join("w")));

    assert!(cache.write(Scope::Workspace, "k", &json!("workspace only")));
    assert_eq!(cache.read::<Value>(Scope::User, "k"), None);
    assert!(cache.list(Scope::User).is_empty());
    assert_eq!(cache.list(Scope::Workspace).len(), 1);
}

#[test]
fn test_two_stores_share_user_root() {
    let dir = tempdir().unwrap();
    let user = dir.path().join("home/.forge");
    let first = FileCache::new(CacheRoots::new(&user, dir.path().join("p1/.forge")));
    let second = FileCache::new(CacheRoots::new(&user, dir.path().join("p2/.forge")));

    assert!(first.write(Scope::User, "shared", &json!(7)));
    assert!(first.write(Scope::Workspace, "local", &json!(8)));

    assert_eq!(second.read::<Value>(Scope::User, "shared"), Some(json!(7)));
    assert_eq!(second.read::<Value>(Scope::Workspace, "local"), None);
}

#[test]
fn test_for_workspace_layout() {
    let dir = tempdir().unwrap();
    let roots = CacheRoots::for_workspace(dir.path()).unwrap();
    assert_eq!(roots.root(Scope::Workspace), dir.path().join(".forge"));
    assert!(roots.root(Scope::User).ends_with(".forge"));
    assert_ne!(roots.root(Scope::User), roots.root(Scope::Workspace));
}

#[test]
fn test_resolve_path_does_no_io() {
    let dir = tempdir().unwrap();
    let cache = FileCache::new(CacheRoots::new(dir.path().join("u"), dir.path().join("w")));
    let path = cache.resolve_path(Scope::Workspace, Some("x/y"));
    assert_eq!(path, dir.path().join("w").join("x/y.json"));
    assert!(!Path::new(&dir.path().join("w")).exists());
}

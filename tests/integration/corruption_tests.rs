use forgecache::cache::{CacheError, CacheRoots, CacheScheme, FileCache, Scope};
use serde_json::{json, Value};
use std::fs::{self, File};
use tempfile::{tempdir, TempDir};

fn cache_with_root() -> (TempDir, FileCache) {
    let dir = tempdir().unwrap();
    let cache = FileCache::new(CacheRoots::new(dir.path().join("u"), dir.path().join("w")));
    assert!(cache.ensure_root(Scope::Workspace));
    (dir, cache)
}

#[test]
fn test_read_non_json_file() {
    let (_dir, cache) = cache_with_root();
    let path = cache.resolve_path(Scope::Workspace, Some("bad"));
    fs::write(&path, "not a json").unwrap();

    assert_eq!(cache.read::<Value>(Scope::Workspace, "bad"), None);
    assert!(cache.metadata(Scope::Workspace, Some("bad")).is_none());
    assert!(matches!(
        cache.try_metadata(Scope::Workspace, "bad"),
        Err(CacheError::CorruptRecord { .. })
    ));
}

#[test]
fn test_read_empty_file() {
    let (_dir, cache) = cache_with_root();
    File::create(cache.resolve_path(Scope::Workspace, Some("empty"))).unwrap();
    assert_eq!(cache.read::<Value>(Scope::Workspace, "empty"), None);
}

#[test]
fn test_json_without_envelope() {
    let (_dir, cache) = cache_with_root();
    let path = cache.resolve_path(Scope::Workspace, Some("raw"));
    fs::write(&path, r#"{"just": "data"}"#).unwrap();

    assert_eq!(cache.read::<Value>(Scope::Workspace, "raw"), None);
    // Still listed and sized: it is a file ending in .json.
    assert_eq!(cache.list(Scope::Workspace), vec!["raw.json".to_string()]);
    assert!(cache.size(Scope::Workspace, Some("raw")) > 0);
}

#[test]
fn test_write_repairs_corrupt_record() {
    let (_dir, cache) = cache_with_root();
    let path = cache.resolve_path(Scope::Workspace, Some("fix"));
    fs::write(&path, "{{{{").unwrap();

    assert!(cache.write(Scope::Workspace, "fix", &json!({"ok": true})));
    assert_eq!(
        cache.read::<Value>(Scope::Workspace, "fix"),
        Some(json!({"ok": true}))
    );
    assert!(cache.metadata(Scope::Workspace, Some("fix")).is_some());
}

#[test]
fn test_root_path_occupied_by_file() {
    let dir = tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, "i am a file").unwrap();
    let cache = FileCache::new(CacheRoots::new(dir.path().join("u"), &blocked));

    assert!(!cache.ensure_root(Scope::Workspace));
    assert!(!cache.write(Scope::Workspace, "k", &1));
    assert!(cache.list(Scope::Workspace).is_empty());
    assert!(!cache.clear_scope(Scope::Workspace));
}

#[cfg(unix)]
#[test]
fn test_write_to_readonly_root_fails_and_keeps_old_record() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, cache) = cache_with_root();
    assert!(cache.write(Scope::Workspace, "stable", &json!("v1")));

    let root = cache.resolve_path(Scope::Workspace, None);
    let mut perms = fs::metadata(&root).unwrap().permissions();
    perms.set_mode(0o500);
    fs::set_permissions(&root, perms).unwrap();

    let marker = root.join("marker");
    let privileged = fs::write(&marker, b"x").is_ok();
    let _ = fs::remove_file(&marker);

    let wrote = cache.write(Scope::Workspace, "stable", &json!("v2"));

    let mut perms = fs::metadata(&root).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&root, perms).unwrap();

    if !privileged {
        assert!(!wrote);
        assert_eq!(
            cache.read::<Value>(Scope::Workspace, "stable"),
            Some(json!("v1"))
        );
    }
}

use forgecache::cache::{CacheError, CacheRoots, CacheScheme, ClearOutcome, FileCache, Scope};
use serde_json::{json, Value};
use std::fs;
use tempfile::{tempdir, TempDir};

fn cache() -> (TempDir, FileCache) {
    let dir = tempdir().unwrap();
    let roots = CacheRoots::new(dir.path().join("u"), dir.path().join("w"));
    (dir, FileCache::new(roots))
}

#[test]
fn test_clear_single_removes_exactly_one() {
    let (_dir, cache) = cache();
    cache.write(Scope::Workspace, "keep", &json!(1));
    cache.write(Scope::Workspace, "drop", &json!(2));
    cache.write(Scope::Workspace, "dir/keep", &json!(3));

    let outcome: ClearOutcome<Value> = cache.clear(Scope::Workspace, Some("drop"));
    assert!(outcome.success);
    assert_eq!(outcome.payload, Some(json!(2)));

    assert!(!cache.exists(Scope::Workspace, Some("drop")));
    assert_eq!(cache.read::<Value>(Scope::Workspace, "keep"), Some(json!(1)));
    assert_eq!(cache.read::<Value>(Scope::Workspace, "dir/keep"), Some(json!(3)));
}

#[test]
fn test_clear_scope_preserves_root() {
    let (_dir, cache) = cache();
    cache.write(Scope::User, "a", &1);
    cache.write(Scope::User, "b/c/d", &2);

    let outcome: ClearOutcome<Value> = cache.clear(Scope::User, None);
    assert!(outcome.success);
    assert!(cache.list(Scope::User).is_empty());
    assert!(cache.resolve_path(Scope::User, None).is_dir());
    assert!(cache.write(Scope::User, "new", &json!("ok")));
    assert_eq!(cache.list(Scope::User), vec!["new.json".to_string()]);
}

#[test]
fn test_clear_scope_does_not_touch_other_scope() {
    let (_dir, cache) = cache();
    cache.write(Scope::User, "u", &1);
    cache.write(Scope::Workspace, "w", &2);

    assert!(cache.clear_scope(Scope::Workspace));
    assert_eq!(cache.list(Scope::User), vec!["u.json".to_string()]);
}

#[test]
fn test_clear_scope_removes_non_record_children() {
    let (_dir, cache) = cache();
    cache.write(Scope::Workspace, "a", &1);
    let root = cache.resolve_path(Scope::Workspace, None);
    fs::write(root.join("stray.txt"), "x").unwrap();

    let report = cache.try_clear_scope(Scope::Workspace).unwrap();
    assert_eq!(report.removed.len(), 2);
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn test_empty_key_clears_whole_scope() {
    let (_dir, cache) = cache();
    cache.write(Scope::Workspace, "a", &1);
    let outcome: ClearOutcome<Value> = cache.clear(Scope::Workspace, Some(""));
    assert!(outcome.success);
    assert!(outcome.payload.is_none());
    assert!(cache.list(Scope::Workspace).is_empty());
}

#[test]
fn test_separator_only_key_is_not_a_scope_clear() {
    let (_dir, cache) = cache();
    cache.write(Scope::Workspace, "a", &1);
    cache.write(Scope::Workspace, "b/c", &2);

    for key in ["/", "//", "\\"] {
        let outcome: ClearOutcome<Value> = cache.clear(Scope::Workspace, Some(key));
        assert!(!outcome.success, "key {key:?} must not clear the scope");
        assert!(outcome.payload.is_none());
    }
    assert_eq!(
        cache.list(Scope::Workspace),
        vec!["a.json".to_string(), "b/c.json".to_string()]
    );
}

#[test]
fn test_clear_directory_key_fails() {
    let (_dir, cache) = cache();
    cache.write(Scope::Workspace, "group.json/inner", &1);
    // "group.json" resolves to a directory, which single-entry clear refuses.
    let outcome: ClearOutcome<Value> = cache.clear(Scope::Workspace, Some("group.json"));
    assert!(!outcome.success);
    assert!(cache.exists(Scope::Workspace, Some("group.json/inner")));
}

#[cfg(unix)]
#[test]
fn test_clear_scope_best_effort_on_failure() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, cache) = cache();
    cache.write(Scope::Workspace, "a", &1);
    cache.write(Scope::Workspace, "locked/inner", &2);
    cache.write(Scope::Workspace, "z", &3);

    let locked = cache.resolve_path(Scope::Workspace, None).join("locked");
    let mut perms = fs::metadata(&locked).unwrap().permissions();
    perms.set_mode(0o500);
    fs::set_permissions(&locked, perms).unwrap();

    // Privileged users can delete regardless of permissions.
    let marker = locked.join("marker");
    let privileged = fs::write(&marker, b"x").is_ok();
    let _ = fs::remove_file(&marker);

    let result = cache.try_clear_scope(Scope::Workspace);

    // A privileged clear removes `locked` entirely.
    if locked.exists() {
        let mut perms = fs::metadata(&locked).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&locked, perms).unwrap();
    }

    if privileged {
        assert_eq!(result.unwrap().removed.len(), 3);
        assert!(cache.list(Scope::Workspace).is_empty());
        return;
    }
    match result {
        Err(CacheError::PartialClear { removed, total, .. }) => {
            assert_eq!(total, 3);
            assert_eq!(removed, 2);
        }
        other => panic!("Expected PartialClear, got {:?}", other),
    }
    // Siblings on both sides of the failure were still removed.
    assert!(!cache.exists(Scope::Workspace, Some("a")));
    assert!(!cache.exists(Scope::Workspace, Some("z")));
}

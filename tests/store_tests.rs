//! Integration tests for the on-disk project store.

#[cfg(test)]
mod tests {
    use quarry::store::{ProjectStore, ViewDef, HISTORY_LIMIT};
    use quarry::QuarryError;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> (TempDir, ProjectStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = ProjectStore::open(dir.path()).expect("Failed to open store");
        (dir, store)
    }

    #[test]
    fn test_files_round_trip_with_folder_paths() {
        let (_dir, store) = store();
        store.ensure_project("p").unwrap();

        store.put_file("p", "sales.csv", None, b"a\n1\n").unwrap();
        store
            .put_file("p", "a.parquet", Some("orders/2024/a.parquet"), b"PAR1")
            .unwrap();
        store.put_file("p", "sales.csv", None, b"a\n2\n").unwrap();

        let files = store.get_files("p").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "sales.csv");
        assert_eq!(files[0].bytes, b"a\n2\n");
        assert_eq!(files[1].relative_path.as_deref(), Some("orders/2024/a.parquet"));
    }

    /// Editing a stored file behind the store's back is detected.
    #[test]
    fn test_tampered_file_fails_hash_check() {
        let (dir, store) = store();
        store.ensure_project("p").unwrap();
        store.put_file("p", "sales.csv", None, b"a\n1\n").unwrap();

        let stored = dir.path().join("projects/p/files/sales.csv");
        fs::write(&stored, b"a\n999\n").unwrap();

        match store.get_files("p") {
            Err(QuarryError::Manifest(msg)) => assert!(msg.contains("Hash mismatch")),
            other => panic!("expected manifest error, got {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_escaping_paths_are_rejected() {
        let (_dir, store) = store();
        store.ensure_project("p").unwrap();
        let err = store
            .put_file("p", "x.csv", Some("../outside/x.csv"), b"")
            .unwrap_err();
        assert!(matches!(err, QuarryError::InvalidPath(_)));
    }

    #[test]
    fn test_unknown_project() {
        let (_dir, store) = store();
        assert!(matches!(store.get_views("nope"), Err(QuarryError::ProjectNotFound(_))));
    }

    #[test]
    fn test_views_upsert_and_delete() {
        let (_dir, store) = store();
        store.ensure_project("p").unwrap();
        let view = |name: &str, sql: &str| ViewDef {
            name: name.to_string(),
            sql: sql.to_string(),
        };

        store.put_view("p", view("a", "SELECT 1")).unwrap();
        store.put_view("p", view("b", "SELECT 2")).unwrap();
        store.put_view("p", view("a", "SELECT 3")).unwrap();
        store.delete_view("p", "b").unwrap();
        store.delete_view("p", "missing").unwrap();

        assert_eq!(store.get_views("p").unwrap(), vec![view("a", "SELECT 3")]);
    }

    #[test]
    fn test_history_dedupes_and_caps() {
        let (_dir, store) = store();
        store.ensure_project("p").unwrap();

        for i in 0..(HISTORY_LIMIT + 5) {
            store.push_history("p", &format!("SELECT {}", i)).unwrap();
        }
        store.push_history("p", "  SELECT 10  ").unwrap();
        store.push_history("p", "   ").unwrap();

        let history = store.get_history("p").unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], "SELECT 10");
        assert_eq!(history[1], format!("SELECT {}", HISTORY_LIMIT + 4));
        assert_eq!(history.iter().filter(|h| *h == "SELECT 10").count(), 1);
    }

    #[test]
    fn test_projects_listed_by_creation() {
        let (_dir, store) = store();
        let first = store.create_project("First").unwrap();
        let second = store.create_project("Second").unwrap();

        let ids: Vec<String> = store.list_projects().unwrap().into_iter().map(|p| p.id).collect();
        assert!(ids.contains(&first.id));
        assert!(ids.contains(&second.id));
        assert_eq!(ids.len(), 2);
    }
}

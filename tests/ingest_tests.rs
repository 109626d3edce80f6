//! Integration tests for grouping, format detection and name sanitizing.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use quarry::ingest::detect::{classify, detect_format, sanitize, table_name_for_file, FileFormat, LoadStrategy};
    use quarry::ingest::{group_files, GroupKind, InputFile};
    use std::collections::HashSet;

    fn nested(path: &str) -> InputFile {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        InputFile::from_bytes(name, Vec::new()).with_relative_path(path)
    }

    /// A mixed drop keeps bare files apart and buckets folder members.
    #[test]
    fn test_mixed_drop_groups() {
        let files = vec![
            InputFile::from_bytes("sales.csv", Vec::new()),
            nested("orders/2024/a.parquet"),
            InputFile::from_bytes("legacy.db", Vec::new()),
            nested("orders/2025/b.parquet"),
        ];

        let groups = group_files(files);

        let shape: Vec<(GroupKind, &str, usize)> = groups
            .iter()
            .map(|g| (g.kind, g.name.as_str(), g.members.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (GroupKind::File, "sales.csv", 1),
                (GroupKind::Folder, "orders", 2),
                (GroupKind::File, "legacy.db", 1),
            ]
        );
        assert_eq!(classify(&groups[1]), LoadStrategy::ParquetFolder);
        assert_eq!(classify(&groups[2]), LoadStrategy::Single(FileFormat::Sqlite));
    }

    /// Any `_delta_log` segment marks a folder as a Delta table.
    #[test]
    fn test_delta_log_anywhere_in_folder() {
        let groups = group_files(vec![
            nested("events/part-0.parquet"),
            nested("events/_delta_log/00000.json"),
        ]);
        assert_eq!(classify(&groups[0]), LoadStrategy::DeltaFolder);
    }

    /// A folder mixing formats has no load strategy.
    #[test]
    fn test_mixed_folder_is_unsupported() {
        let groups = group_files(vec![nested("misc/a.parquet"), nested("misc/b.csv")]);
        assert_eq!(classify(&groups[0]), LoadStrategy::Unsupported);
    }

    #[test]
    fn test_extension_matching_ignores_case() {
        assert_eq!(detect_format("REPORT.XLSX"), Some(FileFormat::Xlsx));
        assert_eq!(detect_format("data.Json"), Some(FileFormat::Json));
        assert_eq!(detect_format("archive.sqlite"), Some(FileFormat::Sqlite));
        assert_eq!(detect_format("README"), None);
    }

    #[test]
    fn test_table_name_for_file() {
        assert_eq!(table_name_for_file("sales 2024.csv"), "sales_2024");
        assert_eq!(table_name_for_file("data.backup.json"), "data_backup");
    }

    fn relative_path() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            ("[a-c]{1,2}", "[a-z]{1,4}\\.parquet").prop_map(|(dir, file)| Some(format!("{}/{}", dir, file))),
        ]
    }

    proptest! {
        /// Grouping is a partition: nothing lost, nothing duplicated,
        /// folder names unique, first-seen order kept.
        #[test]
        fn prop_grouping_partitions_input(paths in prop::collection::vec(relative_path(), 0..24)) {
            let files: Vec<InputFile> = paths
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let file = InputFile::from_bytes(format!("f{}.csv", i), Vec::new());
                    match p {
                        Some(path) => file.with_relative_path(path.clone()),
                        None => file,
                    }
                })
                .collect();

            let groups = group_files(files);

            let total: usize = groups.iter().map(|g| g.members.len()).sum();
            prop_assert_eq!(total, paths.len());

            let mut folders = HashSet::new();
            for group in groups.iter().filter(|g| g.kind == GroupKind::Folder) {
                prop_assert!(folders.insert(group.name.clone()));
                for member in &group.members {
                    let first = member.relative_path().and_then(|p| p.split('/').next());
                    prop_assert_eq!(first, Some(group.name.as_str()));
                }
            }

            let bare = groups.iter().filter(|g| g.kind == GroupKind::File).count();
            prop_assert_eq!(bare, paths.iter().filter(|p| p.is_none()).count());
        }

        /// Sanitized names use only identifier characters and are stable.
        #[test]
        fn prop_sanitize_is_idempotent(name in "\\PC{0,24}") {
            let once = sanitize(&name);
            prop_assert!(once.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            prop_assert_eq!(once.chars().count(), name.chars().count());
            prop_assert_eq!(sanitize(&once), once);
        }
    }
}

//! Custom test assertions for integration tests

use memunpack::FileTable;
use std::path::Path;

/// Assert the table holds exactly `expected`, in order
pub fn assert_table_eq(table: &FileTable, expected: &[(&str, &[u8])]) {
    let actual: Vec<(&str, &[u8])> = table.iter().map(|e| (e.name(), e.data())).collect();
    assert_eq!(
        actual.len(),
        expected.len(),
        "entry count mismatch; got names {:?}",
        table.names().collect::<Vec<_>>()
    );
    for (got, want) in actual.iter().zip(expected) {
        assert_eq!(got.0, want.0, "entry name mismatch");
        assert_eq!(got.1, want.1, "content mismatch for {}", want.0);
    }
}

/// Assert the table holds exactly `expected` in any order
pub fn assert_table_eq_unordered(table: &FileTable, expected: &[(&str, &[u8])]) {
    let mut actual: Vec<(String, Vec<u8>)> = table
        .iter()
        .map(|e| (e.name().to_string(), e.data().to_vec()))
        .collect();
    let mut want: Vec<(String, Vec<u8>)> = expected
        .iter()
        .map(|(n, d)| (n.to_string(), d.to_vec()))
        .collect();
    actual.sort();
    want.sort();
    assert_eq!(actual, want);
}

/// Assert no regular file is left anywhere below `dir`
pub fn assert_no_staged_files(dir: &Path) {
    let leftovers: Vec<_> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    assert!(leftovers.is_empty(), "staged files leaked: {leftovers:?}");
}

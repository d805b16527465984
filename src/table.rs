//! Growable in-memory file table
//!
//! The table owns every extracted entry. Growth is fallible: when the backing
//! storage cannot be enlarged, the append fails with
//! [`Error::Allocation`](crate::Error::Allocation) and every entry appended
//! earlier stays owned by the table.

use crate::error::{Error, Result};

/// One extracted file: its archive path and its full contents
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    data: Vec<u8>,
}

impl FileEntry {
    /// Create an entry from an archive path and its contents
    pub fn new(name: String, data: Vec<u8>) -> Self {
        Self { name, data }
    }

    /// Archive-relative path as reported by the decoder (not normalized)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Content length in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Split into name and contents
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.name, self.data)
    }
}

/// Ordered table of extracted files
///
/// Insertion order is archive order for regular files, followed by resolved
/// links in the order they appear in the archive.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileTable {
    entries: Vec<FileEntry>,
    skipped_links: Vec<String>,
}

impl FileTable {
    /// Number of entry slots reserved up front by the extractor
    pub const INITIAL_CAPACITY: usize = 100;

    /// Create an empty table without allocating
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(capacity)
            .map_err(|_| Error::Allocation("memory allocation error for file table"))?;
        Ok(Self {
            entries,
            skipped_links: Vec::new(),
        })
    }

    /// Append an entry and return its index
    ///
    /// Capacity doubles when full. If the larger allocation fails the entry is
    /// dropped, the error is returned, and the table is left unchanged.
    pub fn push(&mut self, entry: FileEntry) -> Result<usize> {
        if self.entries.len() == self.entries.capacity() {
            let additional = self.entries.capacity().max(Self::INITIAL_CAPACITY);
            self.entries
                .try_reserve_exact(additional)
                .map_err(|_| Error::Allocation("memory allocation error for file data"))?;
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries the table can hold before growing
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    /// First entry with exactly this name
    pub fn find(&self, name: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Iterate entries in table order
    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    /// Entry names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Entries as a slice
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Take ownership of the entries
    pub fn into_entries(self) -> Vec<FileEntry> {
        self.entries
    }

    /// Links whose target never reached a non-empty regular file
    ///
    /// These are left out of the table. The list is informational only.
    pub fn skipped_links(&self) -> &[String] {
        &self.skipped_links
    }

    pub(crate) fn note_skipped_link(&mut self, name: String) {
        self.skipped_links.push(name);
    }

    /// Drop every entry, keeping the table itself usable
    pub(crate) fn discard(&mut self) {
        self.entries = Vec::new();
        self.skipped_links = Vec::new();
    }

    /// Release every entry and the backing storage
    pub fn release(self) {
        drop(self);
    }
}

impl std::ops::Index<usize> for FileTable {
    type Output = FileEntry;

    fn index(&self, index: usize) -> &FileEntry {
        &self.entries[index]
    }
}

impl IntoIterator for FileTable {
    type Item = FileEntry;
    type IntoIter = std::vec::IntoIter<FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileTable {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

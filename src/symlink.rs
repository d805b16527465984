//! Link resolution
//!
//! Symlinks and hard links are not reproduced as links. Each one is resolved
//! to the regular file it finally points at, and the output gets a copy of
//! that file's bytes under the link's own name. Links that never reach a
//! non-empty regular file are left out.
//!
//! Paths are compared after lexical normalization: `.` and empty segments are
//! dropped, `..` removes the previous segment and a leading `/` refers to the
//! archive root. A path that climbs above the root points at nothing.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::archive::{EntryHeader, EntryKind};
use crate::error::{Error, Result};
use crate::table::{FileEntry, FileTable};

/// Longest link chain followed before giving up
///
/// A chain of `MAX_LINK_DEPTH + 1` links ending in a file still resolves; one
/// more link and it is dropped.
pub const MAX_LINK_DEPTH: usize = 32;

/// A link seen during the second pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymlinkRecord {
    /// The link's own archive path, as reported by the decoder
    pub link_name: String,
    /// Normalized archive path the link points at; `None` when the target
    /// lies outside the archive root
    pub target_path: Option<String>,
}

impl SymlinkRecord {
    /// Build a record from a link header; other entry kinds yield `None`
    pub fn from_header(header: &EntryHeader) -> Option<Self> {
        let target_path = match &header.kind {
            EntryKind::Symlink { target } => resolve_target_path(&header.path, target),
            // hard link targets are already archive paths
            EntryKind::HardLink { target } => normalize(target),
            _ => return None,
        };
        Some(Self {
            link_name: header.path.clone(),
            target_path,
        })
    }
}

/// Archive path a symlink at `link_path` with target `raw_target` points at
///
/// The target is joined to the link's directory. A link with no directory
/// component uses the target as is, and an absolute target starts at the
/// archive root.
pub fn resolve_target_path(link_path: &str, raw_target: &str) -> Option<String> {
    if raw_target.starts_with('/') {
        return normalize(raw_target);
    }
    match link_path.rfind('/') {
        Some(slash) => normalize(&format!("{}/{raw_target}", &link_path[..slash])),
        None => normalize(raw_target),
    }
}

/// Lexically normalize an archive path
///
/// ```
/// use memunpack::symlink::normalize;
///
/// assert_eq!(normalize("./a//b/../c").as_deref(), Some("a/c"));
/// assert_eq!(normalize("/etc/hosts").as_deref(), Some("etc/hosts"));
/// assert_eq!(normalize("../outside"), None);
/// ```
pub fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }
    Some(segments.join("/"))
}

/// Name-keyed view over the table and the collected link records
pub struct LinkResolver<'a> {
    files: HashMap<String, usize>,
    links: HashMap<String, &'a SymlinkRecord>,
}

impl<'a> LinkResolver<'a> {
    /// Index the non-empty files of `entries` and the link `records`
    ///
    /// When a name occurs more than once the first occurrence wins.
    pub fn new(entries: &[FileEntry], records: &'a [SymlinkRecord]) -> Self {
        let mut files = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.size() == 0 {
                continue;
            }
            if let Some(key) = normalize(entry.name()) {
                files.entry(key).or_insert(index);
            }
        }

        let mut links = HashMap::new();
        for record in records {
            if let Some(key) = normalize(&record.link_name) {
                links.entry(key).or_insert(record);
            }
        }

        Self { files, links }
    }

    /// Register a link copy appended at `index` as a file later links can reach
    pub fn insert_file(&mut self, name: &str, index: usize) {
        if let Some(key) = normalize(name) {
            self.files.entry(key).or_insert(index);
        }
    }

    /// Table index of the file `target_path` finally points at
    ///
    /// A non-empty file with that name ends the search. Otherwise a link with
    /// that name is followed, at most [`MAX_LINK_DEPTH`] times. Cycles end
    /// the search as soon as a link repeats.
    pub fn resolve(&self, target_path: &str) -> Option<usize> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = target_path;
        let mut depth = 0;

        loop {
            if depth > MAX_LINK_DEPTH {
                return None;
            }
            if let Some(&index) = self.files.get(current) {
                return Some(index);
            }
            let record = self.links.get(current)?;
            if !visited.insert(current) {
                return None;
            }
            current = record.target_path.as_deref()?;
            depth += 1;
        }
    }
}

/// Counts from one resolution pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkPassSummary {
    /// Links appended to the table
    pub resolved: usize,
    /// Links left out
    pub skipped: usize,
}

/// Resolve every record and append the resolved links to `table`
///
/// Entries are appended in record order. A link is resolved against the table
/// as it stands at that point, so copies appended for earlier records count
/// as files. An allocation failure stops the pass; links appended before it
/// stay in the table.
pub fn append_resolved_links(
    table: &mut FileTable,
    records: &[SymlinkRecord],
) -> Result<LinkPassSummary> {
    let mut resolver = LinkResolver::new(table.entries(), records);
    let mut summary = LinkPassSummary::default();

    for record in records {
        let resolved = record
            .target_path
            .as_deref()
            .and_then(|target| resolver.resolve(target));
        let Some(index) = resolved else {
            debug!(
                link = %record.link_name,
                target = ?record.target_path,
                "skipping unresolved link"
            );
            table.note_skipped_link(record.link_name.clone());
            summary.skipped += 1;
            continue;
        };

        let source = table[index].data();
        let mut data = Vec::new();
        data.try_reserve_exact(source.len())
            .map_err(|_| Error::Allocation("memory allocation error for symlink data"))?;
        data.extend_from_slice(source);

        table.push(FileEntry::new(record.link_name.clone(), data))?;
        resolver.insert_file(&record.link_name, table.len() - 1);
        summary.resolved += 1;
    }

    Ok(summary)
}

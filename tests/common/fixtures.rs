//! In-memory archive builders
//!
//! Every fixture is generated with the same codec crates the library reads
//! with, so no binary files are checked in.

use std::io::{Cursor, Write};

/// One item of a generated tar archive
pub enum TarItem<'a> {
    /// Regular file with contents
    File(&'a str, &'a [u8]),
    /// Directory entry
    Dir(&'a str),
    /// Symbolic link `(path, target)`
    Symlink(&'a str, &'a str),
}

/// Build an uncompressed GNU tar archive
pub fn tar_archive(items: &[TarItem<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for item in items {
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o644);
        match item {
            TarItem::File(path, data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, path, *data).unwrap();
            }
            TarItem::Dir(path) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .unwrap();
            }
            TarItem::Symlink(path, target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                header.set_link_name(target).unwrap();
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .unwrap();
            }
        }
    }
    builder.into_inner().unwrap()
}

/// Tar archive of plain files only
pub fn tar_of(files: &[(&str, &[u8])]) -> Vec<u8> {
    let items: Vec<TarItem<'_>> = files
        .iter()
        .map(|(name, data)| TarItem::File(name, data))
        .collect();
    tar_archive(&items)
}

/// Create a ZIP archive with the given stored files
pub fn zip_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Create a deflated ZIP archive with files and `(link, target)` symlinks
pub fn zip_with_symlinks(files: &[(&str, &[u8])], links: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    for (link, target) in links {
        writer.add_symlink(*link, *target, options).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Create a password-encrypted ZIP using the deprecated ZipCrypto method
/// (only encryption method supported for writing by zip 0.6)
pub fn encrypted_zip(file_name: &str, content: &[u8], password: &[u8]) -> Vec<u8> {
    use zip::unstable::write::FileOptionsExt;
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .with_deprecated_encryption(password);
    writer.start_file(file_name, options).unwrap();
    writer.write_all(content).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Create a 7z archive from the given files using sevenz_rust
pub fn sevenz_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let source = tempfile::tempdir().unwrap();
    for (name, content) in files {
        let path = source.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    let out = tempfile::tempdir().unwrap();
    let archive_path = out.path().join("fixture.7z");
    sevenz_rust::compress_to_path(source.path(), &archive_path).unwrap();
    std::fs::read(archive_path).unwrap()
}

/// 7z archive of files followed by `(link, target)` symlinks
///
/// A link is stored the way p7zip writes one: the content is the target path
/// and the high attribute bits carry a unix `S_IFLNK` mode.
pub fn sevenz_with_symlinks(files: &[(&str, &[u8])], links: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = sevenz_rust::SevenZWriter::new(Cursor::new(Vec::new())).unwrap();
    for (name, content) in files {
        let mut entry = sevenz_rust::SevenZArchiveEntry::new();
        entry.name = name.to_string();
        writer.push_archive_entry(entry, Some(*content)).unwrap();
    }
    for (link, target) in links {
        let mut entry = sevenz_rust::SevenZArchiveEntry::new();
        entry.name = link.to_string();
        entry.has_windows_attributes = true;
        entry.windows_attributes = 0x8000 | (0o120777 << 16);
        writer
            .push_archive_entry(entry, Some(target.as_bytes()))
            .unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// gzip-compress `data`
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// bzip2-compress `data`
pub fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// xz-compress `data`
pub fn xz(data: &[u8]) -> Vec<u8> {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// lzma-alone compress `data`
pub fn lzma(data: &[u8]) -> Vec<u8> {
    let options = xz2::stream::LzmaOptions::new_preset(6).unwrap();
    let stream = xz2::stream::Stream::new_lzma_encoder(&options).unwrap();
    let mut encoder = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// zstd-compress `data`
pub fn zstd(data: &[u8]) -> Vec<u8> {
    zstd::encode_all(Cursor::new(data), 3).unwrap()
}

/// Deterministic bytes that do not begin with any archive or filter magic
pub fn payload(len: usize) -> Vec<u8> {
    let mut data = b"memunpack test payload\n".to_vec();
    let mut n: u64 = 0;
    while data.len() < len {
        data.extend_from_slice(format!("line {n:08} {}\n", n * 7919 % 104_729).as_bytes());
        n += 1;
    }
    data.truncate(len);
    data
}

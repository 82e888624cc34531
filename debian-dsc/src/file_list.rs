// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! File list fields.

Source descriptions enumerate their files in *file list* fields. The `Files` field
carries MD5 digests and each `Checksums-<algorithm>` field carries digests of the
named algorithm. Every line has the form `<digest> <size> <filename>`, with the
filename relative to the directory holding the source description.
*/

use {
    crate::{
        control::{ControlField, ControlParagraph},
        digest::{ChecksumType, ContentDigest},
        error::{DscError, Result},
    },
    log::warn,
    std::{
        path::{Component, Path, PathBuf},
        str::FromStr,
    },
};

/// Name of the field holding the canonical file manifest.
pub const FILES_FIELD: &str = "Files";

const CHECKSUMS_PREFIX: &str = "checksums-";

/// How a field name relates to file lists.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FileListKind {
    /// A file list whose digests we can compute.
    Supported(ChecksumType),

    /// A `Checksums-*` field naming an algorithm we don't know about.
    Unsupported(String),
}

/// Classify a field name as a file list field.
///
/// Returns [None] for fields that are not file lists.
pub fn classify_field_name(name: &str) -> Option<FileListKind> {
    if name.eq_ignore_ascii_case(FILES_FIELD) {
        return Some(FileListKind::Supported(ChecksumType::Md5));
    }

    let algorithm = name
        .get(0..CHECKSUMS_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(CHECKSUMS_PREFIX))
        .map(|_| &name[CHECKSUMS_PREFIX.len()..])?;

    Some(match ChecksumType::from_name(algorithm) {
        Some(checksum) => FileListKind::Supported(checksum),
        None => FileListKind::Unsupported(algorithm.to_string()),
    })
}

/// Iterate over file list fields having a supported checksum type.
///
/// Fields naming unsupported algorithms are skipped with a warning.
pub fn iter_file_list_fields<'p, 'a>(
    paragraph: &'p ControlParagraph<'a>,
) -> impl Iterator<Item = (&'p ControlField<'a>, ChecksumType)> {
    paragraph
        .iter_fields()
        .filter_map(|field| match classify_field_name(field.name()) {
            Some(FileListKind::Supported(checksum)) => Some((field, checksum)),
            Some(FileListKind::Unsupported(algorithm)) => {
                warn!(
                    "ignoring {} field; unsupported checksum algorithm {}",
                    field.name(),
                    algorithm
                );
                None
            }
            None => None,
        })
}

/// A single file as described by a `Files` or `Checksums-*` field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileListEntry<'a> {
    /// The filename, as written in the source description.
    pub filename: &'a str,

    /// The content digest of this file.
    pub digest: ContentDigest,

    /// The size in bytes of the file.
    pub size: u64,
}

impl<'a> FileListEntry<'a> {
    /// Parse a line of a file list field.
    ///
    /// Lines must consist of exactly 3 whitespace delimited tokens. Filenames
    /// containing whitespace are therefore not representable.
    pub fn parse_line(field: &str, checksum: ChecksumType, line: &'a str) -> Result<Self> {
        let malformed = |reason: String| DscError::MalformedChecksumLine {
            field: field.to_string(),
            line: line.to_string(),
            reason,
        };

        let parts = line.split_ascii_whitespace().collect::<Vec<_>>();

        let (digest, size, filename) = match parts.as_slice() {
            [digest, size, filename] => (*digest, *size, *filename),
            _ => {
                return Err(malformed(format!(
                    "expected 3 fields (digest, size, filename); got {}",
                    parts.len()
                )))
            }
        };

        let digest = ContentDigest::from_hex_digest(checksum, digest)
            .map_err(|e| malformed(e.to_string()))?;
        let size = u64::from_str(size).map_err(|e| malformed(format!("bad size: {}", e)))?;

        Ok(Self {
            filename,
            digest,
            size,
        })
    }

    /// Resolve the filename relative to a directory.
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        resolve_path(base_dir, self.filename)
    }
}

/// Iterate over parsed entries in a file list field.
pub fn iter_entries<'f>(
    field: &'f ControlField<'_>,
    checksum: ChecksumType,
) -> Box<dyn Iterator<Item = Result<FileListEntry<'f>>> + 'f> {
    Box::new(
        field
            .iter_lines()
            .map(move |line| FileListEntry::parse_line(field.name(), checksum, line)),
    )
}

/// Normalize a path lexically.
///
/// `.` components are dropped and `..` components remove their parent. The
/// filesystem is not consulted, so symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            _ => normalized.push(component),
        }
    }

    normalized
}

/// Resolve a filename from a file list against a directory.
pub fn resolve_path(base_dir: &Path, filename: &str) -> PathBuf {
    normalize_path(&base_dir.join(filename))
}

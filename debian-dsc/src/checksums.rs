// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Checksum indices.

A [DigestMap] maps a checksum type and an absolute file path to a digest. The same
structure describes both the digests a source description claims ([ChecksumIndex])
and the digests actually computed for entries that disagree ([CorrectionMap]).
*/

use {
    crate::{
        control::ControlParagraph,
        digest::{ChecksumType, ContentDigest},
        error::Result,
        file_list::{iter_entries, iter_file_list_fields},
    },
    log::debug,
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
};

/// Digests keyed by checksum type then by file path.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DigestMap(BTreeMap<ChecksumType, BTreeMap<PathBuf, ContentDigest>>);

/// Digests claimed by a source description.
pub type ChecksumIndex = DigestMap;

/// Actual digests of files whose claimed digests were wrong.
pub type CorrectionMap = DigestMap;

impl DigestMap {
    /// Record a digest, replacing any previous digest for the same type and path.
    pub fn insert(&mut self, path: PathBuf, digest: ContentDigest) -> Option<ContentDigest> {
        self.0
            .entry(digest.checksum_type())
            .or_default()
            .insert(path, digest)
    }

    /// Obtain the digest of a given type for a path.
    pub fn get(&self, checksum: ChecksumType, path: &Path) -> Option<&ContentDigest> {
        self.0.get(&checksum).and_then(|files| files.get(path))
    }

    /// Obtain all digests of a given type.
    pub fn files(&self, checksum: ChecksumType) -> Option<&BTreeMap<PathBuf, ContentDigest>> {
        self.0.get(&checksum)
    }

    /// Iterate over checksum types having at least one entry.
    pub fn checksum_types(&self) -> impl Iterator<Item = ChecksumType> + '_ {
        self.0
            .iter()
            .filter(|(_, files)| !files.is_empty())
            .map(|(checksum, _)| *checksum)
    }

    /// Iterate over every `(path, digest)` pair, grouped by checksum type.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &ContentDigest)> + '_ {
        self.0
            .values()
            .flat_map(|files| files.iter().map(|(path, digest)| (path.as_path(), digest)))
    }

    /// Total number of recorded digests.
    pub fn len(&self) -> usize {
        self.0.values().map(|files| files.len()).sum()
    }

    /// Whether no digests are recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the index of claimed digests from a paragraph's file list fields.
///
/// Filenames are resolved against `base_dir`. When a path appears more than once
/// for the same checksum type, the last occurrence wins.
pub fn build_checksum_index(
    paragraph: &ControlParagraph<'_>,
    base_dir: &Path,
) -> Result<ChecksumIndex> {
    let mut index = ChecksumIndex::default();

    for (field, checksum) in iter_file_list_fields(paragraph) {
        for entry in iter_entries(field, checksum) {
            let entry = entry?;
            let path = entry.resolve(base_dir);

            if let Some(previous) = index.insert(path.clone(), entry.digest) {
                debug!(
                    "{} listed more than once for {}; replacing {}",
                    path.display(),
                    checksum,
                    previous
                );
            }
        }
    }

    Ok(index)
}

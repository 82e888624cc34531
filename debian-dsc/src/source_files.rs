// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Resolution of the `Files` manifest to paths on disk. */

use {
    crate::{
        control::ControlParagraph,
        digest::ChecksumType,
        error::{DscError, Result},
        file_list::{iter_entries, FILES_FIELD},
    },
    std::path::{Path, PathBuf},
};

/// A file named by the `Files` field, resolved against the document's directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedSourceFile {
    /// Absolute, normalized path of the file.
    pub path: PathBuf,

    /// Size claimed by the source description.
    pub size: u64,

    /// Whether a regular file exists at `path`.
    pub present: bool,
}

/// Resolve every entry of the `Files` field.
///
/// Entries are returned in document order. A missing `Files` field is an error.
pub fn resolve_source_files(
    paragraph: &ControlParagraph<'_>,
    base_dir: &Path,
) -> Result<Vec<ResolvedSourceFile>> {
    let field = paragraph
        .field_normalized(FILES_FIELD)
        .ok_or(DscError::MissingFileManifest)?;

    iter_entries(field, ChecksumType::Md5)
        .map(|entry| {
            let entry = entry?;
            let path = entry.resolve(base_dir);
            let present = path.is_file();

            Ok(ResolvedSourceFile {
                path,
                size: entry.size,
                present,
            })
        })
        .collect()
}

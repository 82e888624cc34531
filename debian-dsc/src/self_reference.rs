// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Self-referencing file list entries.

The file list fields of a source description never mention the source description
file itself. Consumers that treat the file lists as the complete set of files making
up a source package want that entry, so [inject_self_references()] synthesizes it.
*/

use {
    crate::{
        control::ControlParagraph,
        digest::{digest_path, ChecksumType},
        error::{DscError, Result},
        file_list::{iter_entries, iter_file_list_fields},
    },
    log::{debug, warn},
    std::{collections::HashMap, path::Path},
};

/// Ensure every file list field has an entry for the document at `path`.
///
/// For each `Files` and supported `Checksums-*` field lacking an entry whose
/// filename is the document's file name, a `<digest> <size> <filename>` line is
/// appended. Existing lines are left untouched.
///
/// Presence is evaluated on every call, so calling this again on its own output
/// changes nothing.
///
/// A file name containing whitespace cannot be written as a file list entry. Such
/// documents are left unchanged and a warning is logged.
///
/// Returns the number of lines that were added.
pub fn inject_self_references(
    paragraph: &mut ControlParagraph<'_>,
    path: &Path,
    chunk_size: usize,
) -> Result<usize> {
    let unreadable = |e: std::io::Error| DscError::UnreadableDocument(path.to_path_buf(), e);

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            unreadable(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no file name",
            ))
        })?;

    let mut missing = vec![];

    for (field, checksum) in iter_file_list_fields(paragraph) {
        let mut present = false;

        for entry in iter_entries(field, checksum) {
            if entry?.filename == filename {
                present = true;
            }
        }

        if !present {
            debug!("{} not found in {} field", filename, field.name());
            missing.push((field.name().to_string(), checksum));
        }
    }

    if missing.is_empty() {
        return Ok(0);
    }

    // File list lines are whitespace delimited.
    if filename.contains(char::is_whitespace) {
        warn!(
            "not adding {} to file lists: file name contains whitespace",
            filename
        );
        return Ok(0);
    }

    let size = std::fs::metadata(path).map_err(unreadable)?.len();
    let mut digests = HashMap::<ChecksumType, String>::new();

    for (name, checksum) in &missing {
        let digest = match digests.get(checksum) {
            Some(digest) => digest.clone(),
            None => {
                let digest = digest_path(path, *checksum, chunk_size)
                    .map_err(unreadable)?
                    .digest_hex();
                digests.insert(*checksum, digest.clone());
                digest
            }
        };

        let line = format!("{} {} {}", digest, size, filename);
        debug!("adding to {}: {}", name, line);

        if let Some(field) = paragraph.field_mut(name) {
            field.append_line(&line);
        }
    }

    Ok(missing.len())
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{digest::DEFAULT_CHUNK_SIZE, file_list::FileListEntry},
        digest::Digest,
        indoc::indoc,
    };

    const DSC: &str = indoc! {"
        Source: testdeb
        Checksums-Sha256:
         0494bbdf8489b6d882e6c699a88883383eae2eb96d9ef41a99ae2772d386dc27 25 testdeb_0.0.0.orig.tar.gz
        Checksums-Whirlpool:
         00 25 testdeb_0.0.0.orig.tar.gz
        Files:
         e4d7ffa9ddf15c81a0ee21855d4cbeef 25 testdeb_0.0.0.orig.tar.gz
    "};

    fn entries<'p>(p: &'p ControlParagraph<'_>, name: &str) -> Result<Vec<FileListEntry<'p>>> {
        let (field, checksum) = iter_file_list_fields(p)
            .find(|(field, _)| field.name() == name)
            .expect("field should exist");

        iter_entries(field, checksum).collect()
    }

    #[test]
    fn injects_each_file_list() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = td.path().join("testdeb_0.0.0.dsc");
        std::fs::write(&path, DSC)?;

        let mut p = ControlParagraph::parse_str(DSC)?;
        assert_eq!(inject_self_references(&mut p, &path, DEFAULT_CHUNK_SIZE)?, 2);

        let files = entries(&p, "Files")?;
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].filename, "testdeb_0.0.0.dsc");
        assert_eq!(files[1].size, DSC.len() as u64);
        assert_eq!(
            files[1].digest.digest_bytes(),
            md5::Md5::digest(DSC.as_bytes()).as_slice()
        );

        let sha256 = entries(&p, "Checksums-Sha256")?;
        assert_eq!(sha256.len(), 2);
        assert_eq!(
            sha256[1].digest.digest_bytes(),
            sha2::Sha256::digest(DSC.as_bytes()).as_slice()
        );

        // Unsupported algorithms are left alone.
        assert_eq!(
            p.field("Checksums-Whirlpool").unwrap().value_str(),
            "00 25 testdeb_0.0.0.orig.tar.gz"
        );

        // Original lines are retained verbatim.
        assert!(p.field("Files").unwrap().raw_value().starts_with(
            "\n e4d7ffa9ddf15c81a0ee21855d4cbeef 25 testdeb_0.0.0.orig.tar.gz\n "
        ));

        Ok(())
    }

    #[test]
    fn injection_is_idempotent() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = td.path().join("testdeb_0.0.0.dsc");
        std::fs::write(&path, DSC)?;

        let mut once = ControlParagraph::parse_str(DSC)?;
        inject_self_references(&mut once, &path, DEFAULT_CHUNK_SIZE)?;

        let mut twice = once.clone();
        assert_eq!(inject_self_references(&mut twice, &path, DEFAULT_CHUNK_SIZE)?, 0);
        assert_eq!(once, twice);

        for name in ["Files", "Checksums-Sha256"] {
            assert_eq!(
                entries(&twice, name)?
                    .iter()
                    .filter(|e| e.filename == "testdeb_0.0.0.dsc")
                    .count(),
                1
            );
        }

        Ok(())
    }

    #[test]
    fn existing_self_reference_is_kept() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = td.path().join("testdeb_0.0.0.dsc");
        let data = "Files:\n 00000000000000000000000000000000 1 testdeb_0.0.0.dsc\n";
        std::fs::write(&path, data)?;

        let mut p = ControlParagraph::parse_str(data)?;
        assert_eq!(inject_self_references(&mut p, &path, DEFAULT_CHUNK_SIZE)?, 0);
        assert_eq!(p.to_string(), data);

        Ok(())
    }

    #[test]
    fn malformed_lines_fail() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = td.path().join("testdeb_0.0.0.dsc");
        let data = "Files:\n e4d7ffa9ddf15c81a0ee21855d4cbeef testdeb_0.0.0.orig.tar.gz\n";
        std::fs::write(&path, data)?;

        let mut p = ControlParagraph::parse_str(data)?;
        assert!(matches!(
            inject_self_references(&mut p, &path, DEFAULT_CHUNK_SIZE),
            Err(DscError::MalformedChecksumLine { .. })
        ));

        Ok(())
    }

    #[test]
    fn whitespace_file_name_is_skipped() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = td.path().join("my doc.dsc");
        std::fs::write(&path, DSC)?;

        let mut p = ControlParagraph::parse_str(DSC)?;
        assert_eq!(inject_self_references(&mut p, &path, DEFAULT_CHUNK_SIZE)?, 0);
        assert_eq!(p, ControlParagraph::parse_str(DSC)?);

        let index = crate::checksums::build_checksum_index(&p, td.path())?;
        assert!(index
            .iter()
            .all(|(path, _)| path.ends_with("testdeb_0.0.0.orig.tar.gz")));

        Ok(())
    }

    #[test]
    fn unreadable_document() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = td.path().join("missing.dsc");

        let mut p = ControlParagraph::parse_str(DSC)?;
        assert!(matches!(
            inject_self_references(&mut p, &path, DEFAULT_CHUNK_SIZE),
            Err(DscError::UnreadableDocument(_, _))
        ));

        Ok(())
    }
}

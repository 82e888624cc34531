// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian source description files.

A [DebianSourceDescription] is bound to a `.dsc` file on disk. Everything derived from
that file is computed on first access and cached for the lifetime of the instance:

1. The file is read and any OpenPGP envelope is removed.
2. The text is parsed into a [ControlParagraph].
3. Entries for the `.dsc` file itself are added to each file list field.
4. File lists are resolved against the directory holding the `.dsc` file.
5. Digests of the referenced files are recomputed and compared.

[DebianSourceDescription::validate()] turns the outcome into a pass/fail verdict.
*/

use {
    crate::{
        checksums::{build_checksum_index, ChecksumIndex, CorrectionMap},
        control::ControlParagraph,
        envelope::{unwrap_path, Envelope},
        error::{DscError, Result},
        file_list::normalize_path,
        self_reference::inject_self_references,
        source_files::{resolve_source_files, ResolvedSourceFile},
        validation::{compute_corrections, ValidationOptions},
    },
    log::{debug, warn},
    once_cell::sync::OnceCell,
    std::{
        collections::{BTreeSet, HashMap},
        fmt::Formatter,
        path::{Path, PathBuf},
    },
};

/// Fields every source description is expected to define.
///
/// Their absence is reported by [DebianSourceDescription::missing_required_fields()]
/// but is not a validation failure.
pub const REQUIRED_FIELDS: &[&str] = &["Package", "Version", "Architecture"];

const KNOWN_EXTENSIONS: &[&str] = &[".dsc", ".dsc.asc"];

/// A value resolved by [DebianSourceDescription::get()].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DocumentValue<'a> {
    /// A filesystem path.
    Path(&'a Path),

    /// Text, such as a field value.
    Text(&'a str),

    /// A list of filesystem paths.
    Paths(Vec<&'a Path>),

    /// A boolean property.
    Flag(bool),
}

impl<'a> std::fmt::Display for DocumentValue<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Text(text) => f.write_str(text),
            Self::Paths(paths) => {
                for (i, path) in paths.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{}", path.display())?;
                }

                Ok(())
            }
            Self::Flag(value) => write!(f, "{}", value),
        }
    }
}

type LookupFn =
    for<'s> fn(&'s DebianSourceDescription, &str) -> Result<Option<DocumentValue<'s>>>;

struct ParsedDocument {
    headers: ControlParagraph<'static>,
    message: String,
    envelope: Option<Envelope>,
}

/// A Debian source description (`.dsc`) file.
pub struct DebianSourceDescription {
    path: PathBuf,
    directory: PathBuf,
    options: ValidationOptions,
    parsed: OnceCell<ParsedDocument>,
    source_files: OnceCell<Vec<ResolvedSourceFile>>,
    checksums: OnceCell<ChecksumIndex>,
    corrected_checksums: OnceCell<CorrectionMap>,
}

impl std::fmt::Debug for DebianSourceDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebianSourceDescription")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("parsed", &self.parsed.get().is_some())
            .finish()
    }
}

impl DebianSourceDescription {
    /// Construct an instance bound to a file using default options.
    ///
    /// The file is not read until something derived from it is requested.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, ValidationOptions::default())
    }

    /// Construct an instance bound to a file with explicit options.
    ///
    /// Relative paths are resolved against the current directory.
    pub fn with_options(path: impl AsRef<Path>, options: ValidationOptions) -> Result<Self> {
        let path = path.as_ref();

        let path = if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&std::env::current_dir()?.join(path))
        };

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        if !KNOWN_EXTENSIONS.iter().any(|ext| filename.ends_with(ext)) {
            warn!(
                "{} does not have a .dsc or .dsc.asc extension",
                path.display()
            );
        }

        let directory = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("/"));

        Ok(Self {
            path,
            directory,
            options,
            parsed: OnceCell::new(),
            source_files: OnceCell::new(),
            checksums: OnceCell::new(),
            corrected_checksums: OnceCell::new(),
        })
    }

    /// Absolute path of the source description file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that relative filenames are resolved against.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Options used when digesting files.
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    fn parsed(&self) -> Result<&ParsedDocument> {
        self.parsed.get_or_try_init(|| {
            debug!("parsing {}", self.path.display());

            let document = unwrap_path(&self.path)?;
            let mut headers = ControlParagraph::parse_str(&document.plaintext)?;

            inject_self_references(
                &mut headers,
                &self.path,
                self.options.effective_chunk_size(),
            )?;

            let message = headers.to_string();

            Ok(ParsedDocument {
                headers,
                message,
                envelope: document.envelope,
            })
        })
    }

    /// The parsed fields, including injected self references.
    pub fn headers(&self) -> Result<&ControlParagraph<'static>> {
        Ok(&self.parsed()?.headers)
    }

    /// Field names mapped to their trimmed values.
    pub fn header_map(&self) -> Result<HashMap<&str, &str>> {
        Ok(self.headers()?.as_str_hash_map())
    }

    /// The parsed fields serialized back to control file text.
    pub fn message_str(&self) -> Result<&str> {
        Ok(&self.parsed()?.message)
    }

    /// Whether the file was wrapped in an OpenPGP envelope.
    ///
    /// Signatures are not verified.
    pub fn is_signed(&self) -> Result<bool> {
        Ok(self.parsed()?.envelope.is_some())
    }

    /// The OpenPGP envelope the text was recovered from, if any.
    pub fn envelope(&self) -> Result<Option<&Envelope>> {
        Ok(self.parsed()?.envelope.as_ref())
    }

    /// Files from the `Files` field, resolved and checked for existence.
    pub fn resolved_source_files(&self) -> Result<&[ResolvedSourceFile]> {
        self.source_files
            .get_or_try_init(|| resolve_source_files(self.headers()?, &self.directory))
            .map(|files| files.as_slice())
    }

    /// Absolute paths of files in the `Files` field.
    pub fn source_files(&self) -> Result<Vec<&Path>> {
        Ok(self
            .resolved_source_files()?
            .iter()
            .map(|f| f.path.as_path())
            .collect())
    }

    /// Paths of files in the `Files` field with their declared sizes.
    pub fn sizes(&self) -> Result<BTreeSet<(&Path, u64)>> {
        Ok(self
            .resolved_source_files()?
            .iter()
            .map(|f| (f.path.as_path(), f.size))
            .collect())
    }

    /// Paths of files in the `Files` field that do not exist.
    pub fn missing_files(&self) -> Result<Vec<&Path>> {
        Ok(self
            .resolved_source_files()?
            .iter()
            .filter(|f| !f.present)
            .map(|f| f.path.as_path())
            .collect())
    }

    /// Whether every file in the `Files` field exists.
    pub fn all_files_present(&self) -> Result<bool> {
        Ok(self.resolved_source_files()?.iter().all(|f| f.present))
    }

    /// Digests claimed by every supported file list field.
    pub fn checksums(&self) -> Result<&ChecksumIndex> {
        self.checksums
            .get_or_try_init(|| build_checksum_index(self.headers()?, &self.directory))
    }

    /// Actual digests of files whose claimed digests are wrong.
    ///
    /// Every referenced file is read on first access.
    pub fn corrected_checksums(&self) -> Result<&CorrectionMap> {
        self.corrected_checksums
            .get_or_try_init(|| compute_corrections(self.checksums()?, &self.options))
    }

    /// Whether every claimed digest matches file content.
    pub fn all_checksums_correct(&self) -> Result<bool> {
        Ok(self.corrected_checksums()?.is_empty())
    }

    /// Verify that all referenced files exist and have the claimed digests.
    ///
    /// Missing files are reported before digest mismatches.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_files()?;
        if !missing.is_empty() {
            return Err(DscError::MissingSourceFiles(
                missing.into_iter().map(|p| p.to_path_buf()).collect(),
            ));
        }

        let corrections = self.corrected_checksums()?;
        if !corrections.is_empty() {
            return Err(DscError::ChecksumMismatch(corrections.clone()));
        }

        Ok(())
    }

    /// The name of the source package.
    pub fn source(&self) -> Result<&str> {
        self.headers()?.required_field_str("Source")
    }

    /// The version of the source package as a string.
    pub fn version_str(&self) -> Result<&str> {
        self.headers()?.required_field_str("Version")
    }

    /// The format of the source package.
    pub fn format(&self) -> Result<&str> {
        self.headers()?.required_field_str("Format")
    }

    /// The architectures this source package builds for.
    pub fn architecture(&self) -> Result<Option<Box<dyn Iterator<Item = &str> + '_>>> {
        Ok(self.headers()?.iter_field_words("Architecture"))
    }

    /// Names from [REQUIRED_FIELDS] not present in the document.
    pub fn missing_required_fields(&self) -> Result<Vec<&'static str>> {
        let headers = self.headers()?;

        Ok(REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| {
                let missing = !headers.has_field(name);
                if missing {
                    warn!("{} lacks {} field", self.path.display(), name);
                }
                missing
            })
            .collect())
    }

    fn lookup_property(&self, name: &str) -> Result<Option<DocumentValue<'_>>> {
        Ok(Some(match name {
            "path" => DocumentValue::Path(self.path()),
            "directory" | "dirname" => DocumentValue::Path(self.directory()),
            "message_str" => DocumentValue::Text(self.message_str()?),
            "source_files" => DocumentValue::Paths(self.source_files()?),
            "missing_files" => DocumentValue::Paths(self.missing_files()?),
            "all_files_present" => DocumentValue::Flag(self.all_files_present()?),
            "all_checksums_correct" => DocumentValue::Flag(self.all_checksums_correct()?),
            "is_signed" => DocumentValue::Flag(self.is_signed()?),
            _ => return Ok(None),
        }))
    }

    fn lookup_header(&self, name: &str) -> Result<Option<DocumentValue<'_>>> {
        Ok(self
            .headers()?
            .field_normalized(name)
            .map(|field| DocumentValue::Text(field.value_str())))
    }

    /// Resolve a named item.
    ///
    /// Property names such as `path` or `all_files_present` are tried first, then
    /// field names. Field names are case insensitive and `_` matches `-`, so
    /// `package_list` resolves the `Package-List` field.
    pub fn get(&self, name: &str) -> Result<Option<DocumentValue<'_>>> {
        let strategies: [LookupFn; 2] = [Self::lookup_property, Self::lookup_header];

        for strategy in strategies {
            if let Some(value) = strategy(self, name)? {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    /// Resolve a named item that must exist.
    pub fn item(&self, name: &str) -> Result<DocumentValue<'_>> {
        self.get(name)?
            .ok_or_else(|| DscError::ItemNotFound(name.to_string()))
    }

    /// Resolve a named item, falling back to a default.
    pub fn get_or<'a>(
        &'a self,
        name: &str,
        default: DocumentValue<'a>,
    ) -> Result<DocumentValue<'a>> {
        Ok(self.get(name)?.unwrap_or(default))
    }

    /// Whether a named item resolves.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::digest::{ChecksumType, ContentDigest},
        ::digest::Digest,
        tempfile::TempDir,
    };

    const DSC: &[u8] = include_bytes!("testdata/testdeb_0.0.0.dsc");
    const DSC_ASC: &[u8] = include_bytes!("testdata/testdeb_0.0.0.dsc.asc");
    const ORIG: &[u8] = include_bytes!("testdata/testdeb_0.0.0.orig.tar.gz");
    const DEBIAN: &[u8] = include_bytes!("testdata/testdeb_0.0.0-1.debian.tar.xz");

    const DSC_NAME: &str = "testdeb_0.0.0.dsc";
    const ORIG_NAME: &str = "testdeb_0.0.0.orig.tar.gz";
    const DEBIAN_NAME: &str = "testdeb_0.0.0-1.debian.tar.xz";

    fn fixture_dir(files: &[(&str, &[u8])]) -> Result<TempDir> {
        let td = tempfile::tempdir()?;

        for (name, data) in files {
            std::fs::write(td.path().join(name), data)?;
        }

        Ok(td)
    }

    fn complete_dir() -> Result<TempDir> {
        fixture_dir(&[(DSC_NAME, DSC), (ORIG_NAME, ORIG), (DEBIAN_NAME, DEBIAN)])
    }

    #[test]
    fn validate_complete() -> Result<()> {
        let td = complete_dir()?;
        let dsc = DebianSourceDescription::new(td.path().join(DSC_NAME))?;

        assert_eq!(dsc.directory(), td.path());
        assert!(!dsc.is_signed()?);
        assert!(dsc.envelope()?.is_none());
        assert_eq!(dsc.source()?, "testdeb");
        assert_eq!(dsc.version_str()?, "0.0.0-1");
        assert_eq!(dsc.format()?, "3.0 (quilt)");
        assert_eq!(
            dsc.architecture()?.unwrap().collect::<Vec<_>>(),
            vec!["all"]
        );
        assert_eq!(dsc.missing_required_fields()?, vec!["Package"]);

        assert_eq!(
            dsc.source_files()?,
            vec![
                td.path().join(ORIG_NAME).as_path(),
                td.path().join(DEBIAN_NAME).as_path(),
                td.path().join(DSC_NAME).as_path(),
            ]
        );
        assert!(dsc.sizes()?.contains(&(td.path().join(DSC_NAME).as_path(), DSC.len() as u64)));
        assert!(dsc.missing_files()?.is_empty());
        assert!(dsc.all_files_present()?);

        // 2 files plus the document for each of 3 algorithms.
        assert_eq!(dsc.checksums()?.len(), 9);
        assert_eq!(
            dsc.checksums()?.get(ChecksumType::Md5, &td.path().join(DSC_NAME)),
            Some(&ContentDigest::md5_hex("6327752c9fa73e0a64a165675ede7c63")?)
        );
        assert_eq!(
            dsc.checksums()?.get(ChecksumType::Sha256, &td.path().join(DSC_NAME)),
            Some(&ContentDigest::sha256_hex(
                "7ce069e3a4433d08062d99350cd4796100eb3ec0219a1eb592b55c95d38fcfcd"
            )?)
        );

        assert!(dsc.corrected_checksums()?.is_empty());
        assert!(dsc.all_checksums_correct()?);
        dsc.validate()?;

        Ok(())
    }

    #[test]
    fn message_includes_self_references() -> Result<()> {
        let td = complete_dir()?;
        let dsc = DebianSourceDescription::new(td.path().join(DSC_NAME))?;

        let message = dsc.message_str()?;
        assert!(message.starts_with("Format: 3.0 (quilt)\nSource: testdeb\n"));
        assert!(message.ends_with(
            "Files:\n e4d7ffa9ddf15c81a0ee21855d4cbeef 25 testdeb_0.0.0.orig.tar.gz\n \
             79cd05dd258c7c56b85f4675124e7271 31 testdeb_0.0.0-1.debian.tar.xz\n \
             6327752c9fa73e0a64a165675ede7c63 726 testdeb_0.0.0.dsc\n"
        ));

        // Fields that are not file lists are untouched.
        let original = std::str::from_utf8(DSC).map_err(|e| DscError::ControlParse(e.to_string()))?;
        let prefix = &original[0..original.find("Checksums-Sha1:").unwrap_or_default()];
        assert!(message.starts_with(prefix));

        assert_eq!(
            dsc.header_map()?.get("Maintainer"),
            Some(&"Test Maintainer <maintainer@example.com>")
        );

        Ok(())
    }

    #[test]
    fn signed_and_unsigned_agree() -> Result<()> {
        let td = fixture_dir(&[
            ("testdeb_0.0.0.dsc.asc", DSC_ASC),
            (ORIG_NAME, ORIG),
            (DEBIAN_NAME, DEBIAN),
        ])?;
        let path = td.path().join("testdeb_0.0.0.dsc.asc");
        let signed = DebianSourceDescription::new(&path)?;

        assert!(signed.is_signed()?);
        assert!(matches!(signed.envelope()?, Some(Envelope::Cleartext(_))));

        let plain = ControlParagraph::parse_str(
            std::str::from_utf8(DSC).map_err(|e| DscError::ControlParse(e.to_string()))?,
        )?;

        // Without self references the parsed fields are identical.
        let unwrapped = unwrap_path(&path)?;
        assert_eq!(ControlParagraph::parse_str(&unwrapped.plaintext)?, plain);

        for field in plain.iter_fields() {
            if field.name() == "Files" || field.name().starts_with("Checksums-") {
                continue;
            }
            assert_eq!(signed.headers()?.field(field.name()), Some(field));
        }

        let size = std::fs::metadata(&path)?.len();
        let md5 = hex::encode(md5::Md5::digest(DSC_ASC));
        assert_eq!(md5, "5c940ce6dc8a85b4ef9d21eb0083a6c2");
        assert!(signed.headers()?.field_str("Files").unwrap_or_default().ends_with(&format!(
            "\n {} {} testdeb_0.0.0.dsc.asc",
            md5, size
        )));

        signed.validate()?;

        Ok(())
    }

    #[test]
    fn missing_source_file() -> Result<()> {
        let td = fixture_dir(&[(DSC_NAME, DSC), (ORIG_NAME, ORIG)])?;
        let dsc = DebianSourceDescription::new(td.path().join(DSC_NAME))?;
        let debian = td.path().join(DEBIAN_NAME);

        assert!(!dsc.all_files_present()?);
        assert_eq!(dsc.missing_files()?, vec![debian.as_path()]);

        match dsc.validate() {
            Err(DscError::MissingSourceFiles(paths)) => assert_eq!(paths, vec![debian.clone()]),
            res => panic!("unexpected result: {:?}", res),
        }

        // The checksum pass reports unopenable files the same way.
        assert!(matches!(
            dsc.corrected_checksums(),
            Err(DscError::MissingSourceFiles(paths)) if paths.len() == 1 && paths[0] == debian
        ));

        Ok(())
    }

    #[test]
    fn altered_source_file() -> Result<()> {
        let altered = b"testdeb upstream sources, modified\n";
        let td = fixture_dir(&[(DSC_NAME, DSC), (ORIG_NAME, altered), (DEBIAN_NAME, DEBIAN)])?;
        let dsc = DebianSourceDescription::new(td.path().join(DSC_NAME))?;
        let orig = td.path().join(ORIG_NAME);

        assert!(dsc.all_files_present()?);
        assert!(!dsc.all_checksums_correct()?);

        let corrections = dsc.corrected_checksums()?;
        assert_eq!(corrections.len(), 3);
        assert_eq!(
            corrections.get(ChecksumType::Md5, &orig).map(|d| d.digest_bytes()),
            Some(md5::Md5::digest(altered).as_slice())
        );
        assert_eq!(
            corrections.get(ChecksumType::Sha1, &orig).map(|d| d.digest_bytes()),
            Some(sha1::Sha1::digest(altered).as_slice())
        );
        assert_eq!(
            corrections.get(ChecksumType::Sha256, &orig).map(|d| d.digest_bytes()),
            Some(sha2::Sha256::digest(altered).as_slice())
        );

        match dsc.validate() {
            Err(DscError::ChecksumMismatch(map)) => assert_eq!(&map, corrections),
            res => panic!("unexpected result: {:?}", res),
        }

        Ok(())
    }

    #[test]
    fn single_digest_mismatch() -> Result<()> {
        let content = vec![b'x'; 120];
        let actual = hex::encode(md5::Md5::digest(&content));

        let mut wrong = actual.clone().into_bytes();
        wrong[0] = if wrong[0] == b'a' { b'b' } else { b'a' };
        let wrong = String::from_utf8(wrong).map_err(|e| DscError::ControlParse(e.to_string()))?;

        for (declared, expect_correct) in [(&actual, true), (&wrong, false)] {
            let document = format!("Source: foo\nFiles:\n {} 120 foo.tar.gz\n", declared);
            let td = fixture_dir(&[("foo.dsc", document.as_bytes()), ("foo.tar.gz", &content)])?;
            let dsc = DebianSourceDescription::new(td.path().join("foo.dsc"))?;

            assert_eq!(dsc.all_checksums_correct()?, expect_correct);

            if expect_correct {
                dsc.validate()?;
            } else {
                let corrections = dsc.corrected_checksums()?;
                assert_eq!(corrections.len(), 1);
                assert_eq!(
                    corrections
                        .get(ChecksumType::Md5, &td.path().join("foo.tar.gz"))
                        .map(|d| d.digest_hex()),
                    Some(actual.clone())
                );
                assert!(matches!(dsc.validate(), Err(DscError::ChecksumMismatch(_))));
            }
        }

        Ok(())
    }

    #[test]
    fn item_lookup() -> Result<()> {
        let td = complete_dir()?;
        let dsc = DebianSourceDescription::new(td.path().join(DSC_NAME))?;

        assert_eq!(dsc.item("Source")?, DocumentValue::Text("testdeb"));
        assert_eq!(dsc.item("source")?, DocumentValue::Text("testdeb"));
        assert_eq!(dsc.item("standards_version")?, DocumentValue::Text("4.6.0"));
        assert_eq!(
            dsc.item("Package_List")?,
            DocumentValue::Text("testdeb deb misc optional arch=all")
        );
        assert_eq!(dsc.item("path")?, DocumentValue::Path(dsc.path()));
        assert_eq!(dsc.item("all_files_present")?, DocumentValue::Flag(true));
        assert_eq!(dsc.item("is_signed")?, DocumentValue::Flag(false));
        assert_eq!(dsc.item("missing_files")?, DocumentValue::Paths(vec![]));
        assert_eq!(dsc.item("is_signed")?.to_string(), "false");

        assert!(matches!(
            dsc.item("no_such_thing"),
            Err(DscError::ItemNotFound(name)) if name == "no_such_thing"
        ));
        assert_eq!(dsc.get("Package")?, None);
        assert!(dsc.contains("Checksums_Sha256")?);
        assert!(!dsc.contains("Package")?);
        assert_eq!(
            dsc.get_or("Package", DocumentValue::Text("unknown"))?,
            DocumentValue::Text("unknown")
        );

        Ok(())
    }

    #[test]
    fn parsed_once() -> Result<()> {
        let td = complete_dir()?;
        let path = td.path().join(DSC_NAME);
        let dsc = DebianSourceDescription::new(&path)?;

        let first = dsc.headers()? as *const _;
        std::fs::remove_file(&path)?;

        assert_eq!(dsc.headers()? as *const _, first);
        assert_eq!(dsc.source()?, "testdeb");

        // A fresh instance sees the deletion.
        assert!(matches!(
            DebianSourceDescription::new(&path)?.headers(),
            Err(DscError::UnreadableDocument(_, _))
        ));

        Ok(())
    }

    #[test]
    fn parsed_once_concurrently() -> Result<()> {
        let td = complete_dir()?;
        let dsc = DebianSourceDescription::new(td.path().join(DSC_NAME))?;
        let shared = &dsc;

        let addresses = std::thread::scope(|s| {
            let handles = (0..8)
                .map(|_| {
                    s.spawn(move || -> Result<(usize, usize)> {
                        Ok((
                            shared.headers()? as *const ControlParagraph as usize,
                            shared.corrected_checksums()? as *const CorrectionMap as usize,
                        ))
                    })
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|h| h.join().expect("thread should not panic"))
                .collect::<Result<Vec<_>>>()
        })?;

        assert_eq!(addresses.len(), 8);
        assert!(addresses.iter().all(|a| *a == addresses[0]));
        assert!(dsc.corrected_checksums()?.is_empty());

        Ok(())
    }

    #[test]
    fn missing_manifest() -> Result<()> {
        let td = fixture_dir(&[("bare.dsc", b"Source: bare\nVersion: 1.0\n")])?;
        let dsc = DebianSourceDescription::new(td.path().join("bare.dsc"))?;

        assert!(dsc.checksums()?.is_empty());
        assert!(matches!(
            dsc.source_files(),
            Err(DscError::MissingFileManifest)
        ));
        assert!(matches!(dsc.validate(), Err(DscError::MissingFileManifest)));

        Ok(())
    }

    #[test]
    fn malformed_file_list() -> Result<()> {
        let td = fixture_dir(&[(
            "bad.dsc",
            b"Source: bad\nFiles:\n e4d7ffa9ddf15c81a0ee21855d4cbeef testdeb.tar.gz\n",
        )])?;
        let dsc = DebianSourceDescription::new(td.path().join("bad.dsc"))?;

        assert!(matches!(
            dsc.headers(),
            Err(DscError::MalformedChecksumLine { .. })
        ));

        Ok(())
    }

    #[test]
    fn options_and_paths() -> Result<()> {
        let td = complete_dir()?;
        let options = ValidationOptions::default()
            .with_chunk_size(3)
            .with_concurrency(Some(2));
        let dsc = DebianSourceDescription::with_options(
            td.path().join("sub").join("..").join(DSC_NAME),
            options,
        )?;

        assert_eq!(dsc.path(), td.path().join(DSC_NAME));
        assert_eq!(dsc.options(), &options);
        dsc.validate()?;

        let relative = DebianSourceDescription::new("relative.dsc")?;
        assert!(relative.path().is_absolute());
        assert_eq!(relative.path(), std::env::current_dir()?.join("relative.dsc"));

        Ok(())
    }
}

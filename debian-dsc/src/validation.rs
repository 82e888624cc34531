// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Verification of claimed digests against file content.

[compute_corrections()] recomputes every digest in a [ChecksumIndex] and reports the
actual digest of each entry that disagrees. Files are digested independently, so
work is spread over a [rayon] thread pool.
*/

use {
    crate::{
        checksums::{ChecksumIndex, CorrectionMap},
        digest::{digest_reader, ContentDigest, DEFAULT_CHUNK_SIZE},
        error::{DscError, Result},
    },
    log::{debug, warn},
    rayon::prelude::*,
    std::path::{Path, PathBuf},
};

/// Knobs controlling how source files are read and digested.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ValidationOptions {
    /// Size of each read when digesting file content.
    ///
    /// A value of 0 is treated as 1.
    pub chunk_size: usize,

    /// Number of threads used to digest files.
    ///
    /// `None` uses the global rayon thread pool. `Some(1)` digests on the
    /// calling thread. Larger values use a dedicated pool of that size.
    pub concurrency: Option<usize>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: None,
        }
    }
}

impl ValidationOptions {
    /// Set the read size used when digesting.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the number of digesting threads.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// The effective read size.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

enum Outcome {
    Match,
    Mismatch(PathBuf, ContentDigest),
    Missing(PathBuf),
    Failed(PathBuf, std::io::Error),
}

fn check_digest(path: &Path, expected: &ContentDigest, chunk_size: usize) -> Outcome {
    let fh = match std::fs::File::open(path) {
        Ok(fh) => fh,
        Err(e) => {
            warn!("unable to open {}: {}", path.display(), e);
            return Outcome::Missing(path.to_path_buf());
        }
    };

    // Directories and the like open fine on some platforms but have no content.
    match fh.metadata() {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => {
            warn!("{} is not a regular file", path.display());
            return Outcome::Missing(path.to_path_buf());
        }
        Err(e) => return Outcome::Failed(path.to_path_buf(), e),
    }

    debug!("computing {} of {}", expected.checksum_type(), path.display());

    match digest_reader(fh, expected.checksum_type(), chunk_size) {
        Ok(actual) if actual.digest_bytes() == expected.digest_bytes() => Outcome::Match,
        Ok(actual) => {
            debug!(
                "{} digest mismatch for {}: expected {}; got {}",
                expected.checksum_type(),
                path.display(),
                expected,
                actual
            );
            Outcome::Mismatch(path.to_path_buf(), actual)
        }
        Err(e) => Outcome::Failed(path.to_path_buf(), e),
    }
}

/// Recompute every digest in `index` and collect those that differ.
///
/// The returned map holds the actual digests of mismatched entries, keyed the same
/// way as `index`. It is empty when every digest matches.
///
/// Files that cannot be opened produce [DscError::MissingSourceFiles] naming all
/// of them. Errors while reading an opened file produce [DscError::Io].
pub fn compute_corrections(
    index: &ChecksumIndex,
    options: &ValidationOptions,
) -> Result<CorrectionMap> {
    let chunk_size = options.effective_chunk_size();
    let work = index.iter().collect::<Vec<_>>();

    let check =
        |(path, expected): &(&Path, &ContentDigest)| check_digest(path, expected, chunk_size);

    let outcomes = match options.concurrency {
        Some(0) | Some(1) => work.iter().map(check).collect::<Vec<_>>(),
        None => work.par_iter().map(check).collect::<Vec<_>>(),
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?;

            pool.install(|| work.par_iter().map(check).collect::<Vec<_>>())
        }
    };

    let mut corrections = CorrectionMap::default();
    let mut missing = vec![];
    let mut failure = None;

    for outcome in outcomes {
        match outcome {
            Outcome::Match => {}
            Outcome::Mismatch(path, actual) => {
                corrections.insert(path, actual);
            }
            Outcome::Missing(path) => missing.push(path),
            Outcome::Failed(path, e) => {
                warn!("error reading {}: {}", path.display(), e);
                failure.get_or_insert(e);
            }
        }
    }

    if !missing.is_empty() {
        missing.sort();
        missing.dedup();
        return Err(DscError::MissingSourceFiles(missing));
    }

    if let Some(e) = failure {
        return Err(DscError::Io(e));
    }

    Ok(corrections)
}

#[cfg(test)]
mod test {
    use {super::*, crate::digest::ChecksumType};

    const ORIG: &[u8] = b"testdeb upstream sources\n";

    fn index(dir: &Path) -> Result<ChecksumIndex> {
        let path = dir.join("testdeb_0.0.0.orig.tar.gz");
        let mut index = ChecksumIndex::default();
        index.insert(
            path.clone(),
            ContentDigest::md5_hex("e4d7ffa9ddf15c81a0ee21855d4cbeef")?,
        );
        index.insert(
            path.clone(),
            ContentDigest::sha1_hex("5dbb16c1919ec830ec8598211b0d19a0125a6fc0")?,
        );
        index.insert(
            path,
            ContentDigest::sha256_hex(
                "0494bbdf8489b6d882e6c699a88883383eae2eb96d9ef41a99ae2772d386dc27",
            )?,
        );

        Ok(index)
    }

    #[test]
    fn options() {
        let options = ValidationOptions::default();
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(options.concurrency, None);

        let options = options.with_chunk_size(0).with_concurrency(Some(4));
        assert_eq!(options.effective_chunk_size(), 1);
        assert_eq!(options.concurrency, Some(4));
    }

    #[test]
    fn all_match() -> Result<()> {
        let td = tempfile::tempdir()?;
        std::fs::write(td.path().join("testdeb_0.0.0.orig.tar.gz"), ORIG)?;
        let index = index(td.path())?;

        for concurrency in [None, Some(1), Some(3)] {
            let options = ValidationOptions::default()
                .with_chunk_size(7)
                .with_concurrency(concurrency);

            assert!(compute_corrections(&index, &options)?.is_empty());
        }

        Ok(())
    }

    #[test]
    fn mismatch_reports_actual_digest() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = td.path().join("testdeb_0.0.0.orig.tar.gz");
        std::fs::write(&path, ORIG)?;

        let mut index = index(td.path())?;
        index.insert(
            path.clone(),
            ContentDigest::sha1_hex("a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1")?,
        );

        let corrections = compute_corrections(&index, &ValidationOptions::default())?;
        assert_eq!(corrections.len(), 1);
        assert_eq!(
            corrections.get(ChecksumType::Sha1, &path),
            Some(&ContentDigest::sha1_hex(
                "5dbb16c1919ec830ec8598211b0d19a0125a6fc0"
            )?)
        );

        Ok(())
    }

    #[test]
    fn missing_files() -> Result<()> {
        let td = tempfile::tempdir()?;
        let mut index = index(td.path())?;
        index.insert(
            td.path().join("another.tar.xz"),
            ContentDigest::md5_hex("79cd05dd258c7c56b85f4675124e7271")?,
        );

        match compute_corrections(&index, &ValidationOptions::default().with_concurrency(Some(1)))
        {
            Err(DscError::MissingSourceFiles(paths)) => {
                assert_eq!(
                    paths,
                    vec![
                        td.path().join("another.tar.xz"),
                        td.path().join("testdeb_0.0.0.orig.tar.gz"),
                    ]
                );
            }
            res => panic!("unexpected result: {:?}", res),
        }

        Ok(())
    }

    #[test]
    fn directories_are_missing() -> Result<()> {
        let td = tempfile::tempdir()?;
        let dir = td.path().join("testdeb_0.0.0.orig.tar.gz");
        std::fs::create_dir(&dir)?;

        let mut index = ChecksumIndex::default();
        index.insert(
            dir.clone(),
            ContentDigest::sha1_hex("5dbb16c1919ec830ec8598211b0d19a0125a6fc0")?,
        );

        for concurrency in [None, Some(1)] {
            let options = ValidationOptions::default().with_concurrency(concurrency);

            match compute_corrections(&index, &options) {
                Err(DscError::MissingSourceFiles(paths)) => assert_eq!(paths, vec![dir.clone()]),
                res => panic!("unexpected result: {:?}", res),
            }
        }

        Ok(())
    }

    #[test]
    fn empty_index() -> Result<()> {
        assert!(
            compute_corrections(&ChecksumIndex::default(), &ValidationOptions::default())?
                .is_empty()
        );

        Ok(())
    }
}

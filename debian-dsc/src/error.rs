// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use {crate::checksums::CorrectionMap, std::path::PathBuf, thiserror::Error};

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum DscError {
    #[error("unable to read source description {0}: {1:?}")]
    UnreadableDocument(PathBuf, std::io::Error),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("control file parse error: {0}")]
    ControlParse(String),

    #[error("required field missing in source description: {0}")]
    ControlRequiredFieldMissing(String),

    #[error("source description does not have a Files field")]
    MissingFileManifest,

    #[error("files listed in source description not found: {}", display_paths(.0))]
    MissingSourceFiles(Vec<PathBuf>),

    #[error("incorrect checksums for {} source description entries", .0.len())]
    ChecksumMismatch(CorrectionMap),

    #[error("malformed {field} entry `{line}`: {reason}")]
    MalformedChecksumLine {
        field: String,
        line: String,
        reason: String,
    },

    #[error("bad hex in content digest {0}: {1:?}")]
    ContentDigestBadHex(String, hex::FromHexError),

    #[error("no item named {0}")]
    ItemNotFound(String),

    #[error("unable to build digest worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, DscError>;

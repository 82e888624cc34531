// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Content digests.

Debian source descriptions record digests of each source file in `Files` (MD5) and
`Checksums-<algorithm>` fields. This module defines the supported algorithms
([ChecksumType]), parsed digest values ([ContentDigest]) and streaming computation
of digests over files and readers.
*/

use {
    crate::error::{DscError, Result},
    pgp::crypto::Hasher,
    pgp_cleartext::CleartextHasher,
    std::{
        fmt::Formatter,
        io::Read,
        path::Path,
    },
};

/// Default size of reads when digesting content.
pub const DEFAULT_CHUNK_SIZE: usize = 65536;

/// Checksum type / digest mechanism used in a source description.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ChecksumType {
    /// MD5.
    Md5,

    /// SHA-1.
    Sha1,

    /// SHA-256.
    Sha256,

    /// SHA-384.
    Sha384,

    /// SHA-512.
    Sha512,
}

impl ChecksumType {
    /// Resolve a checksum type from its name.
    ///
    /// Names are case insensitive. e.g. `Sha256` from a `Checksums-Sha256` field.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Lowercase name of this checksum type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Obtain a new hasher for this checksum flavor.
    pub fn new_hasher(&self) -> Box<dyn Hasher + Send> {
        Box::new(match self {
            Self::Md5 => CleartextHasher::md5(),
            Self::Sha1 => CleartextHasher::sha1(),
            Self::Sha256 => CleartextHasher::sha256(),
            Self::Sha384 => CleartextHasher::sha384(),
            Self::Sha512 => CleartextHasher::sha512(),
        })
    }
}

impl std::fmt::Display for ChecksumType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents a content digest.
#[derive(Clone, Eq, Hash, PartialEq, PartialOrd)]
pub enum ContentDigest {
    /// An MD5 digest.
    Md5(Vec<u8>),
    /// A SHA-1 digest.
    Sha1(Vec<u8>),
    /// A SHA-256 digest.
    Sha256(Vec<u8>),
    /// A SHA-384 digest.
    Sha384(Vec<u8>),
    /// A SHA-512 digest.
    Sha512(Vec<u8>),
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5(data) => write!(f, "Md5({})", hex::encode(data)),
            Self::Sha1(data) => write!(f, "Sha1({})", hex::encode(data)),
            Self::Sha256(data) => write!(f, "Sha256({})", hex::encode(data)),
            Self::Sha384(data) => write!(f, "Sha384({})", hex::encode(data)),
            Self::Sha512(data) => write!(f, "Sha512({})", hex::encode(data)),
        }
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.digest_hex())
    }
}

impl ContentDigest {
    /// Create a new MD5 instance by parsing a hex digest.
    pub fn md5_hex(digest: &str) -> Result<Self> {
        Self::from_hex_digest(ChecksumType::Md5, digest)
    }

    /// Create a new SHA-1 instance by parsing a hex digest.
    pub fn sha1_hex(digest: &str) -> Result<Self> {
        Self::from_hex_digest(ChecksumType::Sha1, digest)
    }

    /// Create a new SHA-256 instance by parsing a hex digest.
    pub fn sha256_hex(digest: &str) -> Result<Self> {
        Self::from_hex_digest(ChecksumType::Sha256, digest)
    }

    /// Obtain an instance by parsing a hex string as a [ChecksumType].
    ///
    /// Upper and lower case hex are both accepted.
    pub fn from_hex_digest(checksum: ChecksumType, digest: &str) -> Result<Self> {
        let digest = hex::decode(digest)
            .map_err(|e| DscError::ContentDigestBadHex(digest.to_string(), e))?;

        Ok(Self::from_bytes(checksum, digest))
    }

    /// Construct an instance from raw digest bytes.
    pub fn from_bytes(checksum: ChecksumType, digest: Vec<u8>) -> Self {
        match checksum {
            ChecksumType::Md5 => Self::Md5(digest),
            ChecksumType::Sha1 => Self::Sha1(digest),
            ChecksumType::Sha256 => Self::Sha256(digest),
            ChecksumType::Sha384 => Self::Sha384(digest),
            ChecksumType::Sha512 => Self::Sha512(digest),
        }
    }

    /// Obtain the digest bytes for this content digest.
    pub fn digest_bytes(&self) -> &[u8] {
        match self {
            Self::Md5(x) => x,
            Self::Sha1(x) => x,
            Self::Sha256(x) => x,
            Self::Sha384(x) => x,
            Self::Sha512(x) => x,
        }
    }

    /// Obtain the hex encoded content digest.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest_bytes())
    }

    /// Obtain the [ChecksumType] for this digest.
    pub fn checksum_type(&self) -> ChecksumType {
        match self {
            Self::Md5(_) => ChecksumType::Md5,
            Self::Sha1(_) => ChecksumType::Sha1,
            Self::Sha256(_) => ChecksumType::Sha256,
            Self::Sha384(_) => ChecksumType::Sha384,
            Self::Sha512(_) => ChecksumType::Sha512,
        }
    }
}

/// Compute the digest of all content from a reader.
///
/// Content is consumed in reads of at most `chunk_size` bytes, so memory use does not
/// depend on the size of the content.
pub fn digest_reader(
    mut reader: impl Read,
    checksum: ChecksumType,
    chunk_size: usize,
) -> std::io::Result<ContentDigest> {
    let mut hasher = checksum.new_hasher();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        hasher.update(&buffer[0..count]);
    }

    Ok(ContentDigest::from_bytes(checksum, hasher.finish()))
}

/// Compute the digest of a file's content.
pub fn digest_path(
    path: impl AsRef<Path>,
    checksum: ChecksumType,
    chunk_size: usize,
) -> std::io::Result<ContentDigest> {
    let fh = std::fs::File::open(path.as_ref())?;

    digest_reader(fh, checksum, chunk_size)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! PGP cleartext framework

The PGP cleartext framework is a mechanism to store PGP signatures inline with
the cleartext data that is being signed. Debian source description (`.dsc`) files
are commonly distributed in this form.

The cleartext framework is defined by
[RFC 4880 Section 7](https://datatracker.ietf.org/doc/html/rfc4880.html#section-7).

PGP cleartext signatures are text documents beginning with
`-----BEGIN PGP SIGNED MESSAGE-----`. They have the form:

```text
-----BEGIN PGP SIGNED MESSAGE-----
Hash: <digest>

<dash-escaped signed content>
-----BEGIN PGP SIGNATURE-----
<headers>

<signature data>
-----END PGP SIGNATURE-----
```

[CleartextMessage::parse()] splits such a document into the original cleartext and
the parsed signature packets. Signatures are **not** verified: the hashers fed with
the canonicalized cleartext are retained in [CleartextSignatures] so a caller holding
the signer's public key can do that separately.

This crate also provides [CleartextHasher], a cloneable wrapper around the digest
algorithms used by PGP and by Debian packaging metadata.
*/

use {
    digest::Digest,
    pgp::{
        crypto::{HashAlgorithm, Hasher},
        packet::Packet,
        Signature,
    },
    std::{
        collections::HashMap,
        io,
    },
    thiserror::Error,
};

const HEADER: &str = "-----BEGIN PGP SIGNED MESSAGE-----";
const SIGNATURE_ARMOR: &str = "-----BEGIN PGP SIGNATURE-----";

/// Errors from parsing cleartext signature documents.
#[derive(Debug, Error)]
pub enum CleartextError {
    #[error("content does not begin with `-----BEGIN PGP SIGNED MESSAGE-----`")]
    NotCleartext,

    #[error("cleartext content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("bad PGP cleartext signature; expected Hash: header; got {0}")]
    BadArmorHeader(String),

    #[error("unsupported PGP hash type: {0}")]
    UnsupportedHash(String),

    #[error("bad PGP cleartext signature; no Hash headers")]
    NoHashHeaders,

    #[error("cleartext is not followed by `-----BEGIN PGP SIGNATURE-----`")]
    MissingSignatureArmor,

    #[error("signature block contains no PGP signatures")]
    NoSignatures,

    #[error("failed to parse PGP signature block: {0}")]
    SignatureBlock(#[from] io::Error),
}

/// Wrapper around content digesting to work around lack of clone() in pgp crate.
#[derive(Clone)]
pub enum CleartextHasher {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

impl CleartextHasher {
    pub fn md5() -> Self {
        Self::Md5(md5::Md5::new())
    }

    pub fn sha1() -> Self {
        Self::Sha1(sha1::Sha1::new())
    }

    pub fn sha256() -> Self {
        Self::Sha256(sha2::Sha256::new())
    }

    pub fn sha384() -> Self {
        Self::Sha384(sha2::Sha384::new())
    }

    pub fn sha512() -> Self {
        Self::Sha512(sha2::Sha512::new())
    }

    /// Resolve a hasher from the name used in a `Hash: ` armor header.
    pub fn from_armor_name(name: &str) -> Option<Self> {
        match name {
            "MD5" => Some(Self::md5()),
            "SHA1" => Some(Self::sha1()),
            "SHA256" => Some(Self::sha256()),
            "SHA384" => Some(Self::sha384()),
            "SHA512" => Some(Self::sha512()),
            _ => None,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Md5(_) => HashAlgorithm::MD5,
            Self::Sha1(_) => HashAlgorithm::SHA1,
            Self::Sha256(_) => HashAlgorithm::SHA2_256,
            Self::Sha384(_) => HashAlgorithm::SHA2_384,
            Self::Sha512(_) => HashAlgorithm::SHA2_512,
        }
    }
}

impl std::io::Write for CleartextHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Hasher for CleartextHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(digest) => digest.update(data),
            Self::Sha1(digest) => digest.update(data),
            Self::Sha256(digest) => digest.update(data),
            Self::Sha384(digest) => digest.update(data),
            Self::Sha512(digest) => digest.update(data),
        }
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        match *self {
            Self::Md5(digest) => digest.finalize().to_vec(),
            Self::Sha1(digest) => digest.finalize().to_vec(),
            Self::Sha256(digest) => digest.finalize().to_vec(),
            Self::Sha384(digest) => digest.finalize().to_vec(),
            Self::Sha512(digest) => digest.finalize().to_vec(),
        }
    }
}

/// Whether data looks like the start of a cleartext signed document.
///
/// Only the armor header line is inspected. Leading blank lines are tolerated.
pub fn is_cleartext_signed(data: &[u8]) -> bool {
    data.split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .find(|line| !line.iter().all(|b| b.is_ascii_whitespace()))
        .map(|line| line == HEADER.as_bytes())
        .unwrap_or(false)
}

/// Parsed signature state from a cleartext signed document.
///
/// Holds the parsed PGP signature packets and hashers primed with the canonicalized
/// cleartext, which is everything needed to later verify signatures against a key.
pub struct CleartextSignatures {
    hashers: HashMap<u8, CleartextHasher>,
    signatures: Vec<Signature>,
}

impl CleartextSignatures {
    /// Iterate over signatures in this instance.
    pub fn iter_signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }

    /// Hash algorithms advertised by the `Hash: ` armor headers.
    pub fn hash_algorithms(&self) -> impl Iterator<Item = HashAlgorithm> + '_ {
        self.hashers.values().map(|h| h.algorithm())
    }

    /// Obtain a copy of the hasher fed with the signed content for a given algorithm.
    ///
    /// Signature verification appends signature-specific trailer data to this hasher.
    pub fn content_hasher(&self, algorithm: HashAlgorithm) -> Option<CleartextHasher> {
        self.hashers.get(&(algorithm as u8)).cloned()
    }
}

impl std::fmt::Debug for CleartextSignatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleartextSignatures")
            .field("hash_algorithms", &self.hash_algorithms().collect::<Vec<_>>())
            .field("signatures", &self.signatures.len())
            .finish()
    }
}

/// A document in the PGP cleartext signature framework, split into its parts.
#[derive(Debug)]
pub struct CleartextMessage {
    text: String,
    signatures: CleartextSignatures,
}

impl CleartextMessage {
    /// Parse a cleartext signed document.
    ///
    /// Dash escaping is reversed and the original line endings of the cleartext are
    /// preserved, so [Self::text()] is the document as it was before signing.
    pub fn parse(data: &[u8]) -> Result<Self, CleartextError> {
        if !is_cleartext_signed(data) {
            return Err(CleartextError::NotCleartext);
        }

        let data = std::str::from_utf8(data)?;
        let mut lines = data
            .split_inclusive('\n')
            .skip_while(|line| line.trim().is_empty())
            .skip(1);

        // 1 or more `Hash: ` armor headers terminated by an empty line.
        let mut hashers = HashMap::new();
        loop {
            let line = lines.next().ok_or(CleartextError::NoHashHeaders)?;

            if let Some(value) = line.strip_prefix("Hash: ") {
                for hash in value.split(',').map(|x| x.trim()).filter(|x| !x.is_empty()) {
                    let hasher = CleartextHasher::from_armor_name(hash)
                        .ok_or_else(|| CleartextError::UnsupportedHash(hash.to_string()))?;

                    hashers.entry(hasher.algorithm() as u8).or_insert(hasher);
                }
            } else if line.trim().is_empty() {
                break;
            } else {
                return Err(CleartextError::BadArmorHeader(line.trim_end().to_string()));
            }
        }

        if hashers.is_empty() {
            return Err(CleartextError::NoHashHeaders);
        }

        // Signed text is hashed with canonical CRLF line endings and the line ending
        // before the signature armor is not part of it (RFC 4880 Section 7.1).
        let mut text = String::with_capacity(data.len());
        let mut first = true;
        let mut found_signature = false;

        for line in lines.by_ref() {
            if line.trim_end_matches(|c| c == '\r' || c == '\n') == SIGNATURE_ARMOR {
                found_signature = true;
                break;
            }

            let emit = line.strip_prefix("- ").unwrap_or(line);
            let no_eol = emit.trim_end_matches(|c| c == '\r' || c == '\n');

            for hasher in hashers.values_mut() {
                if !first {
                    hasher.update(b"\r\n");
                }
                hasher.update(no_eol.as_bytes());
            }

            first = false;
            text.push_str(emit);
        }

        if !found_signature {
            return Err(CleartextError::MissingSignatureArmor);
        }

        let mut armor = format!("{}\n", SIGNATURE_ARMOR);
        armor.extend(lines);

        let signatures = read_signature_packets(armor.into_bytes())?;
        if signatures.is_empty() {
            return Err(CleartextError::NoSignatures);
        }

        Ok(Self {
            text,
            signatures: CleartextSignatures {
                hashers,
                signatures,
            },
        })
    }

    /// The signed cleartext.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parsed signature state.
    pub fn signatures(&self) -> &CleartextSignatures {
        &self.signatures
    }

    /// Consume self, returning the cleartext and signature state.
    pub fn into_parts(self) -> (String, CleartextSignatures) {
        (self.text, self.signatures)
    }
}

fn read_signature_packets(armor: Vec<u8>) -> io::Result<Vec<Signature>> {
    let mut dearmor = pgp::armor::Dearmor::new(io::Cursor::new(armor));
    dearmor.read_header()?;

    if !matches!(dearmor.typ, Some(pgp::armor::BlockType::Signature)) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "failed to parse PGP signature armor",
        ));
    }

    let mut signatures = vec![];

    for packet in pgp::packet::PacketParser::new(dearmor) {
        match packet {
            Ok(Packet::Signature(signature)) => {
                signatures.push(signature);
            }
            Ok(packet) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "unexpected PGP packet seen; expected Signature; got {:?}",
                        packet.tag()
                    ),
                ));
            }
            Err(e) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("PGP packet parsing error: {:?}", e),
                ));
            }
        }
    }

    Ok(signatures)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! OpenPGP envelopes around source descriptions.

Source descriptions are usually distributed inside a PGP cleartext signature. Less
commonly they are wrapped in an ASCII armored or binary OpenPGP message. This module
recovers the enclosed text. Signatures are parsed but not verified.

Content not in an envelope is the common case and is not an error: [probe_envelope()]
reports it as [EnvelopeStatus::NotEnvelope] and [unwrap_bytes()] falls back to treating
the content as plain text.
*/

use {
    crate::error::{DscError, Result},
    log::{debug, warn},
    pgp::{Deserializable, Message},
    pgp_cleartext::{is_cleartext_signed, CleartextMessage, CleartextSignatures},
    std::{io::Cursor, path::Path},
};

const MESSAGE_ARMOR: &str = "-----BEGIN PGP MESSAGE-----";

/// A recognized OpenPGP envelope.
#[derive(Debug)]
pub enum Envelope {
    /// A cleartext signature. Signatures and primed content hashers are retained.
    Cleartext(CleartextSignatures),

    /// An ASCII armored or binary OpenPGP message.
    Message(Box<Message>),
}

/// Text recovered from an envelope.
#[derive(Debug)]
pub struct SignedContent {
    /// The enclosed text.
    pub plaintext: String,

    /// The envelope the text was recovered from.
    pub envelope: Envelope,
}

/// Why content was not treated as an envelope.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NotEnvelopeReason {
    /// Content does not start like any OpenPGP envelope.
    Unarmored,

    /// Content looks like an envelope but could not be parsed.
    Malformed(String),
}

/// Outcome of examining content for an OpenPGP envelope.
#[derive(Debug)]
pub enum EnvelopeStatus {
    /// An envelope was found and its text recovered.
    Signed(SignedContent),

    /// Content should be interpreted as plain text.
    NotEnvelope(NotEnvelopeReason),
}

fn first_line(data: &[u8]) -> Option<&[u8]> {
    data.split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .find(|line| !line.iter().all(|b| b.is_ascii_whitespace()))
}

fn probe_cleartext(data: &[u8]) -> EnvelopeStatus {
    match CleartextMessage::parse(data) {
        Ok(message) => {
            let (plaintext, signatures) = message.into_parts();

            EnvelopeStatus::Signed(SignedContent {
                plaintext,
                envelope: Envelope::Cleartext(signatures),
            })
        }
        Err(e) => EnvelopeStatus::NotEnvelope(NotEnvelopeReason::Malformed(e.to_string())),
    }
}

fn probe_message(message: pgp::errors::Result<Message>) -> EnvelopeStatus {
    let malformed =
        |reason: String| EnvelopeStatus::NotEnvelope(NotEnvelopeReason::Malformed(reason));

    let message = match message {
        Ok(message) => message,
        Err(e) => return malformed(e.to_string()),
    };

    let content = match message.get_content() {
        Ok(Some(content)) => content,
        Ok(None) => return malformed("message has no literal data".to_string()),
        Err(e) => return malformed(e.to_string()),
    };

    match String::from_utf8(content) {
        Ok(plaintext) => EnvelopeStatus::Signed(SignedContent {
            plaintext,
            envelope: Envelope::Message(Box::new(message)),
        }),
        Err(e) => malformed(format!("message content is not UTF-8: {}", e)),
    }
}

/// Examine content for an OpenPGP envelope.
///
/// This performs no I/O and never fails: content that is not an envelope, or that
/// is an envelope we cannot parse, is reported via [EnvelopeStatus::NotEnvelope].
pub fn probe_envelope(data: &[u8]) -> EnvelopeStatus {
    if is_cleartext_signed(data) {
        probe_cleartext(data)
    } else if first_line(data) == Some(MESSAGE_ARMOR.as_bytes()) {
        probe_message(Message::from_armor_single(Cursor::new(data)).map(|(message, _)| message))
    } else if data.first().map(|b| b & 0x80 != 0).unwrap_or(false) {
        probe_message(Message::from_bytes(Cursor::new(data)))
    } else {
        EnvelopeStatus::NotEnvelope(NotEnvelopeReason::Unarmored)
    }
}

/// A document with any envelope removed.
#[derive(Debug)]
pub struct UnwrappedDocument {
    /// Text of the document.
    pub plaintext: String,

    /// The envelope the text was found in, if any.
    pub envelope: Option<Envelope>,
}

impl UnwrappedDocument {
    /// Whether the text was recovered from an OpenPGP envelope.
    ///
    /// This reflects structure only. No signature has been verified.
    pub fn is_signed(&self) -> bool {
        self.envelope.is_some()
    }
}

/// Recover document text from content, falling back to plain text.
///
/// Errors only when the content is neither an envelope nor UTF-8 text.
pub fn unwrap_bytes(
    data: Vec<u8>,
) -> std::result::Result<UnwrappedDocument, std::string::FromUtf8Error> {
    match probe_envelope(&data) {
        EnvelopeStatus::Signed(content) => {
            debug!("recovered text from OpenPGP envelope");

            Ok(UnwrappedDocument {
                plaintext: content.plaintext,
                envelope: Some(content.envelope),
            })
        }
        EnvelopeStatus::NotEnvelope(reason) => {
            match reason {
                NotEnvelopeReason::Unarmored => debug!("content is not in an OpenPGP envelope"),
                NotEnvelopeReason::Malformed(reason) => {
                    warn!("unable to read OpenPGP envelope; treating as plain text: {}", reason)
                }
            }

            Ok(UnwrappedDocument {
                plaintext: String::from_utf8(data)?,
                envelope: None,
            })
        }
    }
}

/// Read a file and recover its document text.
///
/// Failure to read the file, or content that is not text, is
/// [DscError::UnreadableDocument].
pub fn unwrap_path(path: &Path) -> Result<UnwrappedDocument> {
    let unreadable = |e: std::io::Error| DscError::UnreadableDocument(path.to_path_buf(), e);

    let data = std::fs::read(path).map_err(unreadable)?;

    unwrap_bytes(data)
        .map_err(|e| unreadable(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

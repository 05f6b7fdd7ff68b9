//! Root certificate repository XML
//!
//! The repository lists each root in a `<koksertifika>` element whose first
//! `<mValue>` descendant carries the DER certificate as MIME base64 (76-column
//! lines, indented). Entries are decoded independently; a bad entry is
//! skipped and never fails the batch.

use docverify_crypto::ParsedCertificate;
use docverify_types::Base64;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

const ENTRY: &[u8] = b"koksertifika";
const VALUE: &[u8] = b"mValue";

#[derive(Default)]
struct Entry {
    index: usize,
    value: Option<String>,
    capturing: bool,
}

/// Parse a repository document into certificates.
///
/// Only a document that is not well-formed XML is an error. Malformed entries
/// are logged and skipped; a blank document yields an empty list.
pub fn parse_repository_xml(xml: &str) -> Result<Vec<ParsedCertificate>> {
    if xml.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = Reader::from_str(xml);
    let mut certificates = Vec::new();
    let mut entry: Option<Entry> = None;
    let mut seen = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == ENTRY {
                    seen += 1;
                    entry = Some(Entry {
                        index: seen,
                        ..Default::default()
                    });
                } else if name.as_ref() == VALUE {
                    if let Some(current) = entry.as_mut().filter(|c| c.value.is_none()) {
                        current.capturing = true;
                        current.value = Some(String::new());
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == VALUE {
                    if let Some(current) = entry.as_mut().filter(|c| c.value.is_none()) {
                        current.value = Some(String::new());
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = entry.as_mut().filter(|c| c.capturing) {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| Error::Xml(format!("entry {}: {}", current.index, e)))?;
                    if let Some(value) = current.value.as_mut() {
                        value.push_str(&unescaped);
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = entry.as_mut().filter(|c| c.capturing) {
                    let raw = data.into_inner();
                    if let Some(value) = current.value.as_mut() {
                        value.push_str(&String::from_utf8_lossy(&raw));
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == VALUE {
                    if let Some(current) = entry.as_mut() {
                        current.capturing = false;
                    }
                } else if name.as_ref() == ENTRY {
                    if let Some(done) = entry.take() {
                        if let Some(cert) = decode_entry(&done) {
                            certificates.push(cert);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Xml(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    tracing::debug!(
        "repository XML: {} entries, {} certificates decoded",
        seen,
        certificates.len()
    );
    Ok(certificates)
}

fn decode_entry(entry: &Entry) -> Option<ParsedCertificate> {
    let Some(value) = entry.value.as_deref() else {
        tracing::warn!("root entry {} has no mValue element, skipping", entry.index);
        return None;
    };

    if value.trim().is_empty() {
        return None;
    }

    let der = match Base64::decode_mime(value) {
        Ok(der) => der,
        Err(e) => {
            tracing::warn!("root entry {} is not valid base64, skipping: {}", entry.index, e);
            return None;
        }
    };

    match ParsedCertificate::from_der(&der) {
        Ok(cert) => Some(cert),
        Err(e) => {
            tracing::warn!("root entry {} is not a certificate, skipping: {}", entry.index, e);
            None
        }
    }
}

pub mod clover;

use std::borrow::Cow;

use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;

use crate::error::{ReviewError, Result};

/// Build a reader over an in-memory document with whitespace text trimmed.
pub(crate) fn xml_reader(input: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);
    reader
}

/// Attach the reader's byte offset to a quick-xml error.
pub(crate) fn xml_err(source: quick_xml::Error, reader: &Reader<&[u8]>) -> ReviewError {
    ReviewError::Xml {
        source,
        position: reader.buffer_position(),
    }
}

/// Read a single unescaped attribute value. Broken attribute syntax is an
/// error; a missing attribute is `None`.
pub(crate) fn get_attr(
    e: &BytesStart<'_>,
    key: &[u8],
    reader: &Reader<&[u8]>,
) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_err(err.into(), reader))?;
        if attr.key.as_ref() == key {
            let value: Cow<'_, str> = attr.unescape_value().map_err(|err| xml_err(err, reader))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Parse a numeric attribute. Missing attributes default to zero; present
/// but non-numeric values make the document malformed.
pub(crate) fn numeric_attr<T>(
    e: &BytesStart<'_>,
    key: &[u8],
    reader: &Reader<&[u8]>,
) -> Result<Option<T>>
where
    T: std::str::FromStr,
{
    match get_attr(e, key, reader)? {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ReviewError::Malformed(format!(
                "invalid `{}` value '{}' on <{}> at position {}",
                String::from_utf8_lossy(key),
                raw,
                String::from_utf8_lossy(e.name().as_ref()),
                reader.buffer_position(),
            ))
        }),
    }
}

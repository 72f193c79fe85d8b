//! Parser for documentation inventory documents.
//!
//! Two wire formats are recognized, distinguished by the document's first
//! line. Version 1 is plain text, one record per line. Version 2 carries
//! the same logical records compressed with zlib, which keeps large symbol
//! sets (hundreds of thousands of records) cheap to publish.
//!
//! Record shape, shared by both versions:
//!
//! ```text
//! name domain:role priority location [display]
//! ```
//!
//! A trailing `$` in the location is shorthand for the record's own name;
//! a display of `-` means "no override, use the name".

use std::io::Read;

use flate2::read::ZlibDecoder;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::error::{DocdexError, Result};
use crate::inventory::{Inventory, InventoryEntry};

/// First-line marker for the plain-text format.
pub const V1_MARKER: &str = "# Sphinx inventory version 1";
/// First-line marker for the zlib-compressed format.
pub const V2_MARKER: &str = "# Sphinx inventory version 2";

lazy_static! {
    // Permissive record pattern: names may contain spaces, the display
    // label is the rest of the line.
    static ref RECORD_RE: Regex =
        Regex::new(r"(?x)^ (.+?) \s+ (\S+) \s+ (-?\d+) \s+? (\S*) \s+ (.*) $").unwrap();
}

/// Parse a raw inventory document fetched from `base` into an [`Inventory`].
///
/// Fails with [`DocdexError::UnsupportedFormat`] when the first line is not
/// a recognized format marker, and with [`DocdexError::MalformedInventory`]
/// when the body cannot be decoded after the marker was recognized.
pub fn parse(raw: &[u8], base: &Url) -> Result<Inventory> {
    let newline = raw
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| DocdexError::unsupported("document has no header line"))?;
    let marker = std::str::from_utf8(&raw[..newline])
        .map_err(|_| DocdexError::unsupported("header line is not valid UTF-8"))?
        .trim_end();

    let body = &raw[newline + 1..];
    match marker {
        V1_MARKER => parse_v1(body, base),
        V2_MARKER => parse_v2(body, base),
        other => Err(DocdexError::unsupported(other)),
    }
}

fn parse_v1(body: &[u8], base: &Url) -> Result<Inventory> {
    let text = std::str::from_utf8(body)
        .map_err(|_| DocdexError::malformed("version 1 body is not valid UTF-8"))?;
    parse_records(text, base)
}

fn parse_v2(body: &[u8], base: &Url) -> Result<Inventory> {
    // The comment header (project, version, compression note) precedes the
    // zlib stream. A deflate stream can never begin with `#`.
    let mut offset = 0;
    let mut header = String::new();
    while offset < body.len() && body[offset] == b'#' {
        let end = body[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| offset + p + 1)
            .unwrap_or(body.len());
        let line = std::str::from_utf8(&body[offset..end])
            .map_err(|_| DocdexError::malformed("version 2 header is not valid UTF-8"))?;
        header.push_str(line);
        offset = end;
    }

    let mut decoder = ZlibDecoder::new(&body[offset..]);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| DocdexError::malformed(format!("zlib decode failed: {e}")))?;
    let records = String::from_utf8(decompressed)
        .map_err(|_| DocdexError::malformed("decompressed body is not valid UTF-8"))?;

    header.push_str(&records);
    parse_records(&header, base)
}

fn parse_records(text: &str, base: &Url) -> Result<Inventory> {
    let mut project = String::new();
    let mut version = String::new();
    let mut inventory = Inventory::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('#') {
            let rest = rest.trim_start();
            if let Some(value) = rest.strip_prefix("Project:") {
                project = value.trim().to_string();
            } else if let Some(value) = rest.strip_prefix("Version:") {
                version = value.trim().to_string();
            }
            continue;
        }

        let (name, doctype, location, display) = parse_record_line(line)?;
        let location = resolve_location(&location, &name, base)?;
        inventory.insert(
            &doctype,
            &name,
            InventoryEntry {
                project: project.clone(),
                version: version.clone(),
                location,
                display,
            },
        );
    }

    Ok(inventory)
}

/// Split one record line into (name, doctype, location, display).
///
/// Five-field lines go through [`struct@RECORD_RE`] so names containing
/// whitespace survive; four-field lines (no display column) fall back to
/// token splitting with an implied `-` display.
fn parse_record_line(line: &str) -> Result<(String, String, String, String)> {
    if let Some(caps) = RECORD_RE.captures(line) {
        return Ok((
            caps[1].to_string(),
            caps[2].to_string(),
            caps[4].to_string(),
            caps[5].to_string(),
        ));
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(DocdexError::malformed(format!("short record line: {line}")));
    }
    let location = tokens[tokens.len() - 1];
    let priority = tokens[tokens.len() - 2];
    let doctype = tokens[tokens.len() - 3];
    let name = tokens[..tokens.len() - 3].join(" ");
    priority
        .parse::<i64>()
        .map_err(|_| DocdexError::malformed(format!("bad priority field in: {line}")))?;

    Ok((
        name,
        doctype.to_string(),
        location.to_string(),
        "-".to_string(),
    ))
}

/// Expand the trailing `$` shorthand and resolve the location against the
/// inventory's base URL.
fn resolve_location(raw: &str, name: &str, base: &Url) -> Result<String> {
    let expanded = match raw.strip_suffix('$') {
        Some(prefix) => format!("{prefix}{name}"),
        None => raw.to_string(),
    };
    let resolved = base
        .join(&expanded)
        .map_err(|e| DocdexError::malformed(format!("unresolvable location {expanded:?}: {e}")))?;
    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    fn base() -> Url {
        Url::parse("http://x/objects.inv").unwrap()
    }

    fn v2_document(records: &str) -> Vec<u8> {
        let mut doc = Vec::new();
        doc.extend_from_slice(b"# Sphinx inventory version 2\n");
        doc.extend_from_slice(b"# Project: demo\n");
        doc.extend_from_slice(b"# Version: 1.0\n");
        doc.extend_from_slice(b"# The remainder of this file is compressed using zlib.\n");
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(records.as_bytes()).unwrap();
        doc.extend_from_slice(&encoder.finish().unwrap());
        doc
    }

    #[test]
    fn test_parse_v1_basic_record() {
        let doc = b"# Sphinx inventory version 1\n\
                    # Project: demo\n\
                    # Version: 1.0\n\
                    foo py:function 1 api.html#foo\n";

        let inv = parse(doc, &base()).unwrap();
        let entry = inv.get("py:function", "foo").unwrap();
        assert_eq!(entry.project, "demo");
        assert_eq!(entry.version, "1.0");
        assert_eq!(entry.location, "http://x/api.html#foo");
        assert_eq!(entry.display, "-");
        assert_eq!(entry.display_for("foo"), "foo");
    }

    #[test]
    fn test_parse_v2_matches_v1() {
        let v1 = b"# Sphinx inventory version 1\n\
                   # Project: demo\n\
                   # Version: 1.0\n\
                   foo py:function 1 api.html#foo\n";
        let v2 = v2_document("foo py:function 1 api.html#foo -\n");

        let from_v1 = parse(v1, &base()).unwrap();
        let from_v2 = parse(&v2, &base()).unwrap();
        assert_eq!(from_v1, from_v2);
    }

    #[test]
    fn test_trailing_dollar_expands_to_name() {
        let doc = v2_document("mod.Klass py:class 1 api/mod.html#$ -\n");

        let inv = parse(&doc, &base()).unwrap();
        let entry = inv.get("py:class", "mod.Klass").unwrap();
        assert_eq!(entry.location, "http://x/api/mod.html#mod.Klass");
    }

    #[test]
    fn test_display_label_with_spaces() {
        let doc = v2_document("foo py:function 1 api.html#foo The foo function\n");

        let inv = parse(&doc, &base()).unwrap();
        let entry = inv.get("py:function", "foo").unwrap();
        assert_eq!(entry.display, "The foo function");
        assert_eq!(entry.display_for("foo"), "The foo function");
    }

    #[test]
    fn test_name_with_spaces() {
        let doc = v2_document("operator () cpp:function 1 api.html#op -\n");

        let inv = parse(&doc, &base()).unwrap();
        assert!(inv.get("cpp:function", "operator ()").is_some());
    }

    #[test]
    fn test_duplicate_record_last_wins() {
        let doc = v2_document(
            "foo py:function 1 old.html#foo -\n\
             foo py:function 1 new.html#foo -\n",
        );

        let inv = parse(&doc, &base()).unwrap();
        assert_eq!(inv.len(), 1);
        assert_eq!(
            inv.get("py:function", "foo").unwrap().location,
            "http://x/new.html#foo"
        );
    }

    #[test]
    fn test_unrecognized_marker() {
        let doc = b"# Not an inventory\nwhatever\n";
        match parse(doc, &base()) {
            Err(DocdexError::UnsupportedFormat(_)) => {}
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_header_line() {
        match parse(b"", &base()) {
            Err(DocdexError::UnsupportedFormat(_)) => {}
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_v2_garbage_body_is_malformed() {
        let mut doc = Vec::new();
        doc.extend_from_slice(b"# Sphinx inventory version 2\n");
        doc.extend_from_slice(b"# Project: demo\n");
        doc.extend_from_slice(&[0xFF, 0x00, 0xAB, 0xCD]);

        match parse(&doc, &base()) {
            Err(DocdexError::MalformedInventory(_)) => {}
            other => panic!("expected MalformedInventory, got {other:?}"),
        }
    }

    #[test]
    fn test_v1_short_record_is_malformed() {
        let doc = b"# Sphinx inventory version 1\nfoo py:function\n";
        match parse(doc, &base()) {
            Err(DocdexError::MalformedInventory(_)) => {}
            other => panic!("expected MalformedInventory, got {other:?}"),
        }
    }

    #[test]
    fn test_absolute_location_passes_through() {
        let doc = v2_document("foo py:function 1 https://other.example/doc.html#foo -\n");

        let inv = parse(&doc, &base()).unwrap();
        assert_eq!(
            inv.get("py:function", "foo").unwrap().location,
            "https://other.example/doc.html#foo"
        );
    }
}

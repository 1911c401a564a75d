//! Output encodings for an emitted blob: raw bytes, a C string literal, or a
//! quoted byte-literal for embedding in another language's source.

/// How to textually encode the blob for embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Raw,
    C,
    Py,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Self::Raw),
            "c" => Ok(Self::C),
            "py" => Ok(Self::Py),
            other => Err(format!("unknown format {other:?} (expected raw, c, or py)")),
        }
    }
}

/// Encode `blob` per `format`.
pub fn encode(blob: &[u8], format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Raw => blob.to_vec(),
        OutputFormat::C => encode_c(blob),
        OutputFormat::Py => encode_py(blob),
    }
}

/// Escape `c`'s named escapes shared by both the C and Python encodings:
/// BEL, BS, TAB, LF, VT, FF, CR and the three characters that would
/// otherwise terminate or escape the literal.
fn named_escape(c: u8) -> Option<&'static [u8]> {
    Some(match c {
        0x07 => b"\\a",
        0x08 => b"\\b",
        0x09 => b"\\t",
        0x0a => b"\\n",
        0x0b => b"\\v",
        0x0c => b"\\f",
        0x0d => b"\\r",
        0x22 => b"\\\"",
        0x27 => b"\\'",
        0x5c => b"\\\\",
        _ => return None,
    })
}

/// A double-quoted C string literal: printable ASCII 32-126 verbatim
/// (except the three characters [`named_escape`] already covers), named
/// escapes where they apply, octal escapes for everything else.
fn encode_c(blob: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(blob.len() + 2);
    out.push(b'"');
    for &c in blob {
        if let Some(escape) = named_escape(c) {
            out.extend_from_slice(escape);
        } else if (32..=126).contains(&c) {
            out.push(c);
        } else {
            out.extend_from_slice(format!("\\{c:03o}").as_bytes());
        }
    }
    out.push(b'"');
    out
}

/// A Python-style `b"..."` byte-literal. Uses the same named escapes as the
/// C encoding (they agree on the common set) and falls back to `\xHH` for
/// non-printable bytes, matching Python's own byte-literal repr.
fn encode_py(blob: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(blob.len() + 3);
    out.extend_from_slice(b"b\"");
    for &c in blob {
        if let Some(escape) = named_escape(c) {
            out.extend_from_slice(escape);
        } else if (32..=126).contains(&c) {
            out.push(c);
        } else {
            out.extend_from_slice(format!("\\x{c:02x}").as_bytes());
        }
    }
    out.push(b'"');
    out
}

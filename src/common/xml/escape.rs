//! XML escaping for values written by the ReqIF writer and text read back
//! from raw element content.

use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

// Built once, shared by every writer call
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

// LeftmostLongest so "&amp;lt;" decodes to "&lt;" rather than "<"
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Escape XML special characters for use in text or attribute values.
///
/// # Examples
///
/// ```
/// use reqif_loader::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<p class=\"x\">"), "&lt;p class=&quot;x&quot;&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Unescape the five predefined XML entities and numeric character references.
///
/// Unknown or malformed references are left unchanged.
///
/// # Examples
///
/// ```
/// use reqif_loader::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("line&#10;break"), "line\nbreak");
/// assert_eq!(unescape_xml("&#x41;&invalid;"), "A&invalid;");
/// ```
pub fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let named = XML_UNESCAPER.replace_all(s, &["\u{0}amp;", "<", ">", "\"", "'"]);
    decode_char_refs(&named).replace("\u{0}amp;", "&")
}

/// Replace `&#NN;` and `&#xHH;` references with the characters they name.
///
/// Named entities are decoded first with `&amp;` parked behind a NUL marker, so
/// a literal `&amp;#65;` is never turned into `A`.
fn decode_char_refs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("&#") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start + 2..];
        let decoded = candidate.find(';').and_then(|end| {
            let body = &candidate[..end];
            let code = match body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => body.parse::<u32>().ok()?,
            };
            char::from_u32(code).map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            },
            None => {
                out.push_str("&#");
                rest = candidate;
            },
        }
    }

    out.push_str(rest);
    out
}

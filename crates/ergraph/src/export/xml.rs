//! XML text escaping

use std::fmt;

/// Escape `text` for use inside an XML attribute value
pub fn escape_xml(text: &str) -> String {
    XmlEscaped(text).to_string()
}

/// Display adapter writing its text with XML entities substituted
///
/// The five reserved characters become named entities. Line breaks and
/// tabs become character references so attribute normalization on the
/// reading side does not fold them into spaces.
pub struct XmlEscaped<'a>(pub &'a str);

impl fmt::Display for XmlEscaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0;
        let mut start = 0usize;
        for (i, b) in text.bytes().enumerate() {
            let esc = match b {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                b'\'' => "&apos;",
                b'\n' => "&#xa;",
                b'\r' => "&#xd;",
                b'\t' => "&#x9;",
                _ => continue,
            };
            if start < i {
                f.write_str(&text[start..i])?;
            }
            f.write_str(esc)?;
            start = i + 1;
        }
        if start < text.len() {
            f.write_str(&text[start..])?;
        }
        Ok(())
    }
}

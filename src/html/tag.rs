//! Opening-tag tokenizer and attribute editing.
//!
//! Works on the verbatim text of a single opening tag (`<img src="a.jpg">`).
//! Attribute values are kept raw (entities are not decoded) so edits can
//! re-emit every untouched byte exactly as it was.

use std::ops::Range;

/// Attribute within an opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Lowercased attribute name.
    pub name: String,
    /// Raw value, `None` for boolean attributes.
    pub value: Option<String>,
    /// Byte span of the whole `name="value"` text.
    pub span: Range<usize>,
}

/// Tokenized opening tag.
#[derive(Debug, Clone)]
pub struct Tag<'a> {
    text: &'a str,
    name: String,
    name_end: usize,
    attrs: Vec<Attr>,
}

impl<'a> Tag<'a> {
    /// Tokenize an opening tag.
    ///
    /// Returns `None` when the text is not a complete opening tag (missing
    /// name, unterminated quote, no closing `>`).
    pub fn parse(text: &'a str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.first() != Some(&b'<') {
            return None;
        }

        let mut i = 1;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'-' | b':'))
        {
            i += 1;
        }
        if i == 1 {
            return None;
        }
        let name = text[1..i].to_ascii_lowercase();
        let name_end = i;

        let mut attrs = Vec::new();
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match *bytes.get(i)? {
                b'>' => break,
                b'/' | b'=' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let start = i;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            let attr_name = text[start..i].to_ascii_lowercase();
            let name_stop = i;

            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if bytes.get(j) != Some(&b'=') {
                attrs.push(Attr {
                    name: attr_name,
                    value: None,
                    span: start..name_stop,
                });
                continue;
            }

            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let quote = *bytes.get(j)?;
            let (value, end) = if quote == b'"' || quote == b'\'' {
                let close = text[j + 1..].find(quote as char)? + j + 1;
                (&text[j + 1..close], close + 1)
            } else {
                let mut k = j;
                while k < bytes.len() && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    k += 1;
                }
                (&text[j..k], k)
            };

            attrs.push(Attr {
                name: attr_name,
                value: Some(value.to_string()),
                span: start..end,
            });
            i = end;
        }

        Some(Self {
            text,
            name,
            name_end,
            attrs,
        })
    }

    /// Lowercased tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// First attribute with this (lowercase) name.
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Raw attribute value; boolean attributes read as `""`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attr(name).map(|a| a.value.as_deref().unwrap_or(""))
    }

    /// Trimmed, lowercased attribute value.
    pub fn get_lower(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| v.trim().to_ascii_lowercase())
    }

    pub fn has(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Whether the `class` attribute contains this token.
    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|t| t == class))
    }

    /// Whether `rel` contains this (case-insensitive) token.
    pub fn has_rel(&self, rel: &str) -> bool {
        self.get("rel").is_some_and(|r| {
            r.split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case(rel))
        })
    }
}

/// Format one attribute, picking a quote that keeps the raw value intact.
pub fn format_attr(name: &str, value: Option<&str>) -> String {
    match value {
        None => name.to_string(),
        Some(v) if !v.contains('"') => format!("{name}=\"{v}\""),
        Some(v) if !v.contains('\'') => format!("{name}='{v}'"),
        Some(v) => format!("{name}=\"{}\"", v.replace('"', "&quot;")),
    }
}

/// Add a class token to an existing class list, preserving its contents.
pub fn merge_class(existing: Option<&str>, token: &str) -> String {
    match existing.map(str::trim) {
        None | Some("") => token.to_string(),
        Some(list) if list.split_ascii_whitespace().any(|t| t == token) => list.to_string(),
        Some(list) => format!("{list} {token}"),
    }
}

/// Sequential attribute edits on one opening tag.
///
/// Each edit re-tokenizes the current text; edits on a tag that no longer
/// tokenizes are ignored.
#[derive(Debug, Clone)]
pub struct TagEditor {
    text: String,
}

impl TagEditor {
    /// Start editing; `None` if the text does not tokenize.
    pub fn new(text: &str) -> Option<Self> {
        Tag::parse(text)?;
        Some(Self {
            text: text.to_string(),
        })
    }

    /// Replace the attribute in place, or insert it right after the tag name.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let attr = format_attr(name, value);
        if let Some(tag) = Tag::parse(&self.text) {
            let (range, insert) = match tag.attr(name) {
                Some(existing) => (existing.span.clone(), attr),
                None => (tag.name_end..tag.name_end, format!(" {attr}")),
            };
            self.text.replace_range(range, &insert);
        }
        self
    }

    /// Insert an attribute right after `anchor` (at the end when absent).
    ///
    /// An existing attribute with the same name is replaced instead.
    pub fn insert_after(&mut self, anchor: &str, name: &str, value: Option<&str>) -> &mut Self {
        let Some(tag) = Tag::parse(&self.text) else {
            return self;
        };
        if tag.has(name) {
            return self.set(name, value);
        }
        let at = tag
            .attr(anchor)
            .or_else(|| tag.attrs.last())
            .map_or(tag.name_end, |a| a.span.end);
        self.text
            .insert_str(at, &format!(" {}", format_attr(name, value)));
        self
    }

    /// Remove an attribute together with the whitespace before it.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        if let Some(tag) = Tag::parse(&self.text)
            && let Some(attr) = tag.attr(name)
        {
            let bytes = self.text.as_bytes();
            let mut start = attr.span.start;
            while start > tag.name_end && bytes[start - 1].is_ascii_whitespace() {
                start -= 1;
            }
            let range = start..attr.span.end;
            self.text.replace_range(range, "");
        }
        self
    }

    /// Rename an attribute in place, keeping its value.
    pub fn rename(&mut self, from: &str, to: &str) -> &mut Self {
        if let Some(tag) = Tag::parse(&self.text)
            && let Some(attr) = tag.attr(from)
        {
            let replacement = format_attr(to, attr.value.as_deref());
            let range = attr.span.clone();
            self.text.replace_range(range, &replacement);
        }
        self
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn finish(self) -> String {
        self.text
    }
}

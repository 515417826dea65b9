use std::collections::HashMap;

use crate::dom::Dom;
use crate::{Error, Result};

const FORM_CONTROL_TAGS: &[&str] = &["input", "textarea", "select", "button"];

/// Builds a document from a markup fixture.
///
/// Only form controls become elements; every other tag, text run and comment
/// is skipped. The value of a `<textarea>` is its text content.
pub(crate) fn parse_form_markup(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut cursor = Cursor::new(html);

    while cursor.advance_to(b'<') {
        if cursor.consume_ascii("<!--") {
            cursor.skip_past("-->", "unclosed HTML comment")?;
            continue;
        }
        if cursor.consume_ascii("</") || cursor.consume_ascii("<!") {
            cursor.skip_past(">", "unclosed tag")?;
            continue;
        }

        let control = cursor.read_control_tag()?;
        let Some(ControlTag {
            tag_name,
            mut attrs,
            self_closing,
        }) = control
        else {
            continue;
        };

        if tag_name == "textarea" && !self_closing {
            let text = cursor.read_until_ascii_ci("</textarea", "unclosed <textarea>")?;
            attrs.insert("value".into(), decode_character_references(text));
            cursor.skip_past(">", "unclosed </textarea>")?;
        }
        dom.create_element(tag_name, attrs);
    }

    Ok(dom)
}

/// A start tag that names one of the form controls.
#[derive(Debug)]
struct ControlTag {
    tag_name: String,
    attrs: HashMap<String, String>,
    self_closing: bool,
}

#[derive(Debug)]
struct Cursor<'a> {
    src: &'a str,
    i: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, i: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.i).copied()
    }

    fn rest(&self) -> &'a str {
        self.src.get(self.i..).unwrap_or("")
    }

    /// Moves to the next `b`; false once the input is exhausted.
    fn advance_to(&mut self, b: u8) -> bool {
        match self.bytes()[self.i.min(self.bytes().len())..]
            .iter()
            .position(|&c| c == b)
        {
            Some(offset) => {
                self.i += offset;
                true
            }
            None => {
                self.i = self.bytes().len();
                false
            }
        }
    }

    fn consume_byte(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.i += 1;
            true
        } else {
            false
        }
    }

    fn consume_ascii(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.i += token.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.i += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.i;
        while self.peek().is_some_and(&pred) {
            self.i += 1;
        }
        self.src.get(start..self.i).unwrap_or("")
    }

    fn skip_past(&mut self, token: &str, unclosed: &str) -> Result<()> {
        let offset = self
            .rest()
            .find(token)
            .ok_or_else(|| Error::HtmlParse(unclosed.into()))?;
        self.i += offset + token.len();
        Ok(())
    }

    /// Returns the text up to `token` (ASCII case-insensitive), leaving the
    /// cursor on the token.
    fn read_until_ascii_ci(&mut self, token: &str, unclosed: &str) -> Result<&'a str> {
        let needle = token.as_bytes();
        let offset = self
            .rest()
            .as_bytes()
            .windows(needle.len())
            .position(|window| window.eq_ignore_ascii_case(needle))
            .ok_or_else(|| Error::HtmlParse(unclosed.into()))?;
        let text = self
            .src
            .get(self.i..self.i + offset)
            .ok_or_else(|| Error::HtmlParse(format!("invalid text before {token}")))?;
        self.i += offset;
        Ok(text)
    }

    /// Reads a start tag at `<`. Tags other than form controls are consumed
    /// and yield `None`.
    fn read_control_tag(&mut self) -> Result<Option<ControlTag>> {
        self.consume_byte(b'<');
        self.skip_ws();
        let tag_name = self.take_while(is_name_byte).to_ascii_lowercase();
        if tag_name.is_empty() {
            return Err(Error::HtmlParse(format!(
                "empty tag name at byte {}",
                self.i
            )));
        }

        let mut attrs = HashMap::new();
        let self_closing = loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(Error::HtmlParse(format!("unclosed <{tag_name}>"))),
                Some(b'>') => {
                    self.i += 1;
                    break false;
                }
                Some(b'/') if self.consume_ascii("/>") => break true,
                Some(b) if is_name_byte(b) => {
                    let (name, value) = self.read_attribute()?;
                    attrs.entry(name).or_insert(value);
                }
                Some(_) => {
                    self.i += 1;
                }
            }
        };

        if !FORM_CONTROL_TAGS.contains(&tag_name.as_str()) {
            return Ok(None);
        }
        Ok(Some(ControlTag {
            tag_name,
            attrs,
            self_closing,
        }))
    }

    /// `name`, `name=value`, `name='value'` or `name="value"`. A bare name
    /// reads as `"true"`.
    fn read_attribute(&mut self) -> Result<(String, String)> {
        let name = self.take_while(is_name_byte).to_ascii_lowercase();
        self.skip_ws();
        if !self.consume_byte(b'=') {
            return Ok((name, "true".into()));
        }
        self.skip_ws();

        let raw = match self.peek() {
            Some(quote @ (b'\'' | b'"')) => {
                self.i += 1;
                let value = self.take_while(|b| b != quote);
                if !self.consume_byte(quote) {
                    return Err(Error::HtmlParse(format!(
                        "unclosed quoted value for attribute {name}"
                    )));
                }
                value
            }
            Some(_) => self.read_unquoted_value(),
            None => return Err(Error::HtmlParse(format!("missing value for {name}"))),
        };
        Ok((name, decode_character_references(raw)))
    }

    /// Unquoted values end at whitespace, `>` or a self-closing `/>`.
    fn read_unquoted_value(&mut self) -> &'a str {
        let start = self.i;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b'>' || self.rest().starts_with("/>") {
                break;
            }
            self.i += 1;
        }
        self.src.get(start..self.i).unwrap_or("")
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}

fn decode_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }
    src.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_form_controls_become_elements() -> Result<()> {
        let dom = parse_form_markup(
            r#"
            <form id='f'>
              <!-- <input id='ghost'> -->
              <label>Postal <input id='postal' name='postal' value="k1a 0b1"></label>
              <input type=radio name=role id=other checked>
              <textarea id='notes' name='notes'>a &amp; b</textarea>
              <button id='send' disabled>Send</button>
            </form>
            "#,
        )?;

        assert!(dom.by_id("f").is_none());
        assert!(dom.by_id("ghost").is_none());
        let postal = dom.by_id("postal").ok_or_else(|| Error::HtmlParse("postal".into()))?;
        assert_eq!(dom.value(postal)?, "k1a 0b1");
        let other = dom.by_id("other").ok_or_else(|| Error::HtmlParse("other".into()))?;
        assert!(dom.checked(other)?);
        let notes = dom.by_id("notes").ok_or_else(|| Error::HtmlParse("notes".into()))?;
        assert_eq!(dom.value(notes)?, "a & b");
        let send = dom.by_id("send").ok_or_else(|| Error::HtmlParse("send".into()))?;
        assert!(dom.disabled(send));
        Ok(())
    }

    #[test]
    fn self_closing_controls_and_first_attribute_wins() -> Result<()> {
        let dom = parse_form_markup("<INPUT ID=a name=x name=y/><textarea id=t/>")?;
        let a = dom.by_id("a").ok_or_else(|| Error::HtmlParse("a".into()))?;
        assert_eq!(dom.attr(a, "name"), Some("x"));
        let t = dom.by_id("t").ok_or_else(|| Error::HtmlParse("t".into()))?;
        assert_eq!(dom.value(t)?, "");
        Ok(())
    }

    #[test]
    fn malformed_markup_is_reported() {
        assert!(matches!(
            parse_form_markup("<input id='x"),
            Err(Error::HtmlParse(_))
        ));
        assert!(matches!(
            parse_form_markup("<textarea>never closed"),
            Err(Error::HtmlParse(_))
        ));
        assert!(matches!(
            parse_form_markup("<!-- open"),
            Err(Error::HtmlParse(_))
        ));
    }
}

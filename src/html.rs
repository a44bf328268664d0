use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

// Raw-text bodies are stored as text nodes and never interpreted.
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

// Block-level tags that implicitly close an open <p>.
const PARAGRAPH_CLOSING_TAGS: [&str; 19] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "div",
    "dl",
    "fieldset",
    "footer",
    "form",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

const MAX_REFERENCE_LEN: usize = 32;

static NAMED_CHARACTER_REFERENCES: Lazy<HashMap<&'static str, char>> = Lazy::new(|| {
    HashMap::from([
        ("amp", '&'),
        ("lt", '<'),
        ("gt", '>'),
        ("quot", '"'),
        ("apos", '\''),
        ("nbsp", '\u{a0}'),
        ("copy", '\u{a9}'),
        ("mdash", '\u{2014}'),
        ("hellip", '\u{2026}'),
    ])
});

pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut stack = vec![dom.root()];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
            i = end + 3;
            continue;
        }

        if bytes[i] == b'<' {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;
                // Close up to and including the nearest matching open
                // element; an end tag with no open counterpart is dropped.
                if let Some(open_index) = stack.iter().rposition(|&node| {
                    dom.tag_name(node)
                        .is_some_and(|open| open.eq_ignore_ascii_case(&tag))
                }) {
                    stack.truncate(open_index);
                }
                continue;
            }

            if starts_with_at(bytes, i, b"<!") {
                i = parse_declaration_tag(html, i)?;
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;

            close_open_list_item(&dom, &mut stack, &tag);
            close_open_paragraph(&dom, &mut stack, &tag);

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if is_raw_text_tag(&tag) && !self_closing {
                let close = find_raw_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                if let Some(body) = html.get(i..close) {
                    if !body.is_empty() {
                        dom.create_text(node, body.to_string());
                    }
                }
                let (_, after_end) = parse_end_tag(html, close)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }
        if let Some(text) = html.get(text_start..i) {
            if !text.is_empty() {
                let parent = *stack
                    .last()
                    .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
                let decoded = decode_character_references(text);
                if !decoded.is_empty() {
                    dom.create_text(parent, decoded);
                }
            }
        }
    }

    Ok(dom)
}

fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|void| tag.eq_ignore_ascii_case(void))
}

fn is_raw_text_tag(tag: &str) -> bool {
    RAW_TEXT_TAGS.iter().any(|raw| tag.eq_ignore_ascii_case(raw))
}

fn is_tag_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .is_some_and(|slice| slice == needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from >= bytes.len() {
        return None;
    }
    (from..=bytes.len().saturating_sub(needle.len()))
        .find(|&candidate| starts_with_at(bytes, candidate, needle))
}

fn find_raw_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i + 2 + tag.len() <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'/'
            && bytes[i + 2..i + 2 + tag.len()].eq_ignore_ascii_case(tag)
        {
            match bytes.get(i + 2 + tag.len()) {
                None | Some(b'>') => return Some(i),
                Some(byte) if byte.is_ascii_whitespace() => return Some(i),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn parse_declaration_tag(html: &str, at: usize) -> Result<usize> {
    let bytes = html.as_bytes();
    let end = (at..bytes.len())
        .find(|&i| bytes[i] == b'>')
        .ok_or_else(|| Error::HtmlParse("unclosed <! declaration".into()))?;
    Ok(end + 1)
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    let name_start = i;
    while i < bytes.len() && is_tag_name_byte(bytes[i]) {
        i += 1;
    }
    if i == name_start {
        return Err(Error::HtmlParse(format!("malformed end tag at byte {at}")));
    }
    let tag = html[name_start..i].to_string();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'>' {
        return Err(Error::HtmlParse(format!("unterminated end tag </{tag}>")));
    }
    Ok((tag, i + 1))
}

type StartTag = (String, HashMap<String, String>, bool, usize);

fn parse_start_tag(html: &str, at: usize) -> Result<StartTag> {
    let bytes = html.as_bytes();
    let mut i = at + 1;
    let name_start = i;
    while i < bytes.len() && is_tag_name_byte(bytes[i]) {
        i += 1;
    }
    if i == name_start {
        return Err(Error::HtmlParse(format!(
            "malformed start tag at byte {at}"
        )));
    }
    let tag = html[name_start..i].to_string();

    let mut attrs = HashMap::new();
    let mut self_closing = false;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(Error::HtmlParse(format!("unterminated start tag <{tag}>")));
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                if starts_with_at(bytes, i, b"/>") {
                    self_closing = true;
                    i += 2;
                    break;
                }
                return Err(Error::HtmlParse(format!("stray `/` in <{tag}>")));
            }
            _ => {
                let attr_start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && !matches!(bytes[i], b'=' | b'>' | b'/')
                {
                    i += 1;
                }
                if i == attr_start {
                    return Err(Error::HtmlParse(format!(
                        "malformed attribute in <{tag}>"
                    )));
                }
                let name = html[attr_start..i].to_ascii_lowercase();
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                let value = if i < bytes.len() && bytes[i] == b'=' {
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    if i >= bytes.len() {
                        return Err(Error::HtmlParse(format!(
                            "missing attribute value in <{tag}>"
                        )));
                    }
                    match bytes[i] {
                        quote @ (b'"' | b'\'') => {
                            i += 1;
                            let value_start = i;
                            while i < bytes.len() && bytes[i] != quote {
                                i += 1;
                            }
                            if i >= bytes.len() {
                                return Err(Error::HtmlParse(format!(
                                    "unterminated attribute value in <{tag}>"
                                )));
                            }
                            let raw = &html[value_start..i];
                            i += 1;
                            decode_character_references(raw)
                        }
                        _ => {
                            let value_start = i;
                            while i < bytes.len()
                                && !bytes[i].is_ascii_whitespace()
                                && bytes[i] != b'>'
                            {
                                i += 1;
                            }
                            decode_character_references(&html[value_start..i])
                        }
                    }
                } else {
                    String::new()
                };
                attrs.entry(name).or_insert(value);
            }
        }
    }

    Ok((tag, attrs, self_closing, i))
}

fn close_open_list_item(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    if !tag.eq_ignore_ascii_case("li") {
        return;
    }
    for index in (1..stack.len()).rev() {
        let Some(open_tag) = dom.tag_name(stack[index]) else {
            continue;
        };
        if open_tag.eq_ignore_ascii_case("li") {
            stack.truncate(index);
            return;
        }
        if ["ol", "ul", "menu"]
            .iter()
            .any(|list| open_tag.eq_ignore_ascii_case(list))
        {
            return;
        }
    }
}

fn close_open_paragraph(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    if !PARAGRAPH_CLOSING_TAGS
        .iter()
        .any(|closer| tag.eq_ignore_ascii_case(closer))
    {
        return;
    }
    if let Some(&top) = stack.last() {
        if dom
            .tag_name(top)
            .is_some_and(|open| open.eq_ignore_ascii_case("p"))
        {
            stack.pop();
        }
    }
}

fn decode_character_references(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] != '&' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let Some(relative_end) = chars[i + 1..]
            .iter()
            .take(MAX_REFERENCE_LEN)
            .position(|&ch| ch == ';')
        else {
            out.push('&');
            i += 1;
            continue;
        };
        let body: String = chars[i + 1..i + 1 + relative_end].iter().collect();
        let decoded = if let Some(numeric) = body.strip_prefix('#') {
            decode_numeric_reference(numeric)
        } else {
            NAMED_CHARACTER_REFERENCES.get(body.as_str()).copied()
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                i += 2 + relative_end;
            }
            None => {
                out.push('&');
                i += 1;
            }
        }
    }
    out
}

fn decode_numeric_reference(body: &str) -> Option<char> {
    let code = if let Some(hex) = body.strip_prefix(['x', 'X']) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

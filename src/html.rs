use std::collections::HashMap;

use super::*;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Tags whose open element is implicitly closed when the same tag starts again.
const SELF_CLOSING_SIBLINGS: &[&str] = &["p", "li", "option", "tr", "td", "th"];

/// Parse an HTML document or fragment into a DOM tree.
///
/// The parser is lenient in the way browsers are: unknown entities pass
/// through verbatim, stray end tags are dropped, and unclosed elements are
/// closed at end of input.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let bytes = html.as_bytes();
    let mut pos = 0usize;
    let mut stack: Vec<NodeId> = vec![dom.root];

    while pos < bytes.len() {
        if bytes[pos] == b'<' {
            if html[pos..].starts_with("<!--") {
                pos = match html[pos + 4..].find("-->") {
                    Some(end) => pos + 4 + end + 3,
                    None => bytes.len(),
                };
                continue;
            }

            if html[pos..].starts_with("<!") || html[pos..].starts_with("<?") {
                pos = match html[pos..].find('>') {
                    Some(end) => pos + end + 1,
                    None => bytes.len(),
                };
                continue;
            }

            if html[pos..].starts_with("</") {
                let end = match html[pos..].find('>') {
                    Some(end) => pos + end,
                    None => bytes.len(),
                };
                let tag = html[pos + 2..end.min(bytes.len())]
                    .trim()
                    .to_ascii_lowercase();
                close_tag(&dom, &mut stack, &tag);
                pos = if end < bytes.len() { end + 1 } else { end };
                continue;
            }

            if let Some((tag_name, attrs, self_closing, next_pos)) = parse_start_tag(html, pos) {
                if SELF_CLOSING_SIBLINGS.contains(&tag_name.as_str()) {
                    implicitly_close(&dom, &mut stack, &tag_name);
                }

                let parent = *stack.last().ok_or_else(|| {
                    Error::HtmlParse("parser stack underflow".into())
                })?;
                let node = dom.create_element(parent, tag_name.clone(), attrs);

                pos = next_pos;

                if self_closing || VOID_TAGS.contains(&tag_name.as_str()) {
                    continue;
                }

                if tag_name == "script" || tag_name == "style" {
                    // Raw text: no entity decoding, no child tags.
                    let (raw, after) = read_raw_text(html, pos, &tag_name);
                    if !raw.is_empty() {
                        dom.create_text(node, raw);
                    }
                    pos = after;
                    continue;
                }

                stack.push(node);
                continue;
            }

            // A lone '<' that does not begin a tag is literal text.
            let parent = *stack.last().ok_or_else(|| {
                Error::HtmlParse("parser stack underflow".into())
            })?;
            append_text(&mut dom, parent, "<");
            pos += 1;
            continue;
        }

        let end = html[pos..].find('<').map(|i| pos + i).unwrap_or(bytes.len());
        let text = &html[pos..end];
        if !text.trim().is_empty() {
            let parent = *stack.last().ok_or_else(|| {
                Error::HtmlParse("parser stack underflow".into())
            })?;
            append_text(&mut dom, parent, &decode_entities(text));
        }
        pos = end;
    }

    dom.initialize_form_control_values()?;
    Ok(dom)
}

fn append_text(dom: &mut Dom, parent: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    dom.create_text(parent, text.to_string());
}

fn close_tag(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    // Find the nearest matching open element; a stray end tag is ignored.
    let found = stack
        .iter()
        .rposition(|node| {
            dom.tag_name(*node)
                .map(|name| name == tag)
                .unwrap_or(false)
        })
        .filter(|pos| *pos > 0);
    if let Some(pos) = found {
        stack.truncate(pos);
    }
}

fn implicitly_close(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    if let Some(top) = stack.last() {
        if dom
            .tag_name(*top)
            .map(|name| name == tag)
            .unwrap_or(false)
        {
            stack.pop();
        }
    }
}

/// Returns (tag_name, attrs, self_closing, position after '>').
fn parse_start_tag(
    html: &str,
    start: usize,
) -> Option<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut pos = start + 1;

    let name_start = pos;
    while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'-') {
        pos += 1;
    }
    if pos == name_start {
        return None;
    }
    let tag_name = html[name_start..pos].to_ascii_lowercase();

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Some((tag_name, attrs, self_closing, pos));
        }
        if bytes[pos] == b'>' {
            return Some((tag_name, attrs, self_closing, pos + 1));
        }
        if bytes[pos] == b'/' {
            self_closing = true;
            pos += 1;
            continue;
        }

        let attr_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && bytes[pos] != b'='
            && bytes[pos] != b'>'
            && bytes[pos] != b'/'
        {
            pos += 1;
        }
        if pos == attr_start {
            // Unparseable character inside the tag, skip it.
            pos += 1;
            continue;
        }
        let attr_name = html[attr_start..pos].to_ascii_lowercase();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        if pos < bytes.len() && bytes[pos] == b'=' {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos < bytes.len() && (bytes[pos] == b'"' || bytes[pos] == b'\'') {
                let quote = bytes[pos];
                pos += 1;
                let value_start = pos;
                while pos < bytes.len() && bytes[pos] != quote {
                    pos += 1;
                }
                let value = decode_entities(&html[value_start..pos]);
                if pos < bytes.len() {
                    pos += 1;
                }
                attrs.insert(attr_name, value);
            } else {
                let value_start = pos;
                while pos < bytes.len()
                    && !bytes[pos].is_ascii_whitespace()
                    && bytes[pos] != b'>'
                {
                    pos += 1;
                }
                attrs.insert(attr_name, decode_entities(&html[value_start..pos]));
            }
        } else {
            // Boolean attribute.
            attrs.insert(attr_name, "true".to_string());
        }
    }
}

/// Scan raw text content up to the matching end tag, case-insensitively.
fn read_raw_text(html: &str, start: usize, tag: &str) -> (String, usize) {
    let lowered = html.to_ascii_lowercase();
    let close = format!("</{tag}");
    let mut search = start;
    while let Some(found) = lowered[search..].find(&close) {
        let at = search + found;
        let after_name = at + close.len();
        let next = lowered.as_bytes().get(after_name).copied();
        if matches!(next, None | Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n')) {
            let end = lowered[after_name..]
                .find('>')
                .map(|i| after_name + i + 1)
                .unwrap_or(html.len());
            return (html[start..at].to_string(), end);
        }
        search = after_name;
    }
    (html[start..].to_string(), html.len())
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let Some(semi) = rest.find(';').filter(|idx| *idx <= 12) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };

        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some("&".to_string()),
            "lt" => Some("<".to_string()),
            "gt" => Some(">".to_string()),
            "quot" => Some("\"".to_string()),
            "apos" => Some("'".to_string()),
            "nbsp" => Some("\u{a0}".to_string()),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(s) => {
                out.push_str(&s);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric_entity(entity: &str) -> Option<String> {
    let digits = entity.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

//! Allow-list markup sanitizer for word edits.
//!
//! The word editor is a contenteditable surface, so blur events hand us
//! arbitrary markup (including whatever a paste dragged in). This reduces
//! it to a safe subset: `<b>`, `<i>`, `<p>` and `<a href="...">`. Every
//! other tag is stripped but its text is kept, except `<script>`/`<style>`
//! whose content is dropped with the tag. Attributes other than `href` on
//! `<a>` never survive.
//!
//! The pass runs again on every blur, so it must be a fixed point:
//! `sanitize_word_edit(sanitize_word_edit(x)) == sanitize_word_edit(x)`.
//! Output guarantees that make this hold: emitted tags are well-formed and
//! balanced, stray `<`/`>` become entities, and `&` is never re-escaped.

const ALLOWED_TAGS: &[&str] = &["b", "i", "a", "p"];

/// Tags whose text content is dropped along with the tag itself.
const DROP_CONTENT_TAGS: &[&str] = &["script", "style"];

struct Tag {
    name: String,
    closing: bool,
    attrs: String,
    /// Byte offset just past the closing `>`.
    end: usize,
}

/// Sanitize one word edit down to the allowed markup subset.
pub fn sanitize_word_edit(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut open_stack: Vec<String> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                if let Some(skip) = skip_comment_or_decl(raw, i) {
                    i = skip;
                    continue;
                }
                match parse_tag(raw, i) {
                    Some(tag) => {
                        i = tag.end;
                        if DROP_CONTENT_TAGS.contains(&tag.name.as_str()) {
                            if !tag.closing {
                                i = skip_dropped_content(raw, i, &tag.name);
                            }
                        } else if ALLOWED_TAGS.contains(&tag.name.as_str()) {
                            if tag.closing {
                                emit_closing(&mut out, &mut open_stack, &tag.name);
                            } else {
                                emit_opening(&mut out, &mut open_stack, &tag.name, &tag.attrs);
                            }
                        }
                        // disallowed non-drop tag: swallow the tag, keep content
                    }
                    None => {
                        // not a parseable tag, treat the bracket as text
                        out.push_str("&lt;");
                        i += 1;
                    }
                }
            }
            b'>' => {
                out.push_str("&gt;");
                i += 1;
            }
            _ => {
                let ch = raw[i..].chars().next().unwrap_or('\u{fffd}');
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }

    // close anything left open so the output is balanced
    while let Some(name) = open_stack.pop() {
        out.push_str("</");
        out.push_str(&name);
        out.push('>');
    }

    out
}

/// Skip `<!-- ... -->` comments and `<!...>` declarations. Returns the
/// offset to resume at, or None when `start` is not one of these.
fn skip_comment_or_decl(raw: &str, start: usize) -> Option<usize> {
    let rest = &raw[start..];
    if rest.starts_with("<!--") {
        return Some(match rest.find("-->") {
            Some(pos) => start + pos + 3,
            None => raw.len(),
        });
    }
    if rest.starts_with("<!") {
        return Some(match rest.find('>') {
            Some(pos) => start + pos + 1,
            None => raw.len(),
        });
    }
    None
}

/// Parse a tag starting at the `<` at `start`. Returns None when the text
/// does not form a tag (no closing `>`, or the name is not alphabetic).
fn parse_tag(raw: &str, start: usize) -> Option<Tag> {
    let rest = &raw[start + 1..];
    let (closing, name_part) = match rest.strip_prefix('/') {
        Some(after) => (true, after),
        None => (false, rest),
    };

    let first = name_part.chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }

    let name_len = name_part
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(name_part.len());
    let name = name_part[..name_len].to_ascii_lowercase();

    let after_name = &name_part[name_len..];
    let gt = after_name.find('>')?;
    let attrs = after_name[..gt].trim_end_matches('/').trim().to_string();

    let consumed = 1 + usize::from(closing) + name_len + gt + 1;
    Some(Tag {
        name,
        closing,
        attrs,
        end: start + consumed,
    })
}

/// Skip everything up to and including `</name>` (case-insensitive).
fn skip_dropped_content(raw: &str, from: usize, name: &str) -> usize {
    let haystack = raw[from..].to_ascii_lowercase();
    let close = format!("</{}", name);
    match haystack.find(&close) {
        Some(pos) => {
            let after = from + pos + close.len();
            match raw[after..].find('>') {
                Some(gt) => after + gt + 1,
                None => raw.len(),
            }
        }
        None => raw.len(),
    }
}

fn emit_opening(out: &mut String, open_stack: &mut Vec<String>, name: &str, attrs: &str) {
    out.push('<');
    out.push_str(name);
    if name == "a" {
        if let Some(href) = extract_href(attrs) {
            out.push_str(" href=\"");
            for c in href.chars() {
                match c {
                    '"' => out.push_str("&quot;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    _ => out.push(c),
                }
            }
            out.push('"');
        }
    }
    out.push('>');
    open_stack.push(name.to_string());
}

/// Emit a closing tag if the element is actually open, closing any inner
/// elements first so nesting stays well-formed. Stray closes are dropped.
fn emit_closing(out: &mut String, open_stack: &mut Vec<String>, name: &str) {
    if !open_stack.iter().any(|n| n == name) {
        return;
    }
    while let Some(top) = open_stack.pop() {
        out.push_str("</");
        out.push_str(&top);
        out.push('>');
        if top == name {
            break;
        }
    }
}

/// Pull the href value out of a tag's attribute text. Values may be
/// double-quoted, single-quoted or bare. Script-ish URL schemes are
/// rejected, which drops the attribute entirely.
fn extract_href(attrs: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let key_pos = lower.find("href")?;
    let after_key = attrs[key_pos + 4..].trim_start();
    let after_eq = after_key.strip_prefix('=')?.trim_start();

    let value = match after_eq.chars().next()? {
        quote @ ('"' | '\'') => {
            let inner = &after_eq[1..];
            let end = inner.find(quote).unwrap_or(inner.len());
            &inner[..end]
        }
        _ => {
            let end = after_eq
                .find(|c: char| c.is_ascii_whitespace())
                .unwrap_or(after_eq.len());
            &after_eq[..end]
        }
    };

    // scheme check on the value with control/whitespace noise removed
    let compact: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if compact.starts_with("javascript:")
        || compact.starts_with("vbscript:")
        || compact.starts_with("data:")
    {
        return None;
    }

    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_fixed_point(input: &str) {
        let once = sanitize_word_edit(input);
        let twice = sanitize_word_edit(&once);
        assert_eq!(once, twice, "not idempotent for input: {:?}", input);
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize_word_edit("hello"), "hello");
        assert_eq!(sanitize_word_edit(""), "");
    }

    #[test]
    fn allowed_tags_survive() {
        assert_eq!(sanitize_word_edit("<b>bold</b>"), "<b>bold</b>");
        assert_eq!(sanitize_word_edit("<i>it</i>"), "<i>it</i>");
        assert_eq!(sanitize_word_edit("<p>para</p>"), "<p>para</p>");
    }

    #[test]
    fn script_tag_is_stripped_with_its_content() {
        assert_eq!(sanitize_word_edit("<script>alert(1)</script>hello"), "hello");
        assert_eq!(sanitize_word_edit("a<style>p{}</style>b"), "ab");
    }

    #[test]
    fn unclosed_script_drops_the_rest() {
        assert_eq!(sanitize_word_edit("hi<script>alert(1)"), "hi");
    }

    #[test]
    fn disallowed_tags_are_stripped_keeping_text() {
        assert_eq!(sanitize_word_edit("<span>word</span>"), "word");
        assert_eq!(sanitize_word_edit("<div><em>x</em></div>"), "x");
    }

    #[test]
    fn href_is_the_only_surviving_attribute() {
        assert_eq!(
            sanitize_word_edit(r#"<a href="https://example.com" onclick="evil()">x</a>"#),
            r#"<a href="https://example.com">x</a>"#
        );
        assert_eq!(
            sanitize_word_edit(r#"<b class="big" style="color:red">x</b>"#),
            "<b>x</b>"
        );
    }

    #[test]
    fn single_quoted_and_bare_href_values() {
        assert_eq!(
            sanitize_word_edit("<a href='/docs'>d</a>"),
            r#"<a href="/docs">d</a>"#
        );
        assert_eq!(
            sanitize_word_edit("<a href=/docs>d</a>"),
            r#"<a href="/docs">d</a>"#
        );
    }

    #[test]
    fn javascript_scheme_loses_the_attribute() {
        assert_eq!(
            sanitize_word_edit(r#"<a href="javascript:alert(1)">x</a>"#),
            "<a>x</a>"
        );
        assert_eq!(
            sanitize_word_edit("<a href=\"java\nscript:alert(1)\">x</a>"),
            "<a>x</a>"
        );
    }

    #[test]
    fn unclosed_tags_are_balanced() {
        assert_eq!(sanitize_word_edit("<b>bold"), "<b>bold</b>");
        assert_eq!(sanitize_word_edit("<b><i>x"), "<b><i>x</i></b>");
    }

    #[test]
    fn stray_close_is_dropped_and_misnesting_repaired() {
        assert_eq!(sanitize_word_edit("x</b>y"), "xy");
        assert_eq!(sanitize_word_edit("<b><i>x</b>y</i>"), "<b><i>x</i></b>y");
    }

    #[test]
    fn stray_brackets_become_entities() {
        assert_eq!(sanitize_word_edit("1 < 2"), "1 &lt; 2");
        assert_eq!(sanitize_word_edit("2 > 1"), "2 &gt; 1");
        assert_eq!(sanitize_word_edit("a <"), "a &lt;");
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(sanitize_word_edit("a<!-- hidden -->b"), "ab");
        assert_eq!(sanitize_word_edit("<!doctype html>x"), "x");
    }

    #[test]
    fn idempotent_on_a_spread_of_inputs() {
        let cases = [
            "hello",
            "<b>bold</b>",
            "<script>alert(1)</script>hello",
            r#"<a href="https://example.com" onclick="x">link</a>"#,
            "1 < 2 > 0 & done",
            "<b><i>nested",
            "x</b>y",
            "<span data-x=\"1\">mixed <b>bold</b></span>",
            "<a href='a\"b'>q</a>",
            "<!-- c -->tail",
            "<b ></b >",
            "&lt;already&gt; &amp; escaped",
        ];
        for case in cases {
            assert_fixed_point(case);
        }
    }

    #[test]
    fn entities_are_never_double_escaped() {
        assert_eq!(sanitize_word_edit("&lt;x&gt;"), "&lt;x&gt;");
        assert_eq!(sanitize_word_edit("fish &amp; chips"), "fish &amp; chips");
    }
}

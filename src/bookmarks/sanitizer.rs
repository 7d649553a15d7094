//! Output sanitization for free-text bookmark fields.
//!
//! Allow-listed tags survive with only their allow-listed attributes; every
//! other tag is escaped and rendered as text. `&` is never escaped, which keeps
//! `sanitize` idempotent.

use regex::Regex;
use std::sync::OnceLock;

use crate::model::Bookmark;

static TAG: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();

fn get_tag() -> &'static Regex {
    TAG.get_or_init(|| {
        Regex::new(
            r#"<(/?)([A-Za-z][A-Za-z0-9]*)((?:\s+[^\s"'<>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>=`]+))?)*)\s*(/?)>"#,
        )
        .expect("compile html tag regex")
    })
}

fn get_attribute() -> &'static Regex {
    ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>=`]+)))?"#)
            .expect("compile html attribute regex")
    })
}

/// Attributes whose value is dereferenced as a URL by the browser.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "cite"];

/// Prefixes a decoded URL attribute may start with. Anything else is dropped.
const SAFE_URL_PREFIXES: &[&str] = &["http://", "https://", "mailto:", "tel:", "#", "/", "./", "../"];

/// Attributes kept for an allow-listed tag, or `None` when the tag itself is not allowed.
fn allowed_attributes(tag: &str) -> Option<&'static [&'static str]> {
    let attrs: &'static [&'static str] = match tag {
        "a" => &["href", "title", "target"],
        "abbr" => &["title"],
        "area" => &["shape", "coords", "href", "alt"],
        "bdi" | "bdo" => &["dir"],
        "blockquote" | "q" => &["cite"],
        "col" | "colgroup" => &["align", "valign", "span", "width"],
        "del" | "ins" => &["datetime"],
        "details" => &["open"],
        "font" => &["color", "size", "face"],
        "img" => &["src", "alt", "title", "width", "height"],
        "ol" => &["start", "type"],
        "table" => &["width", "border", "align", "valign"],
        "td" | "th" => &["width", "rowspan", "colspan", "align", "valign"],
        "tr" => &["rowspan", "align", "valign"],
        "address" | "article" | "aside" | "b" | "big" | "br" | "caption" | "center" | "cite"
        | "code" | "dd" | "div" | "dl" | "dt" | "em" | "figcaption" | "figure" | "footer"
        | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "header" | "hr" | "i" | "li" | "mark"
        | "nav" | "p" | "pre" | "s" | "section" | "small" | "span" | "strike" | "strong"
        | "sub" | "summary" | "sup" | "tbody" | "tfoot" | "thead" | "tt" | "u" | "ul" => &[],
        _ => return None,
    };
    Some(attrs)
}

/// Neutralizes markup in `text` so it can be echoed back verbatim.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in get_tag().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        escape_into(&mut out, &text[last..whole.start()]);

        let name = caps[2].to_ascii_lowercase();
        match allowed_attributes(&name) {
            Some(allowed) => {
                let closing = !caps[1].is_empty();
                let self_closing = !caps[4].is_empty();
                render_tag(&mut out, &name, &caps[3], allowed, closing, self_closing);
            }
            None => escape_into(&mut out, whole.as_str()),
        }
        last = whole.end();
    }

    escape_into(&mut out, &text[last..]);
    out
}

/// Sanitizes the caller-visible free-text fields of a stored record.
pub fn sanitize_bookmark(bookmark: Bookmark) -> Bookmark {
    Bookmark {
        title: sanitize(&bookmark.title),
        description: bookmark.description.as_deref().map(sanitize),
        ..bookmark
    }
}

fn render_tag(
    out: &mut String,
    name: &str,
    raw_attrs: &str,
    allowed: &[&str],
    closing: bool,
    self_closing: bool,
) {
    out.push('<');
    if closing {
        out.push('/');
        out.push_str(name);
        out.push('>');
        return;
    }
    out.push_str(name);

    for attr in get_attribute().captures_iter(raw_attrs) {
        let attr_name = attr[1].to_ascii_lowercase();
        if !allowed.contains(&attr_name.as_str()) {
            continue;
        }
        let value = attr.get(2).or_else(|| attr.get(3)).or_else(|| attr.get(4));
        match value {
            Some(v) if URL_ATTRIBUTES.contains(&attr_name.as_str()) && !is_safe_url(v.as_str()) => {
                continue;
            }
            Some(v) => {
                out.push(' ');
                out.push_str(&attr_name);
                out.push_str("=\"");
                escape_into(out, v.as_str());
                out.push('"');
            }
            None => {
                out.push(' ');
                out.push_str(&attr_name);
            }
        }
    }

    if self_closing {
        out.push_str(" /");
    }
    out.push('>');
}

fn is_safe_url(value: &str) -> bool {
    let normalized = normalize_url(value);
    SAFE_URL_PREFIXES.iter().any(|p| normalized.starts_with(p))
}

/// The value as a browser would read it: references decoded, whitespace and
/// control characters removed, lowercased.
fn normalize_url(value: &str) -> String {
    decode_references(value)
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .flat_map(char::to_lowercase)
        .collect()
}

fn decode_references(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match decode_reference(rest) {
            Some((c, used)) => {
                out.push(c);
                rest = &rest[used..];
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

/// Decodes the reference at the start of `s` (which begins with `&`), returning
/// the character and the number of bytes consumed.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    let body = &s[1..];

    // Numeric references are decoded with or without the trailing semicolon.
    if let Some(numeric) = body.strip_prefix('#') {
        let (digits, radix, prefix) = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 3),
            None => (numeric, 10, 2),
        };
        let len = digits.find(|c: char| !c.is_digit(radix)).unwrap_or(digits.len());
        if len == 0 {
            return None;
        }
        let c = u32::from_str_radix(&digits[..len], radix)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        let terminated = digits[len..].starts_with(';');
        return Some((c, prefix + len + usize::from(terminated)));
    }

    let len = body.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(body.len());
    let terminated = body[len..].starts_with(';');
    let c = named_reference(&body[..len], terminated)?;
    Some((c, 1 + len + usize::from(terminated)))
}

fn named_reference(name: &str, terminated: bool) -> Option<char> {
    let c = match name {
        "amp" | "AMP" => '&',
        "lt" | "LT" => '<',
        "gt" | "GT" => '>',
        "quot" | "QUOT" => '"',
        _ if !terminated => return None,
        "apos" => '\'',
        "colon" => ':',
        "Tab" => '\t',
        "NewLine" => '\n',
        "sol" => '/',
        "num" => '#',
        "period" => '.',
        "lpar" => '(',
        "rpar" => ')',
        "nbsp" => '\u{a0}',
        _ => return None,
    };
    Some(c)
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_script_tags_are_escaped() {
        assert_eq!(
            sanitize(r#"Naughty <script>alert("xss")</script>"#),
            "Naughty &lt;script&gt;alert(&quot;xss&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_event_handlers_are_stripped() {
        let input = r#"Bad image <img src="https://url.to.file.which/does-not.exist" onerror="alert(document.cookie);">. But not <strong>all</strong> bad."#;
        assert_eq!(
            sanitize(input),
            r#"Bad image <img src="https://url.to.file.which/does-not.exist">. But not <strong>all</strong> bad."#
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(sanitize("All the pretty things"), "All the pretty things");
        assert_eq!(sanitize("Tom & Jerry's"), "Tom & Jerry's");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_stray_angle_brackets() {
        assert_eq!(sanitize("1 < 2 > 0"), "1 &lt; 2 &gt; 0");
        assert_eq!(sanitize("<3"), "&lt;3");
    }

    #[test]
    fn test_unsafe_href_dropped() {
        assert_eq!(
            sanitize(r#"<a href="javascript:alert(1)" title='x'>x</a>"#),
            r#"<a title="x">x</a>"#
        );
        assert_eq!(
            sanitize(r#"<a href=" JaVa script:alert(1)">x</a>"#),
            "<a>x</a>"
        );
        assert_eq!(
            sanitize(r#"<a href="https://ok.example" style="color:red">ok</a>"#),
            r#"<a href="https://ok.example">ok</a>"#
        );
    }

    #[test]
    fn test_encoded_schemes_dropped() {
        for input in [
            r#"<a href="&#106;avascript:alert(1)">x</a>"#,
            r#"<a href="&#0000106avascript:alert(1)">x</a>"#,
            r#"<a href="&#x6A;avascript:alert(1)">x</a>"#,
            r#"<a href="javascript&colon;alert(1)">x</a>"#,
            r#"<a href="jav&Tab;ascript:alert(1)">x</a>"#,
            r#"<a href="jav&#x09;ascript:alert(1)">x</a>"#,
            r#"<a href="java&NewLine;script:alert(1)">x</a>"#,
            "<a href=\"\u{1}javascript:alert(1)\">x</a>",
            r#"<a href=javascript:alert(1)>x</a>"#,
            r#"<a href='VBScript:msgbox(1)'>x</a>"#,
        ] {
            assert_eq!(sanitize(input), "<a>x</a>", "input: {}", input);
        }
        assert_eq!(
            sanitize(r#"<img src="data:text/html;base64,PHNjcmlwdD4=" alt="x">"#),
            r#"<img alt="x">"#
        );
        assert_eq!(
            sanitize(r#"<blockquote cite="javascript:alert(1)">q</blockquote>"#),
            "<blockquote>q</blockquote>"
        );
    }

    #[test]
    fn test_unquoted_event_handler_dropped() {
        assert_eq!(sanitize("<img src=x onerror=alert(1)>"), "<img>");
        assert_eq!(
            sanitize("<img src=https://cdn.example/a.png onerror=alert(1)>"),
            r#"<img src="https://cdn.example/a.png">"#
        );
    }

    #[test]
    fn test_safe_urls_kept() {
        assert_eq!(
            sanitize(r#"<a href="mailto:me@example.com">m</a>"#),
            r#"<a href="mailto:me@example.com">m</a>"#
        );
        assert_eq!(sanitize("<a href=/about>a</a>"), r#"<a href="/about">a</a>"#);
        assert_eq!(sanitize("<a href='#top'>t</a>"), r##"<a href="#top">t</a>"##);
        assert_eq!(
            sanitize(r#"<a href="&#104;ttps://ok.example">ok</a>"#),
            r#"<a href="&#104;ttps://ok.example">ok</a>"#
        );
    }

    #[test]
    fn test_decode_references() {
        assert_eq!(decode_references("&#106;&#x61;&#118a"), "java");
        assert_eq!(decode_references("a&colon;b&Tab;c"), "a:b\tc");
        assert_eq!(decode_references("&colon &unknown; & &#;"), "&colon &unknown; & &#;");
        assert_eq!(decode_references("&lt&quot;&amp;"), "<\"&");
        assert_eq!(normalize_url(" JaVa\tScRiPt:"), "javascript:");
    }

    #[test]
    fn test_tags_normalized() {
        assert_eq!(sanitize("<STRONG>hi</STRONG>"), "<strong>hi</strong>");
        assert_eq!(sanitize("line<br/>break"), "line<br />break");
        assert_eq!(sanitize("<iframe src=x></iframe>"), "&lt;iframe src=x&gt;&lt;/iframe&gt;");
        assert_eq!(sanitize("<!-- hidden -->"), "&lt;!-- hidden --&gt;");
    }

    #[test]
    fn test_sanitize_bookmark_fields() {
        let bm = Bookmark {
            id: 911,
            title: "<script>x</script>".into(),
            url: "https://www.hackers.com".into(),
            description: Some("<b onclick=\"x()\">bold</b>".into()),
            rating: 1,
        };
        let clean = sanitize_bookmark(bm);
        assert_eq!(clean.id, 911);
        assert_eq!(clean.title, "&lt;script&gt;x&lt;/script&gt;");
        assert_eq!(clean.description.as_deref(), Some("<b>bold</b>"));
        assert_eq!(clean.url, "https://www.hackers.com");
    }

    #[test]
    fn test_idempotent_on_fixtures() {
        for input in [
            r#"Naughty <script>alert("xss")</script>"#,
            r#"<img src='a"b' alt=x/>"#,
            r#"<a href="x>y" target=_blank>link</a>"#,
        ] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(s in ".*") {
            let once = sanitize(&s);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn prop_sanitize_never_emits_executable_markup(
            s in r#"(<|>|"|'|=| |a |img |blockquote |href=|src=|cite=|&#106;|&#x6A;|&#0106|&colon;|&Tab;|&NewLine;|&amp;|java|script|:|vbscript:|data:|alert\(1\)|/|x)*"#
        ) {
            let out = sanitize(&s);
            prop_assert!(!out.to_ascii_lowercase().contains("<script"));
            for tag in get_tag().captures_iter(&out) {
                for attr in get_attribute().captures_iter(&tag[3]) {
                    if !URL_ATTRIBUTES.contains(&attr[1].to_ascii_lowercase().as_str()) {
                        continue;
                    }
                    if let Some(v) = attr.get(2).or_else(|| attr.get(3)).or_else(|| attr.get(4)) {
                        let url = normalize_url(v.as_str());
                        prop_assert!(
                            !["javascript:", "vbscript:", "data:"].iter().any(|b| url.starts_with(b)),
                            "blocked scheme survived in {:?}",
                            out
                        );
                    }
                }
            }
        }

        #[test]
        fn prop_sanitize_is_idempotent_on_markup(
            s in r#"(<|>|/|"|'|=| |a|img|script|src|onerror|href|strong|javascript:|x)*"#
        ) {
            let once = sanitize(&s);
            prop_assert_eq!(sanitize(&once), once);
        }
    }
}

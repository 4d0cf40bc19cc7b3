//! HTML sanitizer for feed content
//!
//! The input is parsed into a DOM with `scraper` and re-serialized from
//! scratch: only whitelisted elements and attributes are written back, and all
//! text and attribute values are escaped.

use crate::html::escape_html;
use scraper::{ElementRef, Html, Node};

/// Elements removed together with everything inside them
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "iframe", "object", "embed"];

/// Formatting tags that survive; everything else is unwrapped
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "b", "strong", "i", "em", "u", "ul", "ol", "li", "a", "img", "h1", "h2", "h3", "h4",
    "h5", "h6", "blockquote", "span", "div", "table", "thead", "tbody", "tr", "td", "th",
];

/// Allowed tags written without a closing tag
const VOID_TAGS: &[&str] = &["br", "img"];

const ALLOWED_ATTRIBUTES: &[&str] = &["href", "src", "alt", "title", "width", "height", "colspan", "rowspan"];

const URL_ATTRIBUTES: &[&str] = &["href", "src"];

const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Strip active content from untrusted HTML, keeping basic formatting
pub fn sanitize_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_html(&text.text)),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(element, out);
                }
            }
            // comments, doctypes, processing instructions
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if DROPPED_ELEMENTS.contains(&name) {
        return;
    }
    if !ALLOWED_TAGS.contains(&name) {
        write_children(element, out);
        return;
    }

    let mut attrs: Vec<(&str, &str)> = element
        .value()
        .attrs()
        .filter(|(attr, value)| keep_attribute(attr, value))
        .collect();
    attrs.sort_unstable_by_key(|(attr, _)| *attr);

    out.push('<');
    out.push_str(name);
    for (attr, value) in attrs {
        out.push_str(&format!(" {}=\"{}\"", attr, escape_html(value)));
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }
    write_children(element, out);
    out.push_str(&format!("</{}>", name));
}

fn keep_attribute(name: &str, value: &str) -> bool {
    if !ALLOWED_ATTRIBUTES.contains(&name) {
        return false;
    }
    !(URL_ATTRIBUTES.contains(&name) && is_unsafe_url(value))
}

fn is_unsafe_url(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES.iter().any(|scheme| normalized.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_scripts_with_content() {
        let html = r#"<p>Hi</p><script type="text/javascript">alert('x')</script><STYLE>p{}</STYLE>"#;
        assert_eq!(sanitize_html(html), "<p>Hi</p>");
    }

    #[test]
    fn test_removes_event_handlers_and_styles() {
        let html = r#"<img src="a.png" onerror="alert(1)" style="width:1px" alt="A">"#;
        assert_eq!(sanitize_html(html), r#"<img alt="A" src="a.png">"#);
    }

    #[test]
    fn test_removes_javascript_urls() {
        let html = r#"<a href=" JavaScript:alert(1)">x</a><a href='https://warspear.com'>ok</a>"#;
        assert_eq!(sanitize_html(html), r#"<a>x</a><a href="https://warspear.com">ok</a>"#);
    }

    #[test]
    fn test_unwraps_unknown_tags_and_comments() {
        let html = "<font color=red>Red</font><!-- hidden --><section><b>bold</b></section><br/>";
        assert_eq!(sanitize_html(html), "Red<b>bold</b><br>");
    }

    #[test]
    fn test_iframe_and_embed_removed() {
        let html = r#"<div><iframe src="x"></iframe><embed src="y.swf">text</div>"#;
        assert_eq!(sanitize_html(html), "<div>text</div>");
    }

    #[test]
    fn test_unterminated_tag_does_not_survive() {
        let out = sanitize_html(r#"<p>Patch notes</p><img src=x onerror=alert(document.cookie) "#);
        assert!(!out.contains("onerror"));
        assert!(!out.contains("<img src=x"));
        assert!(out.starts_with("<p>Patch notes</p>"));
    }

    #[test]
    fn test_malformed_markup_is_escaped() {
        let out = sanitize_html(r#"<b>5 < 6</b><p title="a"b" onclick=x>t</p><<script>alert(1)//<</script>"#);
        assert!(!out.contains("onclick"));
        assert!(!out.contains("<script"));
        assert!(!out.contains("alert(1)"));
        assert!(out.starts_with("<b>5 &lt; 6</b>"));
    }

    #[test]
    fn test_decoded_entities_are_escaped_again() {
        let out = sanitize_html("<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
        assert_eq!(out, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
    }
}

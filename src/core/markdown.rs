use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

fn is_unsafe_url(url: &str) -> bool {
    let lowered: String = url
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES.iter().any(|s| lowered.starts_with(s))
}

/// Markdown to HTML with raw HTML escaped and script-capable URLs replaced by `#`.
///
/// Single newlines become line breaks, matching how editors type copy.
pub fn md_to_safe_html(md: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;

    let events = Parser::new_ext(md, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::SoftBreak => Event::HardBreak,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if is_unsafe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if is_unsafe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(md.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Escapes text for element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Attribute-safe URL: escaped, and `#` for script-capable schemes.
pub fn safe_href(url: &str) -> String {
    if is_unsafe_url(url) {
        "#".to_string()
    } else {
        escape_html(url.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let html = md_to_safe_html("**bold** and *em*");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>em</em>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = md_to_safe_html("hi <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));

        let block = md_to_safe_html("<div onclick=\"x()\">boo</div>");
        assert!(!block.contains("<div"));
    }

    #[test]
    fn test_javascript_links_are_neutralized() {
        let html = md_to_safe_html("[click](javascript:alert(1)) [ok](https://example.com)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("href=\"https://example.com\""));

        let spaced = md_to_safe_html("[x](  JavaScript:alert(1))");
        assert!(!spaced.to_lowercase().contains("javascript"));
    }

    #[test]
    fn test_soft_breaks_become_line_breaks() {
        let html = md_to_safe_html("line one\nline two");
        assert!(html.contains("<br />"));
    }

    #[test]
    fn test_escape_and_href() {
        assert_eq!(escape_html("<a href='x'>&"), "&lt;a href=&#039;x&#039;&gt;&amp;");
        assert_eq!(safe_href("javascript:void(0)"), "#");
        assert_eq!(safe_href("#contact"), "#contact");
    }
}

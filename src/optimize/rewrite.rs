//! Regex-level HTML edits
//!
//! Every edit leaves the rest of the document byte-for-byte unchanged.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex pattern is valid"))
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?is)(<title\b[^>]*>)(.*?)(</title\s*>)")
}

fn meta_description_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(
        &RE,
        r#"(?is)<meta\b[^>]*\bname\s*=\s*["']?description["']?[^>]*>"#,
    )
}

fn h1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?is)<h1(\s[^>]*)?>(.*?)</h1\s*>")
}

fn body_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?i)<body\b[^>]*>")
}

fn head_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?i)</head\s*>")
}

fn html_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?i)<html\b[^>]*>")
}

fn img_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?is)<img\b[^>]*>")
}

fn alt_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r#"(?i)\salt\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
}

fn src_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r#"(?i)\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
}

/// Replaces the text of the first `<title>`; false if there is none
pub fn replace_title(html: &mut String, title: &str) -> bool {
    let escaped = html_escape::encode_text(title);
    let replaced = match title_re().captures(html) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let replacement = format!("{}{}{}", &caps[1], escaped, &caps[3]);
            Some((whole, replacement))
        }
        None => None,
    };
    match replaced {
        Some((range, replacement)) => {
            html.replace_range(range, &replacement);
            true
        }
        None => false,
    }
}

/// Replaces the first meta description tag; false if there is none
pub fn replace_meta_description(html: &mut String, tag: &str) -> bool {
    let range = meta_description_re().find(html).map(|m| m.range());
    match range {
        Some(range) => {
            html.replace_range(range, tag);
            true
        }
        None => false,
    }
}

/// Renames every `<h1>` after the first to `<h2>`, returning how many changed
pub fn demote_extra_h1(html: &mut String) -> usize {
    let mut seen = 0usize;
    let rewritten = h1_re().replace_all(html, |caps: &Captures<'_>| {
        seen += 1;
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        if seen == 1 {
            caps[0].to_string()
        } else {
            format!("<h2{}>{}</h2>", attrs, &caps[2])
        }
    });
    let rewritten = rewritten.into_owned();
    *html = rewritten;
    seen.saturating_sub(1)
}

/// Inserts `fragment` right after the opening `<body>` tag
pub fn insert_after_body_open(html: &mut String, fragment: &str) -> bool {
    match body_open_re().find(html).map(|m| m.end()) {
        Some(at) => {
            html.insert_str(at, fragment);
            true
        }
        None => false,
    }
}

/// Inserts head elements before `</head>`
///
/// Documents without a head get one after `<html>`, or at the very start.
pub fn insert_into_head(html: &mut String, elements: &[String]) {
    if elements.is_empty() {
        return;
    }
    let block: String = elements.iter().map(|e| format!("{}\n", e)).collect();

    if let Some(at) = head_close_re().find(html).map(|m| m.start()) {
        html.insert_str(at, &block);
    } else if let Some(at) = html_open_re().find(html).map(|m| m.end()) {
        html.insert_str(at, &format!("<head>\n{}</head>", block));
    } else {
        html.insert_str(0, &format!("<head>\n{}</head>\n", block));
    }
}

/// Adds alt text to images without any, returning how many changed
///
/// `derive` maps the image `src` to the alt text to use.
pub fn backfill_alt<F>(html: &mut String, derive: F) -> usize
where
    F: Fn(&str) -> String,
{
    let mut changed = 0usize;
    let rewritten = img_re().replace_all(html, |caps: &Captures<'_>| {
        let tag = &caps[0];
        let existing = alt_attr_re().captures(tag);
        let blank = existing.as_ref().map_or(true, |c| {
            c[1].trim_matches(|ch| ch == '"' || ch == '\'').trim().is_empty()
        });
        if !blank {
            return tag.to_string();
        }

        let src = src_attr_re()
            .captures(tag)
            .and_then(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
            .map_or("", |m| m.as_str());
        let alt = format!(
            " alt=\"{}\"",
            html_escape::encode_double_quoted_attribute(&derive(src))
        );
        changed += 1;

        match existing.and_then(|c| c.get(0).map(|m| m.range())) {
            Some(range) => format!("{}{}{}", &tag[..range.start], alt, &tag[range.end..]),
            None => format!("<img{}{}", alt, &tag[4..]),
        }
    });
    let rewritten = rewritten.into_owned();
    *html = rewritten;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_title_keeps_attributes() {
        let mut html = "<head><TITLE id=\"t\">Old</TITLE></head>".to_string();
        assert!(replace_title(&mut html, "Fish & Chips"));
        assert_eq!(html, "<head><TITLE id=\"t\">Fish &amp; Chips</TITLE></head>");
    }

    #[test]
    fn test_replace_title_absent() {
        let mut html = "<head></head>".to_string();
        assert!(!replace_title(&mut html, "New"));
        assert_eq!(html, "<head></head>");
    }

    #[test]
    fn test_replace_meta_description_any_attribute_order() {
        let mut html =
            r#"<head><meta content="old" name="Description"><meta name="x"></head>"#.to_string();
        assert!(replace_meta_description(
            &mut html,
            r#"<meta name="description" content="new">"#
        ));
        assert_eq!(
            html,
            r#"<head><meta name="description" content="new"><meta name="x"></head>"#
        );
    }

    #[test]
    fn test_demote_extra_h1() {
        let mut html =
            r#"<h1>First</h1><p>x</p><h1 class="big">Second</h1><H1>Third</H1>"#.to_string();
        assert_eq!(demote_extra_h1(&mut html), 2);
        assert_eq!(
            html,
            r#"<h1>First</h1><p>x</p><h2 class="big">Second</h2><h2>Third</h2>"#
        );
    }

    #[test]
    fn test_insert_into_head_variants() {
        let elements = vec!["<meta name=\"a\">".to_string()];

        let mut with_head = "<html><head><title>T</title></head><body></body></html>".to_string();
        insert_into_head(&mut with_head, &elements);
        assert!(with_head.contains("<title>T</title><meta name=\"a\">\n</head>"));

        let mut no_head = "<html lang=\"en\"><body></body></html>".to_string();
        insert_into_head(&mut no_head, &elements);
        assert!(no_head.starts_with("<html lang=\"en\"><head>\n<meta name=\"a\">\n</head><body>"));

        let mut fragment = "<p>hi</p>".to_string();
        insert_into_head(&mut fragment, &elements);
        assert!(fragment.starts_with("<head>\n<meta name=\"a\">\n</head>\n<p>hi</p>"));
    }

    #[test]
    fn test_backfill_alt() {
        let mut html = concat!(
            r#"<img src="/a/red-shoe.png">"#,
            r#"<img alt="" src='/b.jpg'>"#,
            r#"<img src="/c.gif" alt="Kept">"#
        )
        .to_string();
        let changed = backfill_alt(&mut html, |src| format!("from {}", src));
        assert_eq!(changed, 2);
        assert_eq!(
            html,
            concat!(
                r#"<img alt="from /a/red-shoe.png" src="/a/red-shoe.png">"#,
                r#"<img alt="from /b.jpg" src='/b.jpg'>"#,
                r#"<img src="/c.gif" alt="Kept">"#
            )
        );
    }
}

// Markup stripping for documents that arrive with inline tags.

/// Drop `<...>` tags and decode the basic character entities, keeping only
/// the text content.
pub fn strip_markup(input: &str) -> String {
    let mut text = String::with_capacity(input.len());
    let mut in_tag = false;

    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    const ENTITIES: [(&str, &str); 6] = [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        ("&nbsp;", " "),
    ];

    let mut out = text.to_string();
    for (entity, replacement) in ENTITIES {
        out = out.replace(entity, replacement);
    }
    // Last, so "&amp;lt;" decodes to "&lt;" rather than "<".
    out.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_tags_and_keeps_text() {
        let raw = "<doc id=\"1\"><p>John met <b>Mary</b>.</p>\n<p>He smiled.</p></doc>";
        assert_eq!(strip_markup(raw), "John met Mary.\nHe smiled.");
    }

    #[test]
    fn decodes_entities_once() {
        assert_eq!(strip_markup("AT&amp;T &lt;3 &amp;lt;"), "AT&T <3 &lt;");
    }

    #[test]
    fn plain_text_is_untouched() {
        let raw = "No tags here, 3 > 2.";
        assert_eq!(strip_markup(raw), raw);
    }
}

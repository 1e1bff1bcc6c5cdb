//! HTML escaping matching how WordPress stores term names.

use std::borrow::Cow;

/// Replace `&`, `<`, `>`, `"` and `'` with their HTML entities.
///
/// WordPress escapes term names on save, so a category created as `A & B`
/// comes back as `A &amp; B`. Comparing a local name against a remote one
/// goes through this function first.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut escaped = String::with_capacity(input.len() + 16);
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape_html("Release notes"), Cow::Borrowed("Release notes")));
    }

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(
            escape_html(r#"Tom & Jerry's <"Show">"#),
            "Tom &amp; Jerry&#039;s &lt;&quot;Show&quot;&gt;"
        );
    }

    #[test]
    fn does_not_reuse_existing_entities() {
        assert_eq!(escape_html("A &amp; B"), "A &amp;amp; B");
    }
}

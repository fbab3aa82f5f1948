//! Conversion from the chat HTML subset the model writes to vault markdown.

use std::sync::LazyLock;

use regex::Regex;

static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"<b>(.*?)</b>", "**${1}**"),
        (r"<i>(.*?)</i>", "*${1}*"),
        (r"<code>(.*?)</code>", "`${1}`"),
        (r"<s>(.*?)</s>", "~~${1}~~"),
        (r"</?u>", ""),
        (r#"<a href="([^"]+)">([^<]+)</a>"#, "[${2}](${1})"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("markdown conversion patterns are valid"),
            replacement,
        )
    })
    .collect()
});

/// Rewrite `<b>`, `<i>`, `<code>`, `<s>`, `<u>`, and `<a href>` to markdown.
///
/// Tags only match within a single line. Text without these tags is
/// returned unchanged.
pub fn html_to_markdown(html: &str) -> String {
    RULES
        .iter()
        .fold(html.to_string(), |text, (re, replacement)| {
            re.replace_all(&text, *replacement).into_owned()
        })
}

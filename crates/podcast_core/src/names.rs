/// Episode name from anchor text: line breaks removed, nothing else touched.
pub fn clean_episode_name(anchor_text: &str) -> String {
    anchor_text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

/// Link from a raw href: percent-decoded, then every space removed.
///
/// Hrefs that are not valid UTF-8 once decoded are kept as-is (minus spaces).
pub fn clean_link(href: &str) -> String {
    let decoded = urlencoding::decode(href.trim())
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| href.trim().to_string());
    decoded.chars().filter(|c| *c != ' ').collect()
}

/// Turn scraped text into a single safe path component.
///
/// Separators and control characters become `_`. Returns `None` when nothing
/// usable remains or the result would be `.` / `..`.
pub fn sanitize_component(input: &str) -> Option<String> {
    let cleaned: String = input
        .trim()
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return None;
    }
    Some(cleaned)
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '/' | '\\' | '\0'..='\u{1F}' | '\u{7F}')
}

use url::Url;

/// Punctuation kept when it sits between two word characters, e.g. `don't`,
/// `state-of-the-art`, `3.5`, `1,000`.
const INTRA_WORD: [char; 4] = ['\'', '-', '.', ','];

/// Trim, default the scheme to `https://` and parse as an absolute URL.
///
/// Returns the canonical serialization, or `None` if the value is empty or
/// still not an absolute URL with a host.
pub fn clean_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url.into()),
        _ => None,
    }
}

/// Collapse runs of whitespace into single spaces.
pub fn clean_title(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace everything outside word characters and intra-word punctuation
/// with whitespace, collapse whitespace and lowercase.
pub fn clean_content(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());

    for (i, &c) in chars.iter().enumerate() {
        if is_word_char(c) {
            out.push(c);
        } else if INTRA_WORD.contains(&c)
            && i > 0
            && is_word_char(chars[i - 1])
            && chars.get(i + 1).copied().is_some_and(is_word_char)
        {
            out.push(c);
        } else {
            out.push(' ');
        }
    }

    out.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of whitespace separated tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

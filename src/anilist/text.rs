//! Plain-text rendering of AniList descriptions.

const MAX_ENTITY_LEN: usize = 32;

/// Drops markup, decodes entities and removes "(Source: ...)" credits.
pub fn plain_description(input: &str) -> String {
    let text = strip_markup(input);
    let text = drop_source_credits(&text);
    collapse_blank_lines(&text)
}

/// First paragraph of a description, cut at a word boundary.
pub fn summary_excerpt(description: &str, max_chars: usize) -> String {
    let first = description
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or("");
    if first.chars().count() <= max_chars {
        return first.to_string();
    }
    let cut: String = first.chars().take(max_chars).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end_matches(|c: char| c.is_whitespace() || c == ','))
}

/// Single pass over the input: tags are skipped (`<br>` becomes a newline)
/// and `&...;` entities are decoded where recognised.
fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                let tag: String = chars.by_ref().take_while(|c| *c != '>').collect();
                let name = tag.trim().trim_start_matches('/').trim_start();
                if name.get(..2).is_some_and(|n| n.eq_ignore_ascii_case("br")) {
                    out.push('\n');
                }
            }
            '&' => {
                let rest = chars.as_str();
                match rest.find(';').filter(|end| *end <= MAX_ENTITY_LEN) {
                    Some(end) => match decode_entity(&rest[..end]) {
                        Some(decoded) => {
                            out.push(decoded);
                            chars = rest[end + 1..].chars();
                        }
                        None => out.push('&'),
                    },
                    None => out.push('&'),
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        "hellip" => Some('…'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn drop_source_credits(input: &str) -> String {
    const MARKER: &str = "(source:";
    let lower = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(MARKER) {
        let start = cursor + found;
        out.push_str(&input[cursor..start]);
        cursor = match lower[start..].find(')') {
            Some(close) => start + close + 1,
            None => input.len(),
        };
    }
    out.push_str(&input[cursor..]);
    out
}

/// Normalises line endings, keeps at most one blank line in a row and trims.
fn collapse_blank_lines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_blank = false;
    for line in input.replace("\r\n", "\n").split('\n') {
        let line = line.trim_end();
        if line.trim().is_empty() {
            pending_blank = true;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;
        out.push_str(line);
    }
    out.trim().to_string()
}

// pull the sql statement out of whatever the model said
// plain text search, no parsing

const KEYWORDS: [&str; 13] = [
    "SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "SHOW", "DESCRIBE", "EXPLAIN", "CREATE",
    "ALTER", "DROP", "REPLACE", "PRAGMA",
];

/// First SQL statement in a model response, up to and including its `;`.
///
/// Looks inside the first fenced code block if there is one, then at the
/// first line starting with a query keyword, then at the first upper-case
/// keyword anywhere. Returns `None` when the text has no query keyword.
pub fn extract_sql(response: &str) -> Option<String> {
    fenced_block(response)
        .and_then(|block| find_statement(block, false))
        .or_else(|| find_statement(response, true))
}

// outside a fence a blank line also ends the statement
fn find_statement(text: &str, in_prose: bool) -> Option<String> {
    let start = line_start(text).or_else(|| inline_start(text))?;
    let statement = take_statement(&text[start..], in_prose)
        .trim_end_matches("```")
        .trim();

    (!statement.is_empty()).then(|| statement.to_string())
}

// contents of the first ``` block, minus the language tag
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body = &after[after.find('\n').map(|i| i + 1).unwrap_or(after.len())..];
    Some(body.find("```").map(|end| &body[..end]).unwrap_or(body))
}

fn line_start(text: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if starts_with_keyword(trimmed) {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

fn starts_with_keyword(text: &str) -> bool {
    KEYWORDS.iter().any(|kw| {
        text.get(..kw.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(kw))
            && !text[kw.len()..].chars().next().is_some_and(is_word_char)
    })
}

// upper case only here, prose mentions "select" all the time
fn inline_start(text: &str) -> Option<usize> {
    KEYWORDS
        .iter()
        .filter_map(|kw| {
            text.match_indices(kw).map(|(i, _)| i).find(|&i| {
                let before = text[..i].chars().next_back();
                let after = text[i + kw.len()..].chars().next();
                !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
            })
        })
        .min()
}

// everything up to the first semicolon that isn't inside quotes
fn take_statement(text: &str, stop_at_blank_line: bool) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, ';') => return &text[..=i],
            (None, '\n') if stop_at_blank_line && blank_line_next(&text[i + 1..]) => {
                return &text[..i];
            }
            (None, _) => {}
        }
    }
    text
}

fn blank_line_next(rest: &str) -> bool {
    rest.lines().next().is_none_or(|line| line.trim().is_empty())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

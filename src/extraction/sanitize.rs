/// Sanitize recognized text before passing downstream.
/// Strips control characters, normalizes whitespace, preserves the Latin
/// and Arabic scripts plus the punctuation found in legal citations.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| {
            c.is_alphanumeric()
                || c.is_whitespace()
                || matches!(
                    c,
                    '.' | ','
                        | ';'
                        | ':'
                        | '-'
                        | '/'
                        | '('
                        | ')'
                        | '['
                        | ']'
                        | '+'
                        | '='
                        | '%'
                        | '#'
                        | '&'
                        | '\''
                        | '"'
                        | '!'
                        | '?'
                        | '*'
                        | '_'
                        | '°'
                        | '«'
                        | '»'
                        | '\u{2013}' // En-dash
                        | '\u{2014}' // Em-dash
                        | '\u{2019}' // Right single quotation mark
                        | '\u{2018}' // Left single quotation mark
                        // Arabic punctuation
                        | '\u{060C}' // Arabic comma
                        | '\u{061B}' // Arabic semicolon
                        | '\u{061F}' // Arabic question mark
                )
        })
        .collect::<String>()
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits a command line into whitespace-separated tokens, grouping
/// parenthesized spans into one compound token.
///
/// A token starting with `(` opens a group; following tokens are appended,
/// space-joined, until one ends with `)`. The outer parentheses are removed
/// and the inner text trimmed, so `(a, b, c)` and `( a, b, c )` both become
/// the single token `a, b, c`.
///
/// There is no quoting: commas and parentheses inside values are not
/// escaped. A group still open at end of line is flushed as one token.
///
/// # Example
/// ```
/// # use tabstore::parser::tokenize;
/// let tokens = tokenize("INSERT INTO t VALUES (Alice, Eng)");
/// assert_eq!(tokens, vec!["INSERT", "INTO", "t", "VALUES", "Alice, Eng"]);
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    tokenize_marked(line).into_iter().map(|t| t.text).collect()
}

/// One token and whether it came from a parenthesized group.
///
/// Keywords are only recognized in tokens that were not grouped, so
/// `(from)` is a column named `from`, not the FROM keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub grouped: bool,
}

impl Token {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            grouped: false,
        }
    }

    fn group(text: String) -> Self {
        Self { text, grouped: true }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        !self.grouped && self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Same split as [`tokenize`], keeping the grouped flag.
pub fn tokenize_marked(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut group: Option<String> = None;

    for word in line.split_whitespace() {
        match group.as_mut() {
            Some(open) => {
                open.push(' ');
                open.push_str(word);
                if word.ends_with(')') {
                    tokens.push(Token::group(close_group(open)));
                    group = None;
                }
            }
            None if word.starts_with('(') => {
                if word.len() > 1 && word.ends_with(')') {
                    tokens.push(Token::group(close_group(word)));
                } else {
                    group = Some(word.to_string());
                }
            }
            None => tokens.push(Token::plain(word)),
        }
    }

    if let Some(open) = group {
        let inner = open.strip_prefix('(').unwrap_or(&open);
        tokens.push(Token::group(inner.trim().to_string()));
    }

    tokens
}

fn close_group(raw: &str) -> String {
    let inner = raw.strip_prefix('(').unwrap_or(raw);
    let inner = inner.strip_suffix(')').unwrap_or(inner);
    inner.trim().to_string()
}

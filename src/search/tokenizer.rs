//! Splits raw query text into tokens.
//!
//! This is a purely lexical pass: quoting, grouping and negation punctuation
//! are recognised here, while `key:value` tokens are only split, not
//! validated.

/// One unit of a search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `(`
    Group,
    /// `)`
    GroupEnd,
    /// `-`
    Negate,
    /// `or`, in any case.
    Disjoin,
    /// `key:value`; `key` is lowercased.
    Command { key: String, value: String },
    /// Free text.
    Text(String),
}

impl Token {
    /// Classifies a completed word.
    fn from_word(word: String) -> Token {
        if word.eq_ignore_ascii_case("or") {
            return Token::Disjoin;
        }
        match word.split_once(':') {
            Some((key, value)) => Token::Command {
                key: key.to_lowercase(),
                value: value.to_string(),
            },
            None => Token::Text(word),
        }
    }
}

/// Tokenizes `query` in a single pass.
///
/// ```
/// use flashfind_core::search::tokenizer::{tokenize, Token};
///
/// let tokens = tokenize(r#"tag:"Hard Word""#);
/// assert_eq!(
///     tokens,
///     vec![Token::Command { key: "tag".into(), value: "Hard Word".into() }]
/// );
/// ```
pub fn tokenize(query: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut word = String::new();
    let mut in_quote: Option<char> = None;

    for c in query.chars() {
        match c {
            '\'' | '"' => match in_quote {
                Some(q) if q == c => in_quote = None,
                Some(_) => word.push(c),
                // quotes may only open a token or follow a colon
                None if word.is_empty() || word.ends_with(':') => in_quote = Some(c),
                None => word.push(c),
            },
            c if c.is_whitespace() => {
                if in_quote.is_some() {
                    word.push(c);
                } else if !word.is_empty() {
                    tokens.push(Token::from_word(std::mem::take(&mut word)));
                }
            }
            '(' | ')' => {
                if in_quote.is_some() {
                    word.push(c);
                } else {
                    if c == ')' && !word.is_empty() {
                        tokens.push(Token::from_word(std::mem::take(&mut word)));
                    }
                    tokens.push(if c == '(' { Token::Group } else { Token::GroupEnd });
                }
            }
            '-' => {
                if in_quote.is_some() || !word.is_empty() {
                    word.push(c);
                } else if tokens.last() != Some(&Token::Negate) {
                    tokens.push(Token::Negate);
                }
            }
            _ => word.push(c),
        }
    }

    if !word.is_empty() {
        tokens.push(Token::from_word(word));
    }
    tokens
}

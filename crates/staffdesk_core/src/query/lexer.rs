//! Tokenizer for query lines.

use super::{QueryError, QueryResult};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Keyword, entity, field or helper name. Keywords are matched
    /// case-insensitively by the parser.
    Ident(String),
    Integer(i64),
    Decimal(f64),
    /// Quoted string with quotes removed and doubled quotes unescaped.
    Text(String),
    Comma,
    LParen,
    RParen,
    Star,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "`{name}`"),
            Self::Integer(value) => write!(f, "`{value}`"),
            Self::Decimal(value) => write!(f, "`{value}`"),
            Self::Text(value) => write!(f, "'{value}'"),
            Self::Comma => f.write_str("`,`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::Star => f.write_str("`*`"),
            Self::Eq => f.write_str("`=`"),
            Self::Ne => f.write_str("`!=`"),
            Self::Lt => f.write_str("`<`"),
            Self::Le => f.write_str("`<=`"),
            Self::Gt => f.write_str("`>`"),
            Self::Ge => f.write_str("`>=`"),
        }
    }
}

/// Splits one query line into tokens.
pub fn tokenize(input: &str) -> QueryResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let current = chars[pos];
        let next = chars.get(pos + 1).copied();

        if current.is_whitespace() {
            pos += 1;
            continue;
        }

        let (token, consumed) = match current {
            ',' => (Token::Comma, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '*' => (Token::Star, 1),
            '=' if next == Some('=') => (Token::Eq, 2),
            '=' => (Token::Eq, 1),
            '!' if next == Some('=') => (Token::Ne, 2),
            '<' if next == Some('=') => (Token::Le, 2),
            '<' if next == Some('>') => (Token::Ne, 2),
            '<' => (Token::Lt, 1),
            '>' if next == Some('=') => (Token::Ge, 2),
            '>' => (Token::Gt, 1),
            '\'' | '"' => lex_text(&chars, pos)?,
            '-' if next.is_some_and(|c| c.is_ascii_digit()) => lex_number(&chars, pos)?,
            c if c.is_ascii_digit() => lex_number(&chars, pos)?,
            c if c.is_alphabetic() || c == '_' => lex_ident(&chars, pos),
            other => {
                return Err(QueryError::Syntax(format!(
                    "unexpected character `{other}` at offset {pos}"
                )))
            }
        };

        tokens.push(token);
        pos += consumed;
    }

    Ok(tokens)
}

fn lex_text(chars: &[char], start: usize) -> QueryResult<(Token, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut pos = start + 1;

    while pos < chars.len() {
        let current = chars[pos];
        if current == quote {
            if chars.get(pos + 1) == Some(&quote) {
                value.push(quote);
                pos += 2;
                continue;
            }
            return Ok((Token::Text(value), pos + 1 - start));
        }
        value.push(current);
        pos += 1;
    }

    Err(QueryError::Syntax(format!(
        "unterminated string starting at offset {start}"
    )))
}

fn lex_number(chars: &[char], start: usize) -> QueryResult<(Token, usize)> {
    let mut pos = start;
    if chars[pos] == '-' {
        pos += 1;
    }
    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }

    let mut is_decimal = false;
    if pos < chars.len()
        && chars[pos] == '.'
        && chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit())
    {
        is_decimal = true;
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
    }

    let text: String = chars[start..pos].iter().collect();
    let token = if is_decimal {
        text.parse::<f64>()
            .map(Token::Decimal)
            .map_err(|err| QueryError::Syntax(format!("invalid number `{text}`: {err}")))?
    } else {
        text.parse::<i64>()
            .map(Token::Integer)
            .map_err(|err| QueryError::Syntax(format!("invalid number `{text}`: {err}")))?
    };
    Ok((token, pos - start))
}

fn lex_ident(chars: &[char], start: usize) -> (Token, usize) {
    let mut pos = start;
    while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
        pos += 1;
    }
    let text: String = chars[start..pos].iter().collect();
    (Token::Ident(text), pos - start)
}

#[cfg(test)]
mod tests {
    use super::{tokenize, Token};

    #[test]
    fn tokenizes_comparison_operators() {
        let tokens = tokenize("age >= 30 and name != 'Bo'").expect("tokens");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("age".to_string()),
                Token::Ge,
                Token::Integer(30),
                Token::Ident("and".to_string()),
                Token::Ident("name".to_string()),
                Token::Ne,
                Token::Text("Bo".to_string()),
            ]
        );
    }

    #[test]
    fn unescapes_doubled_quotes_and_reads_negative_decimals() {
        let tokens = tokenize("'O''Brien' -2.5").expect("tokens");
        assert_eq!(
            tokens,
            vec![Token::Text("O'Brien".to_string()), Token::Decimal(-2.5)]
        );
    }

    #[test]
    fn rejects_unterminated_string_and_stray_characters() {
        assert!(tokenize("name = 'open").is_err());
        assert!(tokenize("employees; drop table employees").is_err());
    }
}

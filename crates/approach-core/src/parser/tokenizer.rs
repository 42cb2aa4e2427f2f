//! Command-line tokenizer with shell-like quoting.
//!
//! Splits a typed line into argument tokens: whitespace separates tokens,
//! double-quoted segments form a single token preserving internal
//! whitespace, and `\\` / `\"` escape a backslash or quote both inside and
//! outside quotes. Malformed input (an unterminated quote, a dangling
//! escape, text butted up against a closing quote) fails as a whole rather
//! than producing partial tokens.

use super::error::ParseError;

/// Splits a command line into argument tokens.
///
/// Guarantees: every returned token is non-empty, and an empty or
/// all-whitespace line produces an empty list.
///
/// # Errors
///
/// Returns [`ParseError::FailedToTokenizeCommandLine`] carrying the original
/// line when it cannot be tokenized.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut scanner = Scanner::new(line);
    let mut tokens = Vec::new();

    loop {
        scanner.skip_whitespace();
        let Some(first) = scanner.peek() else {
            break;
        };

        let token = if first == '"' {
            scanner.scan_quoted()
        } else {
            scanner.scan_bare()
        };
        match token {
            Some(token) => {
                // A quoted empty string produces no token.
                if !token.is_empty() {
                    tokens.push(token);
                }
            },
            None => {
                return Err(ParseError::FailedToTokenizeCommandLine(line.to_string()));
            },
        }
    }

    Ok(tokens)
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            chars: line.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.next();
        }
    }

    /// Resolves a backslash escape; only `\\` and `\"` are defined.
    fn scan_escape(&mut self) -> Option<char> {
        match self.next() {
            Some(c @ ('\\' | '"')) => Some(c),
            _ => None,
        }
    }

    /// Scans a double-quoted token. The closing quote must be followed by
    /// whitespace or end of line.
    fn scan_quoted(&mut self) -> Option<String> {
        self.next(); // opening quote
        let mut token = String::new();
        loop {
            match self.next()? {
                '"' => break,
                '\\' => token.push(self.scan_escape()?),
                c => token.push(c),
            }
        }
        match self.peek() {
            None => Some(token),
            Some(c) if c.is_whitespace() => Some(token),
            Some(_) => None,
        }
    }

    /// Scans an unquoted token up to the next whitespace. A bare quote in
    /// the middle of a token is malformed.
    fn scan_bare(&mut self) -> Option<String> {
        let mut token = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                break;
            }
            self.next();
            match c {
                '"' => return None,
                '\\' => token.push(self.scan_escape()?),
                _ => token.push(c),
            }
        }
        Some(token)
    }
}

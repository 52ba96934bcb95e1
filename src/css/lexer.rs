//! CSS Selector Lexer
//!
//! Splits a selector group into identifiers, hashes, strings, numbers,
//! whitespace runs and single-character delimiters.

/// CSS token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier, escapes resolved (`div`, `-n`, `first-child`)
    Ident(String),
    /// `#name`, without the hash
    Hash(String),
    /// Quoted string, quotes removed
    Str(String),
    /// Number as written (`2`, `+1`, `.5`)
    Number(String),
    /// Any other single character (`.`, `[`, `>`, `,` ...)
    Delim(char),
    Whitespace,
    Eof,
}

impl Token {
    pub fn is_delim(&self, c: char) -> bool {
        matches!(self, Token::Delim(d) if *d == c)
    }
}

/// CSS lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, String> {
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        if c.is_whitespace() {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            return Ok(Token::Whitespace);
        }

        if self.at_identifier_start() {
            return self.read_name().map(Token::Ident);
        }

        match c {
            '#' if self.peek_at(1).is_some_and(|n| is_name_char(n) || n == '\\') => {
                self.bump();
                self.read_name().map(Token::Hash)
            }
            '"' | '\'' => self.read_string(c),
            _ if self.at_number_start() => Ok(self.read_number()),
            '/' if self.peek_at(1) == Some('*') => {
                self.skip_comment()?;
                self.next_token()
            }
            _ => {
                self.bump();
                Ok(Token::Delim(c))
            }
        }
    }

    /// `-`? followed by a name start or an escape
    fn at_identifier_start(&self) -> bool {
        let (first, second) = (self.peek(), self.peek_at(1));
        let starts = |c: Option<char>| c.is_some_and(|c| is_name_start_char(c) || c == '\\');
        match first {
            Some('-') => starts(second),
            _ => starts(first),
        }
    }

    fn at_number_start(&self) -> bool {
        let mut chars = self.remaining().chars();
        let mut c = chars.next();
        if matches!(c, Some('+' | '-')) {
            c = chars.next();
        }
        match c {
            Some(d) if d.is_ascii_digit() => true,
            Some('.') => chars.next().is_some_and(|d| d.is_ascii_digit()),
            _ => false,
        }
    }

    fn read_name(&mut self) -> Result<String, String> {
        let mut name = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.bump();
                    name.push(self.read_escape()?);
                }
                Some(c) if is_name_char(c) => {
                    name.push(c);
                    self.bump();
                }
                _ => break,
            }
        }
        Ok(name)
    }

    /// After a backslash: up to six hex digits (one trailing space eaten)
    /// or one literal character
    fn read_escape(&mut self) -> Result<char, String> {
        let hex: String = self
            .remaining()
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .take(6)
            .collect();
        if hex.is_empty() {
            return self
                .bump()
                .ok_or_else(|| "Incomplete escape sequence at end of selector".to_string());
        }
        self.pos += hex.len();
        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let code = u32::from_str_radix(&hex, 16).map_err(|e| e.to_string())?;
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, String> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(Token::Str(value)),
                Some('\\') => match self.peek() {
                    // Escaped newline is a line continuation
                    Some('\n') => {
                        self.bump();
                    }
                    Some(_) => value.push(self.read_escape()?),
                    None => break,
                },
                Some(c) => value.push(c),
                None => break,
            }
        }
        Err(format!("Unclosed string starting at offset {}", start))
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        Token::Number(self.input[start..self.pos].to_string())
    }

    fn skip_comment(&mut self) -> Result<(), String> {
        match self.remaining()[2..].find("*/") {
            Some(end) => {
                self.pos += end + 4;
                Ok(())
            }
            None => Err("Unclosed comment in selector".to_string()),
        }
    }

    /// Tokenize entire input (Eof not included)
    pub fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        loop {
            match self.next_token()? {
                Token::Eof => return Ok(tokens),
                token => tokens.push(token),
            }
        }
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || c.is_ascii_digit() || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Token {
        Token::Ident(s.to_string())
    }

    #[test]
    fn test_compound_selector() {
        let tokens = Lexer::new("div.item#main > a[href^='x']").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                ident("div"),
                Token::Delim('.'),
                ident("item"),
                Token::Hash("main".to_string()),
                Token::Whitespace,
                Token::Delim('>'),
                Token::Whitespace,
                ident("a"),
                Token::Delim('['),
                ident("href"),
                Token::Delim('^'),
                Token::Delim('='),
                Token::Str("x".to_string()),
                Token::Delim(']'),
            ]
        );
    }

    #[test]
    fn test_series_tokens() {
        let tokens = Lexer::new("2n+1").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![Token::Number("2".into()), ident("n"), Token::Number("+1".into())]
        );
        let tokens = Lexer::new("-n+3").tokenize().unwrap();
        assert_eq!(tokens, vec![ident("-n"), Token::Number("+3".into())]);
    }

    #[test]
    fn test_combinator_plus_is_delim() {
        let tokens = Lexer::new("a + b").tokenize().unwrap();
        assert_eq!(tokens[2], Token::Delim('+'));
    }

    #[test]
    fn test_escapes_and_strings() {
        let tokens = Lexer::new(r#"a\.b "it\"s" #x\31 "#).tokenize().unwrap();
        assert_eq!(tokens[0], ident("a.b"));
        assert_eq!(tokens[2], Token::Str("it\"s".to_string()));
        assert_eq!(tokens[4], Token::Hash("x1".to_string()));
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("a[title='open").tokenize().is_err());
        assert!(Lexer::new("a /* never closed").tokenize().is_err());
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = Lexer::new("a/* c */b").tokenize().unwrap();
        assert_eq!(tokens, vec![ident("a"), ident("b")]);
    }
}

//! XPath Lexer
//!
//! Tokenizes XPath expressions into tokens.
//!
//! `and`, `or`, `mod` and `div` are operators only when an operand precedes
//! them; otherwise they are plain names (so `descendant::div` works).

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Star,        // *
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,         // and
    Or,          // or
    Mod,         // mod
    Div,         // div

    // Brackets
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Literals
    Number(f64),
    String(String),

    // Names
    Name(String),     // NCName
    NameTest(String), // prefix:* or prefix:local
    NodeType(String), // node(), text(), comment(), processing-instruction()

    // Axis
    Axis(String), // child::, descendant::, etc.

    DoubleColon, // ::
    Comma,       // ,

    /// Character sequence that is not part of the grammar
    Invalid(String),

    // End of input
    Eof,
}

impl Token {
    /// Whether this token can end an operand
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Name(_)
                | Token::NameTest(_)
                | Token::Number(_)
                | Token::String(_)
                | Token::RightParen
                | Token::RightBracket
                | Token::Dot
                | Token::DoubleDot
                | Token::Star
        )
    }
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    after_operand: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            after_operand: false,
        }
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

    /// Advance by n bytes
    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        let token = self.scan_token();
        self.after_operand = token.ends_operand();
        token
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance(1);
        token
    }

    /// One-char token, or two-char token when followed by `second`
    fn pair(&mut self, second: char, short: Token, long: Token) -> Token {
        self.advance(1);
        if self.peek() == Some(second) {
            self.advance(1);
            long
        } else {
            short
        }
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Token::Eof;
        };

        match c {
            '/' => self.pair('/', Token::Slash, Token::DoubleSlash),
            '.' => {
                if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.read_number()
                } else {
                    self.pair('.', Token::Dot, Token::DoubleDot)
                }
            }
            '@' => self.single(Token::At),
            '|' => self.single(Token::Pipe),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '=' => self.single(Token::Eq),
            '!' => self.pair('=', Token::Invalid("!".to_string()), Token::NotEq),
            '<' => self.pair('=', Token::Lt, Token::LtEq),
            '>' => self.pair('=', Token::Gt, Token::GtEq),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            ':' => self.pair(':', Token::Invalid(":".to_string()), Token::DoubleColon),
            '"' | '\'' => self.read_string(c),
            '0'..='9' => self.read_number(),
            _ if is_name_start_char(c) => self.read_name_or_keyword(),
            _ => {
                self.advance(c.len_utf8());
                Token::Invalid(c.to_string())
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }

        if self.peek() == Some('.') {
            self.advance(1);
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }

        let num_str = &self.input[start..self.pos];
        Token::Number(num_str.parse().unwrap_or(f64::NAN))
    }

    fn read_string(&mut self, quote: char) -> Token {
        self.advance(1);
        let start = self.pos;

        match self.remaining().find(quote) {
            Some(len) => {
                let value = self.input[start..start + len].to_string();
                self.advance(len + 1);
                Token::String(value)
            }
            None => {
                self.pos = self.input.len();
                Token::Invalid(format!("unterminated string {}{}", quote, &self.input[start..]))
            }
        }
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn read_name_or_keyword(&mut self) -> Token {
        let name = self.read_ncname();

        if self.after_operand {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        // Lookahead must not consume whitespace that belongs to the next token
        let name_end = self.pos;
        self.skip_whitespace();

        if self.remaining().starts_with("::") {
            return Token::Axis(name.to_string());
        }

        if self.peek() == Some('(') {
            return match name {
                "node" | "text" | "comment" | "processing-instruction" => {
                    Token::NodeType(name.to_string())
                }
                _ => Token::Name(name.to_string()),
            };
        }

        self.pos = name_end;

        // prefix:local or prefix:*
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            if self.peek_at(1) == Some('*') {
                self.advance(2);
                return Token::NameTest(format!("{}:*", name));
            }
            if self.peek_at(1).is_some_and(is_name_start_char) {
                self.advance(1);
                let local = self.read_ncname();
                return Token::NameTest(format!("{}:{}", name, local));
            }
        }

        Token::Name(name.to_string())
    }

    /// Tokenize entire input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        tokens
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Token {
        Token::Name(s.to_string())
    }

    #[test]
    fn test_simple_path() {
        let mut lexer = Lexer::new("/root/child");
        assert_eq!(lexer.next_token(), Token::Slash);
        assert_eq!(lexer.next_token(), name("root"));
        assert_eq!(lexer.next_token(), Token::Slash);
        assert_eq!(lexer.next_token(), name("child"));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_predicate() {
        let tokens = Lexer::new("item[@id='test']").tokenize();
        assert_eq!(
            tokens,
            vec![
                name("item"),
                Token::LeftBracket,
                Token::At,
                name("id"),
                Token::Eq,
                Token::String("test".to_string()),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_axis() {
        let mut lexer = Lexer::new("child::element");
        assert_eq!(lexer.next_token(), Token::Axis("child".to_string()));
        assert_eq!(lexer.next_token(), Token::DoubleColon);
        assert_eq!(lexer.next_token(), name("element"));
    }

    #[test]
    fn test_keywords_as_names() {
        let tokens = Lexer::new("descendant-or-self::div/div[@a and 4 div 2]").tokenize();
        assert_eq!(tokens[2], name("div"));
        assert_eq!(tokens[4], name("div"));
        assert_eq!(tokens[8], Token::And);
        assert_eq!(tokens[10], Token::Div);
    }

    #[test]
    fn test_node_type_and_function() {
        let tokens = Lexer::new("text() | contains(., 'x')").tokenize();
        assert_eq!(tokens[0], Token::NodeType("text".to_string()));
        assert_eq!(tokens[3], Token::Pipe);
        assert_eq!(tokens[4], name("contains"));
    }

    #[test]
    fn test_qualified_names() {
        let tokens = Lexer::new("svg:rect | svg:*").tokenize();
        assert_eq!(tokens[0], Token::NameTest("svg:rect".to_string()));
        assert_eq!(tokens[2], Token::NameTest("svg:*".to_string()));
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("1 + .5 - 2.25").tokenize();
        assert_eq!(
            tokens,
            vec![Token::Number(1.0), Token::Plus, Token::Number(0.5), Token::Minus, Token::Number(2.25)]
        );
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(matches!(Lexer::new("'open").next_token(), Token::Invalid(_)));
        assert!(matches!(Lexer::new("!x").next_token(), Token::Invalid(_)));
    }
}

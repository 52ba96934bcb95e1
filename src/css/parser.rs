//! CSS Selector Parser
//!
//! Recursive descent over the token stream, producing one tree per
//! selector in the group. Compound selectors nest left to right: `a.b#c`
//! is `Hash(Class(Element(a), b), c)`.

use super::lexer::{Lexer, Token};

/// Parsed selector node
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Type or universal selector, optional namespace prefix (`ns|el`)
    Element {
        namespace: Option<String>,
        element: Option<String>,
    },
    Class(Box<Selector>, String),
    Hash(Box<Selector>, String),
    Attribute {
        selector: Box<Selector>,
        namespace: Option<String>,
        name: String,
        operator: AttributeOp,
        value: String,
    },
    /// `:name`
    Pseudo(Box<Selector>, String),
    /// `:name(args)`
    Function(Box<Selector>, String, Vec<Token>),
    /// `:not(simple)`
    Negation(Box<Selector>, Box<Selector>),
    Combined(Box<Selector>, Combinator, Box<Selector>),
}

/// Attribute selector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
    NotEquals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

/// One selector of a group, with its trailing pseudo-element if any
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSelector {
    pub tree: Selector,
    pub pseudo_element: Option<String>,
}

/// Pseudo-elements written with a single colon
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["first-line", "first-letter", "before", "after"];

/// CSS selector parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, String> {
        Ok(Parser {
            tokens: Lexer::new(input).tokenize()?,
            pos: 0,
        })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Token::Whitespace) {
            self.pos += 1;
        }
    }

    fn next_ident(&mut self) -> Result<String, String> {
        match self.next() {
            Token::Ident(name) => Ok(name),
            other => Err(format!("Expected identifier, got {:?}", other)),
        }
    }

    /// Identifier, or None for `*`
    fn next_ident_or_star(&mut self) -> Result<Option<String>, String> {
        match self.next() {
            Token::Ident(name) => Ok(Some(name)),
            Token::Delim('*') => Ok(None),
            other => Err(format!("Expected identifier or \"*\", got {:?}", other)),
        }
    }

    /// Parse a comma-separated selector group
    pub fn parse_group(&mut self) -> Result<Vec<ParsedSelector>, String> {
        let mut selectors = Vec::new();
        loop {
            selectors.push(self.parse_selector()?);
            self.skip_whitespace();
            match self.peek() {
                Token::Delim(',') => {
                    self.pos += 1;
                }
                Token::Eof => return Ok(selectors),
                other => return Err(format!("Unexpected token {:?}", other)),
            }
        }
    }

    fn parse_selector(&mut self) -> Result<ParsedSelector, String> {
        let (mut tree, mut pseudo_element) = self.parse_simple_selector(false)?;

        loop {
            self.skip_whitespace();
            let combinator = match self.peek() {
                Token::Eof | Token::Delim(',') => break,
                Token::Delim('>') => Combinator::Child,
                Token::Delim('+') => Combinator::Adjacent,
                Token::Delim('~') => Combinator::Sibling,
                _ => Combinator::Descendant,
            };
            if let Some(pseudo) = &pseudo_element {
                return Err(format!("Got pseudo-element ::{} not at the end of a selector", pseudo));
            }
            if combinator != Combinator::Descendant {
                self.pos += 1;
            }

            let (next, next_pseudo) = self.parse_simple_selector(false)?;
            tree = Selector::Combined(Box::new(tree), combinator, Box::new(next));
            pseudo_element = next_pseudo;
        }

        Ok(ParsedSelector {
            tree,
            pseudo_element,
        })
    }

    fn parse_simple_selector(
        &mut self,
        inside_negation: bool,
    ) -> Result<(Selector, Option<String>), String> {
        self.skip_whitespace();
        let start = self.pos;
        let mut result = self.parse_element()?;
        let mut pseudo_element = None;

        loop {
            let peek = self.peek();
            let at_end = matches!(peek, Token::Whitespace | Token::Eof)
                || matches!(peek, Token::Delim(',' | '+' | '>' | '~'))
                || (inside_negation && peek.is_delim(')'));
            if at_end {
                break;
            }
            if let Some(pseudo) = &pseudo_element {
                return Err(format!("Got pseudo-element ::{} not at the end of a selector", pseudo));
            }

            match self.next() {
                Token::Hash(id) => result = Selector::Hash(Box::new(result), id),
                Token::Delim('.') => {
                    let class = self.next_ident()?;
                    result = Selector::Class(Box::new(result), class);
                }
                Token::Delim('[') => result = self.parse_attribute(result)?,
                Token::Delim(':') => {
                    if self.peek().is_delim(':') {
                        self.pos += 1;
                        pseudo_element = Some(self.next_ident()?);
                        continue;
                    }
                    let ident = self.next_ident()?;
                    if LEGACY_PSEUDO_ELEMENTS.contains(&ident.to_ascii_lowercase().as_str()) {
                        pseudo_element = Some(ident);
                        continue;
                    }
                    if !self.peek().is_delim('(') {
                        result = Selector::Pseudo(Box::new(result), ident);
                        continue;
                    }
                    self.pos += 1;
                    self.skip_whitespace();

                    if ident.eq_ignore_ascii_case("not") {
                        if inside_negation {
                            return Err("Got nested :not()".to_string());
                        }
                        let (argument, argument_pseudo) = self.parse_simple_selector(true)?;
                        if argument_pseudo.is_some() {
                            return Err("Got pseudo-element inside :not()".to_string());
                        }
                        let close = self.next();
                        if !close.is_delim(')') {
                            return Err(format!("Expected \")\", got {:?}", close));
                        }
                        result = Selector::Negation(Box::new(result), Box::new(argument));
                    } else {
                        let arguments = self.parse_function_arguments()?;
                        result = Selector::Function(Box::new(result), ident, arguments);
                    }
                }
                other => return Err(format!("Unexpected token {:?}", other)),
            }
        }

        if self.pos == start {
            return Err(format!("Expected selector, got {:?}", self.peek()));
        }

        Ok((result, pseudo_element))
    }

    fn parse_element(&mut self) -> Result<Selector, String> {
        let (namespace, element) = match self.peek() {
            Token::Ident(_) | Token::Delim('*') => {
                let first = self.next_ident_or_star()?;
                if self.peek().is_delim('|') {
                    self.pos += 1;
                    (first, self.next_ident_or_star()?)
                } else {
                    (None, first)
                }
            }
            _ => (None, None),
        };
        Ok(Selector::Element { namespace, element })
    }

    fn parse_attribute(&mut self, selector: Selector) -> Result<Selector, String> {
        self.skip_whitespace();
        let mut name = self.next_ident_or_star()?;
        let mut namespace = None;
        let mut operator = None;

        if self.peek().is_delim('|') {
            self.pos += 1;
            if self.peek().is_delim('=') {
                self.pos += 1;
                operator = Some(AttributeOp::DashMatch);
            } else {
                namespace = name;
                name = Some(self.next_ident()?);
            }
        }

        let name = name.ok_or_else(|| "Expected attribute name, got \"*\"".to_string())?;

        let operator = match operator {
            Some(op) => op,
            None => {
                self.skip_whitespace();
                match self.next() {
                    Token::Delim(']') => {
                        return Ok(Selector::Attribute {
                            selector: Box::new(selector),
                            namespace,
                            name,
                            operator: AttributeOp::Exists,
                            value: String::new(),
                        })
                    }
                    Token::Delim('=') => AttributeOp::Equals,
                    Token::Delim(c) if self.peek().is_delim('=') => {
                        let op = match c {
                            '^' => AttributeOp::Prefix,
                            '$' => AttributeOp::Suffix,
                            '*' => AttributeOp::Substring,
                            '~' => AttributeOp::Includes,
                            '|' => AttributeOp::DashMatch,
                            '!' => AttributeOp::NotEquals,
                            _ => return Err(format!("Operator expected, got \"{}\"", c)),
                        };
                        self.pos += 1;
                        op
                    }
                    other => return Err(format!("Operator expected, got {:?}", other)),
                }
            }
        };

        self.skip_whitespace();
        let value = match self.next() {
            Token::Ident(v) | Token::Str(v) | Token::Number(v) => v,
            other => return Err(format!("Expected string or identifier, got {:?}", other)),
        };
        self.skip_whitespace();
        let close = self.next();
        if !close.is_delim(']') {
            return Err(format!("Expected \"]\", got {:?}", close));
        }

        Ok(Selector::Attribute {
            selector: Box::new(selector),
            namespace,
            name,
            operator,
            value,
        })
    }

    fn parse_function_arguments(&mut self) -> Result<Vec<Token>, String> {
        let mut arguments = Vec::new();
        loop {
            self.skip_whitespace();
            match self.next() {
                Token::Delim(')') => break,
                token @ (Token::Ident(_) | Token::Str(_) | Token::Number(_)) => arguments.push(token),
                token @ Token::Delim('+' | '-') => arguments.push(token),
                other => return Err(format!("Expected an argument, got {:?}", other)),
            }
        }
        if arguments.is_empty() {
            return Err("Expected at least one argument".to_string());
        }
        Ok(arguments)
    }
}

/// Parse a selector group
pub fn parse(input: &str) -> Result<Vec<ParsedSelector>, String> {
    Parser::new(input)?.parse_group()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str) -> Selector {
        Selector::Element {
            namespace: None,
            element: Some(name.to_string()),
        }
    }

    fn single(input: &str) -> Selector {
        let mut group = parse(input).unwrap();
        assert_eq!(group.len(), 1);
        group.remove(0).tree
    }

    #[test]
    fn test_compound() {
        let tree = single("a.b#c");
        assert_eq!(
            tree,
            Selector::Hash(
                Box::new(Selector::Class(Box::new(element("a")), "b".into())),
                "c".into()
            )
        );
    }

    #[test]
    fn test_combinators() {
        let tree = single("ul > li + li ~ p span");
        let Selector::Combined(left, Combinator::Descendant, right) = tree else {
            panic!("expected descendant combinator at the top");
        };
        assert_eq!(*right, element("span"));
        assert!(matches!(*left, Selector::Combined(_, Combinator::Sibling, _)));
    }

    #[test]
    fn test_group() {
        let group = parse("div, text ,p").unwrap();
        assert_eq!(group.len(), 3);
        assert_eq!(group[1].tree, element("text"));
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(
            single("div|text"),
            Selector::Element {
                namespace: Some("div".into()),
                element: Some("text".into())
            }
        );
        match single("div[foo|text]") {
            Selector::Attribute { namespace, name, operator, .. } => {
                assert_eq!(namespace.as_deref(), Some("foo"));
                assert_eq!(name, "text");
                assert_eq!(operator, AttributeOp::Exists);
            }
            other => panic!("unexpected {:?}", other),
        }
        match single("[lang|=en]") {
            Selector::Attribute { namespace, operator, value, .. } => {
                assert_eq!(namespace, None);
                assert_eq!(operator, AttributeOp::DashMatch);
                assert_eq!(value, "en");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_attribute_operators() {
        for (input, expected) in [
            ("[a=b]", AttributeOp::Equals),
            ("[a~='b']", AttributeOp::Includes),
            ("[a^=b]", AttributeOp::Prefix),
            ("[a$=b]", AttributeOp::Suffix),
            ("[a *= \"b\"]", AttributeOp::Substring),
            ("[a!=b]", AttributeOp::NotEquals),
            ("[a|=b]", AttributeOp::DashMatch),
        ] {
            match single(input) {
                Selector::Attribute { operator, .. } => assert_eq!(operator, expected, "{}", input),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_pseudo_and_functions() {
        assert!(matches!(single("li:first-child"), Selector::Pseudo(_, name) if name == "first-child"));
        match single("li:nth-child(2n + 1)") {
            Selector::Function(_, name, args) => {
                assert_eq!(name, "nth-child");
                assert_eq!(args.len(), 4);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(single("p:not(.x)"), Selector::Negation(..)));
    }

    #[test]
    fn test_pseudo_elements() {
        let group = parse("p::before").unwrap();
        assert_eq!(group[0].pseudo_element.as_deref(), Some("before"));
        let group = parse("p:after").unwrap();
        assert_eq!(group[0].pseudo_element.as_deref(), Some("after"));
        assert!(parse("p::before span").is_err());
    }

    #[test]
    fn test_errors() {
        for input in ["", "a,", "a[", "a[b=]", "[*]", ":not(:not(a))", "a:nth-child()", "a >", "a)"] {
            assert!(parse(input).is_err(), "expected error for {:?}", input);
        }
    }
}

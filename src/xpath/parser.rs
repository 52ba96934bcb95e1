//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions.

use super::lexer::{Lexer, Token};

/// XPath expression AST node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Current context (.)
    Context,
    /// Parent (..)
    Parent,
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Path expression (expr/step)
    Path(Box<Expr>, Box<Step>),
    /// Filter expression with predicate
    Filter(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    /// Literal number
    Number(f64),
    /// Literal string
    String(String),
    /// Location step relative to the context node
    Step(Box<Step>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    const TIGHTEST: u8 = 5;

    fn from_token(token: &Token) -> Option<Self> {
        Some(match token {
            Token::Or => BinaryOp::Or,
            Token::And => BinaryOp::And,
            Token::Eq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::LtEq => BinaryOp::LtEq,
            Token::Gt => BinaryOp::Gt,
            Token::GtEq => BinaryOp::GtEq,
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Div => BinaryOp::Div,
            Token::Mod => BinaryOp::Mod,
            _ => return None,
        })
    }

    /// Binding strength, 0 (`or`) binds loosest
    fn level(self) -> u8 {
        match self {
            BinaryOp::Or => 0,
            BinaryOp::And => 1,
            BinaryOp::Eq | BinaryOp::NotEq => 2,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => Self::TIGHTEST,
        }
    }
}

/// Location step in a path
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    /// `descendant-or-self::node()`, the expansion of `//`
    fn descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            node_test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }
}

/// Node test in a location step
#[derive(Debug, Clone)]
pub enum NodeTest {
    /// Matches any element (*)
    Any,
    /// Matches elements with name
    Name(String),
    /// Matches prefix:localname
    QName(String, String),
    /// Matches prefix:*
    PrefixWildcard(String),
    /// node() - matches any node
    Node,
    /// text() - matches text nodes
    Text,
    /// comment() - matches comments
    Comment,
    /// processing-instruction() - matches PIs
    ProcessingInstruction(Option<String>),
}

/// XPath parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            peeked: None,
        }
    }

    /// Parse a complete XPath expression
    pub fn parse(&mut self) -> Result<Expr, String> {
        let expr = self.parse_expr()?;
        match &self.current {
            Token::Eof => Ok(expr),
            other => Err(format!("Unexpected token after expression: {:?}", other)),
        }
    }

    fn advance(&mut self) {
        self.current = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token(),
        };
    }

    fn peek(&mut self) -> &Token {
        self.peeked.get_or_insert_with(|| self.lexer.next_token())
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), String> {
        if self.current == expected {
            self.advance();
            Ok(())
        } else {
            Err(format!("Expected {}, got {:?}", what, self.current))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary(0)
    }

    /// Left-associative binary operators at `level` and tighter
    fn parse_binary(&mut self, level: u8) -> Result<Expr, String> {
        if level > BinaryOp::TIGHTEST {
            return self.parse_unary_expr();
        }

        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = BinaryOp::from_token(&self.current).filter(|op| op.level() == level) {
            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if matches!(self.current, Token::Minus) {
            self.advance();
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;

        while matches!(self.current, Token::Pipe) {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        let expr = match &self.current {
            Token::Slash => {
                self.advance();
                if matches!(
                    self.current,
                    Token::Eof | Token::RightBracket | Token::RightParen | Token::Pipe | Token::Comma
                ) {
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance();
                let step = self.parse_step()?;
                Expr::Path(
                    Box::new(Expr::Path(Box::new(Expr::Root), Box::new(Step::descendant_or_self()))),
                    Box::new(step),
                )
            }
            _ => self.parse_primary_expr()?,
        };

        self.parse_path_continuation(expr)
    }

    /// Trailing predicates and `/step`, `//step` after a primary or root path
    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, String> {
        loop {
            match &self.current {
                Token::LeftBracket => {
                    self.advance();
                    let pred = self.parse_expr()?;
                    self.expect(Token::RightBracket, "]")?;
                    expr = Expr::Filter(Box::new(expr), Box::new(pred));
                }
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(
                        Box::new(Expr::Path(Box::new(expr), Box::new(Step::descendant_or_self()))),
                        Box::new(step),
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        if let Token::Name(name) = &self.current {
            let name = name.clone();
            if matches!(self.peek(), Token::LeftParen) {
                self.advance();
                self.advance(); // Skip (
                let args = self.parse_function_args()?;
                return Ok(Expr::Function(name, args));
            }
        }

        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::String(s))
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen, ")")?;
                Ok(expr)
            }
            Token::Dot => {
                self.advance();
                Ok(Expr::Context)
            }
            Token::DoubleDot => {
                self.advance();
                Ok(Expr::Parent)
            }
            Token::Name(_)
            | Token::NameTest(_)
            | Token::NodeType(_)
            | Token::Star
            | Token::At
            | Token::Axis(_) => {
                let step = self.parse_step()?;
                Ok(Expr::Step(Box::new(step)))
            }
            Token::Eof => Err("Unexpected end of expression".to_string()),
            other => Err(format!("Unexpected token: {:?}", other)),
        }
    }

    /// Parse a location step: optional axis, node test, predicates
    fn parse_step(&mut self) -> Result<Step, String> {
        match &self.current {
            Token::Dot => {
                self.advance();
                return Ok(Step {
                    axis: Axis::Self_,
                    node_test: NodeTest::Node,
                    predicates: Vec::new(),
                });
            }
            Token::DoubleDot => {
                self.advance();
                return Ok(Step {
                    axis: Axis::Parent,
                    node_test: NodeTest::Node,
                    predicates: Vec::new(),
                });
            }
            _ => {}
        }

        let mut axis = Axis::Child;
        if matches!(self.current, Token::At) {
            axis = Axis::Attribute;
            self.advance();
        } else if let Token::Axis(axis_name) = &self.current {
            axis = Axis::from_name(axis_name).ok_or_else(|| format!("Unknown axis: {}", axis_name))?;
            self.advance();
            self.expect(Token::DoubleColon, ":: after axis")?;
        }

        let node_test = match &self.current {
            Token::Star => {
                self.advance();
                NodeTest::Any
            }
            Token::Name(name) => {
                let name = name.clone();
                self.advance();
                NodeTest::Name(name)
            }
            Token::NameTest(qname) => {
                let qname = qname.clone();
                self.advance();
                match qname.split_once(':') {
                    Some((prefix, "*")) => NodeTest::PrefixWildcard(prefix.to_string()),
                    Some((prefix, local)) => NodeTest::QName(prefix.to_string(), local.to_string()),
                    None => NodeTest::Name(qname),
                }
            }
            Token::NodeType(name) => {
                let name = name.clone();
                self.advance();
                self.expect(Token::LeftParen, "(")?;
                let arg = match &self.current {
                    Token::String(s) => {
                        let s = s.clone();
                        self.advance();
                        Some(s)
                    }
                    _ => None,
                };
                self.expect(Token::RightParen, ")")?;

                match name.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    "processing-instruction" => NodeTest::ProcessingInstruction(arg),
                    _ => return Err(format!("Unknown node type: {}", name)),
                }
            }
            other => return Err(format!("Expected node test, got {:?}", other)),
        };

        let mut predicates = Vec::new();
        while matches!(self.current, Token::LeftBracket) {
            self.advance();
            predicates.push(self.parse_expr()?);
            self.expect(Token::RightBracket, "]")?;
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();

        if !matches!(self.current, Token::RightParen) {
            args.push(self.parse_expr()?);

            while matches!(self.current, Token::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }

        self.expect(Token::RightParen, ")")?;
        Ok(args)
    }
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, String> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_step_predicates_stay_on_step() {
        let expr = parse("item[@id='test']").unwrap();
        match expr {
            Expr::Step(step) => assert_eq!(step.predicates.len(), 1),
            other => panic!("expected step, got {:?}", other),
        }
    }

    #[test]
    fn test_descendant() {
        let expr = parse("//item").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_function() {
        let expr = parse("count(//item)").unwrap();
        assert!(matches!(expr, Expr::Function(name, _) if name == "count"));
    }

    #[test]
    fn test_translated_selector_shapes() {
        for query in [
            "descendant-or-self::div/descendant-or-self::*/p",
            "descendant-or-self::*[@class and contains(concat(' ', normalize-space(@class), ' '), ' a ')]",
            "descendant-or-self::h1/following-sibling::*[(name() = 'p') and (position() = 1)]",
            "descendant-or-self::div | descendant-or-self::text()",
            "descendant-or-self::*/*[name() = 'li' and (position() = last())]",
            "descendant-or-self::a[@href and substring(@href, string-length(@href)-3) = '.pdf']",
        ] {
            assert!(parse(query).is_ok(), "failed to parse {}", query);
        }
    }

    #[test]
    fn test_operator_precedence() {
        match parse("1 + 2 * 3").unwrap() {
            Expr::Binary(left, BinaryOp::Add, right) => {
                assert!(matches!(*left, Expr::Number(n) if n == 1.0));
                assert!(matches!(*right, Expr::Binary(_, BinaryOp::Mul, _)));
            }
            other => panic!("expected addition, got {:?}", other),
        }

        match parse("1 or 2 and 3 = 4").unwrap() {
            Expr::Binary(_, BinaryOp::Or, right) => match *right {
                Expr::Binary(_, BinaryOp::And, inner) => {
                    assert!(matches!(*inner, Expr::Binary(_, BinaryOp::Eq, _)))
                }
                other => panic!("expected and, got {:?}", other),
            },
            other => panic!("expected or, got {:?}", other),
        }

        match parse("8 - 2 - 1").unwrap() {
            Expr::Binary(left, BinaryOp::Sub, _) => {
                assert!(matches!(*left, Expr::Binary(_, BinaryOp::Sub, _)))
            }
            other => panic!("expected subtraction, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse("descendant-or-self::div:text()").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("").is_err());
        assert!(parse("a[").is_err());
    }
}

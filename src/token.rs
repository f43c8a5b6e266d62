use std::fmt;
use strum_macros::{Display, EnumIter};

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TokenType {
    // Single-character tokens.
    #[strum(to_string = "(")] LeftParen,
    #[strum(to_string = ")")] RightParen,
    #[strum(to_string = "{")] LeftBrace,
    #[strum(to_string = "}")] RightBrace,
    #[strum(to_string = ",")] Comma,
    #[strum(to_string = ".")] Dot,
    #[strum(to_string = "-")] Minus,
    #[strum(to_string = "+")] Plus,
    #[strum(to_string = ";")] Semicolon,
    #[strum(to_string = "/")] Slash,
    #[strum(to_string = "*")] Star,

    // One or two character tokens.
    #[strum(to_string = "!")] Bang,
    #[strum(to_string = "!=")] BangEqual,
    #[strum(to_string = "=")] Equal,
    #[strum(to_string = "==")] EqualEqual,
    #[strum(to_string = ">")] Greater,
    #[strum(to_string = ">=")] GreaterEqual,
    #[strum(to_string = "<")] Less,
    #[strum(to_string = "<=")] LessEqual,

    // Literals.
    #[strum(to_string = "identifier")] Identifier,
    #[strum(to_string = "string")] String,
    #[strum(to_string = "number")] Number,

    // Keywords.
    #[strum(to_string = "and")] And,
    #[strum(to_string = "break")] Break,
    #[strum(to_string = "class")] Class,
    #[strum(to_string = "else")] Else,
    #[strum(to_string = "false")] False,
    #[strum(to_string = "fun")] Fun,
    #[strum(to_string = "for")] For,
    #[strum(to_string = "if")] If,
    #[strum(to_string = "nil")] Nil,
    #[strum(to_string = "or")] Or,
    #[strum(to_string = "print")] Print,
    #[strum(to_string = "return")] Return,
    #[strum(to_string = "super")] Super,
    #[strum(to_string = "this")] This,
    #[strum(to_string = "true")] True,
    #[strum(to_string = "var")] Var,
    #[strum(to_string = "while")] While,

    #[strum(to_string = "end of file")] Eof,
}

/// Literal payload carried by a token and by `Expr::Literal`.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Nil => write!(f, "nil"),
            Literal::Boolean(x) => write!(f, "{}", x),
            Literal::Number(x) => write!(f, "{}", x),
            Literal::String(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tokentype: TokenType,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(tokentype: TokenType, lexeme: &str, literal: Option<Literal>, line: usize) -> Token {
        Token {
            tokentype,
            lexeme: lexeme.to_string(),
            literal,
            line,
        }
    }
}

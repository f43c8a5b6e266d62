use crate::token::{Literal, Token, TokenType};
use phf::phf_map;
use std::error::Error;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: {}", self.line, self.message.as_str())
    }
}

impl Error for ScanError {}

// Note: current becomes self.iter.peek()?.0
struct Scanner<'a> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
    start: usize,
    line: usize,
}

/// Groups `source` into tokens terminated by `Eof`. Every malformed lexeme is
/// reported; the token list is only returned when there were none.
pub fn scan_tokens(source: &str) -> Result<Vec<Token>, Vec<ScanError>> {
    let mut scanner = Scanner {
        source,
        iter: source.char_indices().peekable(),
        start: 0,
        line: 1,
    };
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<ScanError> = Vec::new();

    while let Some((idx, _)) = scanner.iter.peek() {
        scanner.start = *idx;
        match scanner.scan_token() {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => (),
            Err(e) => errors.push(e),
        }
    }
    tokens.push(Token::new(TokenType::Eof, "", None, scanner.line));
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self) -> Result<Option<Token>, ScanError> {
        let c = match self.iter.next() {
            Some((_, c)) => c,
            None => return Ok(None),
        };
        let tokentype = match c {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            ',' => TokenType::Comma,
            '.' => TokenType::Dot,
            '-' => TokenType::Minus,
            '+' => TokenType::Plus,
            ';' => TokenType::Semicolon,
            '*' => TokenType::Star,
            '!' => self.either('=', TokenType::BangEqual, TokenType::Bang),
            '=' => self.either('=', TokenType::EqualEqual, TokenType::Equal),
            '<' => self.either('=', TokenType::LessEqual, TokenType::Less),
            '>' => self.either('=', TokenType::GreaterEqual, TokenType::Greater),
            '/' => {
                if self.next_if('/') {
                    while let Some((_, c)) = self.iter.peek() {
                        if *c == '\n' {
                            break;
                        }
                        self.iter.next();
                    }
                    return Ok(None);
                }
                TokenType::Slash
            }
            ' ' | '\r' | '\t' => return Ok(None),
            '\n' => {
                self.line += 1;
                return Ok(None);
            }
            '"' => return self.string().map(Some),
            '0'..='9' => return self.number().map(Some),
            'a'..='z' | 'A'..='Z' | '_' => return Ok(Some(self.identifier())),
            _ => {
                return Err(ScanError {
                    line: self.line,
                    message: format!("Unexpected character '{}'.", c),
                })
            }
        };
        Ok(Some(self.token(tokentype, None)))
    }
    fn current(&mut self) -> usize {
        match self.iter.peek() {
            None => self.source.len(),
            Some((idx, _)) => *idx,
        }
    }
    fn token(&mut self, tokentype: TokenType, literal: Option<Literal>) -> Token {
        let current = self.current();
        Token::new(
            tokentype,
            &self.source[self.start..current],
            literal,
            self.line,
        )
    }
    fn next_if(&mut self, expected: char) -> bool {
        if let Some((_, c)) = self.iter.peek() {
            if *c == expected {
                self.iter.next();
                return true;
            }
        }
        false
    }
    fn either(&mut self, expected: char, matched: TokenType, otherwise: TokenType) -> TokenType {
        if self.next_if(expected) {
            matched
        } else {
            otherwise
        }
    }
    fn consume_digits(&mut self) {
        while let Some((_, c)) = self.iter.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.iter.next();
        }
    }
    fn string(&mut self) -> Result<Token, ScanError> {
        let start_line = self.line;
        loop {
            match self.iter.next() {
                Some((_, '"')) => break,
                Some((_, '\n')) => self.line += 1,
                Some(_) => (),
                None => {
                    return Err(ScanError {
                        line: start_line,
                        message: "Unterminated string.".to_string(),
                    })
                }
            }
        }
        let current = self.current();
        let value = self.source[self.start + 1..current - 1].to_string();
        Ok(self.token(TokenType::String, Some(Literal::String(value))))
    }
    fn number(&mut self) -> Result<Token, ScanError> {
        self.consume_digits();

        // A '.' only belongs to the number when a digit follows it.
        if let Some((_, '.')) = self.iter.peek() {
            let mut lookahead = self.iter.clone();
            lookahead.next();
            if let Some((_, c)) = lookahead.peek() {
                if c.is_ascii_digit() {
                    self.iter.next();
                    self.consume_digits();
                }
            }
        }

        let current = self.current();
        let text = &self.source[self.start..current];
        let value: f64 = text.parse().map_err(|_| ScanError {
            line: self.line,
            message: format!("Invalid number literal '{}'.", text),
        })?;
        Ok(self.token(TokenType::Number, Some(Literal::Number(value))))
    }
    fn identifier(&mut self) -> Token {
        while let Some((_, c)) = self.iter.peek() {
            if !(c.is_ascii_alphanumeric() || *c == '_') {
                break;
            }
            self.iter.next();
        }
        let current = self.current();
        match KEYWORDS.get(&self.source[self.start..current]) {
            None => self.token(TokenType::Identifier, None),
            Some(TokenType::True) => self.token(TokenType::True, Some(Literal::Boolean(true))),
            Some(TokenType::False) => self.token(TokenType::False, Some(Literal::Boolean(false))),
            Some(TokenType::Nil) => self.token(TokenType::Nil, Some(Literal::Nil)),
            Some(x) => self.token(*x, None),
        }
    }
}

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and" => TokenType::And,
    "break" => TokenType::Break,
    "class" => TokenType::Class,
    "else" => TokenType::Else,
    "false" => TokenType::False,
    "for" => TokenType::For,
    "fun" => TokenType::Fun,
    "if" => TokenType::If,
    "nil" => TokenType::Nil,
    "or" => TokenType::Or,
    "print" => TokenType::Print,
    "return" => TokenType::Return,
    "super" => TokenType::Super,
    "this" => TokenType::This,
    "true" => TokenType::True,
    "var" => TokenType::Var,
    "while" => TokenType::While,
};

#[cfg(test)]
mod scanner_tests {
    use crate::scanner::{self, KEYWORDS};
    use crate::token::{Literal, TokenType};
    use strum::IntoEnumIterator;

    fn types(source: &str) -> Vec<TokenType> {
        scanner::scan_tokens(source)
            .unwrap()
            .iter()
            .map(|t| t.tokentype)
            .collect()
    }

    #[test]
    fn basic_scanner_test() {
        let tokens = scanner::scan_tokens("x = 2").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].tokentype, TokenType::Identifier);
        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[1].tokentype, TokenType::Equal);
        assert_eq!(tokens[2].tokentype, TokenType::Number);
        assert_eq!(tokens[2].literal, Some(Literal::Number(2.0)));
        assert_eq!(tokens[3].tokentype, TokenType::Eof);
    }

    #[test]
    fn number_parsing() {
        let tokens = scanner::scan_tokens("1+2.5 3.").unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Number(1.0)));
        assert_eq!(tokens[1].tokentype, TokenType::Plus);
        assert_eq!(tokens[2].literal, Some(Literal::Number(2.5)));
        // Trailing dot is not part of the literal.
        assert_eq!(tokens[3].literal, Some(Literal::Number(3.0)));
        assert_eq!(tokens[4].tokentype, TokenType::Dot);
    }

    #[test]
    fn two_character_operators() {
        assert_eq!(
            types("! != = == < <= > >= /"),
            vec![
                TokenType::Bang,
                TokenType::BangEqual,
                TokenType::Equal,
                TokenType::EqualEqual,
                TokenType::Less,
                TokenType::LessEqual,
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::Slash,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn every_keyword_scans_to_its_type() {
        for tokentype in TokenType::iter() {
            let text = tokentype.to_string();
            if KEYWORDS.get(text.as_str()).is_some() {
                assert_eq!(types(&text), vec![tokentype, TokenType::Eof]);
            }
        }
        assert_eq!(types("breaking"), vec![TokenType::Identifier, TokenType::Eof]);
    }

    #[test]
    fn comments_and_lines() {
        let tokens = scanner::scan_tokens("// nothing here\nprint \"a\nb\";\nnil").unwrap();
        assert_eq!(tokens[0].tokentype, TokenType::Print);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].literal, Some(Literal::String("a\nb".to_string())));
        assert_eq!(tokens[2].line, 3);
        assert_eq!(tokens[3].literal, Some(Literal::Nil));
        assert_eq!(tokens[3].line, 4);
    }

    #[test]
    fn reports_every_bad_character() {
        let errors = scanner::scan_tokens("var a = @;\n#").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 1);
        assert_eq!(errors[1].line, 2);
    }

    #[test]
    fn unterminated_string() {
        let errors = scanner::scan_tokens("print \"oops;").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Unterminated string.");
    }
}

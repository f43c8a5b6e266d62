use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::token::{Literal, Token, TokenType};
use std::error::Error;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Upper bound on call arguments and function parameters.
pub const MAX_ARITY: usize = 255;

// Stands in for the end of a stream that lacks its own `Eof`.
static EOF: Token = Token {
    tokentype: TokenType::Eof,
    lexeme: String::new(),
    literal: None,
    line: 0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
    pub expected: Option<TokenType>,
    /// Lexeme of the offending token; `None` at end of input.
    pub found: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.found {
            Some(lexeme) => write!(
                f,
                "[line {}] Error at '{}': {}",
                self.line, lexeme, self.message
            ),
            None => write!(f, "[line {}] Error at end: {}", self.line, self.message),
        }
    }
}

impl Error for ParseError {}

/// Every error from one parse, in source order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl Error for ParseErrors {}

type ParseResult<T> = Result<T, ParseError>;

macro_rules! consume {
    ($self:expr, $tt:ident, $message:expr) => {
        if $self.check(TokenType::$tt) {
            Ok($self.advance())
        } else {
            Err($self.error_expected(TokenType::$tt, $message))
        }
    };
}

macro_rules! advance_if {
    ($self:expr, $($tt:ident)|+) => {
        match $self.peek().tokentype {
            $(TokenType::$tt)|+ => {
                $self.advance();
                true
            }
            _ => false,
        }
    };
}

/// Parses a token stream into statements, or every error found along the
/// way. Statements are only returned when there were no errors.
pub fn parse(tokens: &[Token]) -> Result<Vec<Stmt>, ParseErrors> {
    Parser::new(tokens).parse()
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    errors: Vec<ParseError>,
    function_depth: usize,
    loop_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        Parser {
            tokens,
            current: 0,
            errors: Vec::new(),
            function_depth: 0,
            loop_depth: 0,
        }
    }
    pub fn parse(mut self) -> Result<Vec<Stmt>, ParseErrors> {
        let mut statements: Vec<Stmt> = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        if self.errors.is_empty() {
            Ok(statements)
        } else {
            Err(ParseErrors(self.errors))
        }
    }
    // Any error below this point is recorded here and parsing resumes at the
    // next statement boundary.
    fn declaration(&mut self) -> Option<Stmt> {
        let result = match self.peek().tokentype {
            TokenType::Var => {
                self.advance();
                self.var_declaration()
            }
            TokenType::Fun => {
                self.advance();
                self.function()
            }
            _ => self.statement(),
        };
        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                debug!(line = err.line, message = %err.message, "parse error, synchronizing");
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }
    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = consume!(self, Identifier, "Expect variable name.")?.clone();
        let initializer = if advance_if!(self, Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        consume!(self, Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }
    fn function(&mut self) -> ParseResult<Stmt> {
        let name = consume!(self, Identifier, "Expect function name.")?.clone();
        consume!(self, LeftParen, "Expect '(' after function name.")?;
        let mut params: Vec<Token> = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                if params.len() == MAX_ARITY {
                    let err = self.error_at(self.peek(), "Can't have more than 255 parameters.");
                    self.errors.push(err);
                }
                params.push(consume!(self, Identifier, "Expect parameter name.")?.clone());
                if !advance_if!(self, Comma) {
                    break;
                }
            }
        }
        consume!(self, RightParen, "Expect ')' after parameters.")?;
        consume!(self, LeftBrace, "Expect '{' before function body.")?;

        // A loop around the declaration does not make `break` legal inside it.
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;
        self.loop_depth = enclosing_loops;

        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body: body?,
        })))
    }
    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().tokentype {
            TokenType::If => {
                self.advance();
                self.if_statement()
            }
            TokenType::Print => {
                self.advance();
                self.print_statement()
            }
            TokenType::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.block()?))
            }
            TokenType::While => {
                self.advance();
                self.while_statement()
            }
            TokenType::For => {
                self.advance();
                self.for_statement()
            }
            TokenType::Return => {
                self.advance();
                self.return_statement()
            }
            TokenType::Break => {
                self.advance();
                self.break_statement()
            }
            _ => self.expression_statement(),
        }
    }
    // for (init; cond; incr) body  =>  { init; while (cond) { body; incr; } }
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        consume!(self, LeftParen, "Expect '(' after 'for'.")?;
        let initializer = match self.peek().tokentype {
            TokenType::Semicolon => {
                self.advance();
                None
            }
            TokenType::Var => {
                self.advance();
                Some(self.var_declaration()?)
            }
            _ => Some(self.expression_statement()?),
        };
        let condition = if self.check(TokenType::Semicolon) {
            Expr::Literal(Literal::Boolean(true))
        } else {
            self.expression()?
        };
        consume!(self, Semicolon, "Expect ';' after loop condition.")?;
        let increment = if self.check(TokenType::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        consume!(self, RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.loop_body()?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };
        match initializer {
            None => Ok(body),
            Some(initializer) => Ok(Stmt::Block(vec![initializer, body])),
        }
    }
    fn while_statement(&mut self) -> ParseResult<Stmt> {
        consume!(self, LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        consume!(self, RightParen, "Expect ')' after condition.")?;
        let body = self.loop_body()?;
        Ok(Stmt::While {
            condition,
            body: Box::new(body),
        })
    }
    fn loop_body(&mut self) -> ParseResult<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        body
    }
    // The innermost `if` takes the `else`, so it binds to the nearest one.
    fn if_statement(&mut self) -> ParseResult<Stmt> {
        consume!(self, LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        consume!(self, RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if advance_if!(self, Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }
    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        if self.function_depth == 0 {
            let err = self.error_at(&keyword, "Can't return from top-level code.");
            self.errors.push(err);
        }
        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        consume!(self, Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }
    fn break_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        if self.loop_depth == 0 {
            let err = self.error_at(&keyword, "Can't use 'break' outside of a loop.");
            self.errors.push(err);
        }
        consume!(self, Semicolon, "Expect ';' after 'break'.")?;
        Ok(Stmt::Break(keyword))
    }
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        consume!(self, RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }
    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = self.expression()?;
        consume!(self, Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print { keyword, value })
    }
    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        consume!(self, Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }
    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }
    // Right-associative: the value side recurses into `assignment` again.
    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;
        if advance_if!(self, Equal) {
            let equals = self.previous();
            let value = self.assignment()?;
            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                }),
                _ => {
                    // Reported, but the parser is not lost: no synchronization.
                    let err = self.error_at(equals, "Invalid assignment target.");
                    self.errors.push(err);
                    Ok(expr)
                }
            };
        }
        Ok(expr)
    }
    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while advance_if!(self, Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }
    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while advance_if!(self, And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }
    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;
        while advance_if!(self, BangEqual | EqualEqual) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }
    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        while advance_if!(self, Greater | GreaterEqual | Less | LessEqual) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }
    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;
        while advance_if!(self, Minus | Plus) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }
    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while advance_if!(self, Slash | Star) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }
    fn unary(&mut self) -> ParseResult<Expr> {
        if advance_if!(self, Bang | Minus) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }
    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while advance_if!(self, LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }
    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                if arguments.len() == MAX_ARITY {
                    let err = self.error_at(self.peek(), "Can't have more than 255 arguments.");
                    self.errors.push(err);
                }
                arguments.push(self.expression()?);
                if !advance_if!(self, Comma) {
                    break;
                }
            }
        }
        let paren = consume!(self, RightParen, "Expect ')' after arguments.")?.clone();
        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }
    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek();
        let literal = match token.tokentype {
            TokenType::False => Literal::Boolean(false),
            TokenType::True => Literal::Boolean(true),
            TokenType::Nil => Literal::Nil,
            TokenType::Number | TokenType::String => match &token.literal {
                Some(literal) => literal.clone(),
                None => return Err(self.error_at(token, "Literal token carries no value.")),
            },
            TokenType::Identifier => {
                self.advance();
                return Ok(Expr::Variable(token.clone()));
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                consume!(self, RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => return Err(self.error_at(token, "Expect expression.")),
        };
        self.advance();
        Ok(Expr::Literal(literal))
    }
    // Discard tokens until just past a ';' or just before a keyword that
    // starts a declaration or statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if let TokenType::Semicolon = self.previous().tokentype {
                return;
            }
            match self.peek().tokentype {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return
                | TokenType::Break => return,
                _ => (),
            }
            self.advance();
        }
    }
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }
    fn check(&self, tokentype: TokenType) -> bool {
        self.peek().tokentype == tokentype
    }
    fn is_at_end(&self) -> bool {
        self.check(TokenType::Eof)
    }
    fn peek(&self) -> &'a Token {
        self.tokens.get(self.current).unwrap_or(&EOF)
    }
    fn previous(&self) -> &'a Token {
        self.current
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .unwrap_or(&EOF)
    }
    fn error_at(&self, token: &Token, message: &str) -> ParseError {
        ParseError {
            line: token.line,
            message: message.to_string(),
            expected: None,
            found: match token.tokentype {
                TokenType::Eof => None,
                _ => Some(token.lexeme.clone()),
            },
        }
    }
    fn error_expected(&self, expected: TokenType, message: &str) -> ParseError {
        ParseError {
            expected: Some(expected),
            ..self.error_at(self.peek(), message)
        }
    }
}

#[cfg(test)]
mod parser_tests {
    use crate::ast::{AstPrinter, Expr, Stmt};
    use crate::parser::{self, ParseErrors};
    use crate::scanner;
    use crate::token::{Literal, Token, TokenType};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Vec<Stmt>, ParseErrors> {
        parser::parse(&scanner::scan_tokens(source).unwrap())
    }

    fn print(source: &str) -> Vec<String> {
        let printer = AstPrinter {};
        match parse(source) {
            Ok(statements) => statements.iter().map(|s| printer.print_stmt(s)).collect(),
            Err(errors) => panic!("unexpected parse errors:\n{}", errors),
        }
    }

    fn errors(source: &str) -> Vec<(usize, String)> {
        match parse(source) {
            Ok(_) => panic!("expected parse errors for {:?}", source),
            Err(errors) => errors.iter().map(|e| (e.line, e.message.clone())).collect(),
        }
    }

    #[test]
    fn precedence() {
        assert_eq!(print("1 + 2 * 3;"), vec!["(; (+ 1 (* 2 3)))"]);
        assert_eq!(print("-a * (b + c);"), vec!["(; (* (- a) (group (+ b c))))"]);
        assert_eq!(print("!a == b < c;"), vec!["(; (== (! a) (< b c)))"]);
        assert_eq!(print("a or b and c;"), vec!["(; (or a (and b c)))"]);
    }

    #[test]
    fn binary_levels_are_left_associative() {
        assert_eq!(print("a - b - c;"), vec!["(; (- (- a b) c))"]);
        assert_eq!(print("a / b * c;"), vec!["(; (* (/ a b) c))"]);
        assert_eq!(print("a < b >= c;"), vec!["(; (>= (< a b) c))"]);
        assert_eq!(print("a == b != c;"), vec!["(; (!= (== a b) c))"]);
        assert_eq!(print("a or b or c;"), vec!["(; (or (or a b) c))"]);
        assert_eq!(print("a and b and c;"), vec!["(; (and (and a b) c))"]);
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(print("a = b = c;"), vec!["(; (assign a (assign b c)))"]);
        let statements = parse("a = b = c;").unwrap();
        match &statements[0] {
            Stmt::Expression(Expr::Assign { name, value }) => {
                assert_eq!(name.lexeme, "a");
                assert!(matches!(**value, Expr::Assign { .. }));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn invalid_assignment_target() {
        let errs = parse("a + b = c;\n(a) = 1;").unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs.0[0].message, "Invalid assignment target.");
        assert_eq!(errs.0[0].found, Some("=".to_string()));
        assert_eq!(errs.0[1].line, 2);
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        assert_eq!(
            print("if (a) if (b) print 1; else print 2;"),
            vec!["(if a (if-else b (print 1) (print 2)))"]
        );
    }

    #[test]
    fn for_loop_desugars_to_while() {
        assert_eq!(
            print("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i 0) (while (< i 3) (block (print i) (; (assign i (+ i 1))))))"]
        );
        assert_eq!(
            print("while (true) for (;;) break;"),
            vec!["(while true (while true (break)))"]
        );
    }

    #[test]
    fn calls_and_functions() {
        assert_eq!(print("f(1)(2, 3);"), vec!["(; (call (call f 1) 2 3))"]);
        assert_eq!(
            print("fun add(a, b) { return a + b; }"),
            vec!["(fun add(a b) (return (+ a b)))"]
        );
    }

    #[test]
    fn one_bad_statement_reports_one_error() {
        assert_eq!(
            errors("print 1 +;\nprint 2;"),
            vec![(1, "Expect expression.".to_string())]
        );
    }

    #[test]
    fn recovery_reports_independent_errors() {
        assert_eq!(
            errors("var = 1;\nprint 2;\nvar x = ;\nprint x;\nif (x print x;"),
            vec![
                (1, "Expect variable name.".to_string()),
                (3, "Expect expression.".to_string()),
                (5, "Expect ')' after if condition.".to_string()),
            ]
        );
    }

    #[test]
    fn errors_name_the_expected_token() {
        let errs = parse("print 1").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.0[0].expected, Some(TokenType::Semicolon));
        assert_eq!(errs.0[0].found, None);
        assert_eq!(
            errs.to_string(),
            "[line 1] Error at end: Expect ';' after value."
        );
    }

    #[test]
    fn misplaced_control_flow_is_rejected() {
        assert_eq!(
            errors("return 1;"),
            vec![(1, "Can't return from top-level code.".to_string())]
        );
        assert_eq!(
            errors("break;"),
            vec![(1, "Can't use 'break' outside of a loop.".to_string())]
        );
        assert_eq!(
            errors("while (true) {\n fun f() { break; }\n}"),
            vec![(2, "Can't use 'break' outside of a loop.".to_string())]
        );
        assert!(parse("fun f() { while (true) { if (x) break; return 1; } }").is_ok());
    }

    #[test]
    fn argument_limit() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));
        assert_eq!(
            errors(&source),
            vec![(1, "Can't have more than 255 arguments.".to_string())]
        );
        let args: Vec<String> = (0..255).map(|i| i.to_string()).collect();
        assert!(parse(&format!("f({});", args.join(", "))).is_ok());
    }

    #[test]
    fn parameter_limit() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));
        assert_eq!(
            errors(&source),
            vec![(1, "Can't have more than 255 parameters.".to_string())]
        );
        let source = format!("fun f({}) {{}}", params[..255].join(", "));
        match &parse(&source).unwrap()[0] {
            Stmt::Function(decl) => assert_eq!(decl.params.len(), 255),
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn stream_without_eof() {
        let tokens = vec![
            Token::new(TokenType::Number, "1", Some(Literal::Number(1.0)), 1),
            Token::new(TokenType::Semicolon, ";", None, 1),
        ];
        assert_eq!(
            parser::parse(&tokens).unwrap(),
            vec![Stmt::Expression(Expr::Literal(Literal::Number(1.0)))]
        );
    }
}

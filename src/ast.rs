use crate::token::{Literal, Token};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Grouping(Box<Expr>),
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Variable(Token),
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
}

/// A parsed `fun` declaration. Shared between the tree and every function
/// value created from it.
#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Print {
        keyword: Token,
        value: Expr,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Function(Rc<FunctionDecl>),
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Break(Token),
}

/// Renders trees in a parenthesized prefix form, e.g. `(* (- 123) (group 45.67))`.
pub struct AstPrinter {}

impl AstPrinter {
    pub fn print_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(Literal::String(s)) => format!("\"{}\"", s),
            Expr::Literal(x) => x.to_string(),
            Expr::Grouping(x) => self.parenthesize("group", &[x]),
            Expr::Unary { operator, right } => self.parenthesize(&operator.lexeme, &[right]),
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => self.parenthesize(&operator.lexeme, &[left, right]),
            Expr::Variable(name) => name.lexeme.clone(),
            Expr::Assign { name, value } => {
                format!("(assign {} {})", name.lexeme, self.print_expr(value))
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut x = format!("(call {}", self.print_expr(callee));
                for argument in arguments {
                    x.push(' ');
                    x.push_str(&self.print_expr(argument));
                }
                x.push(')');
                x
            }
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(e) => format!("(; {})", self.print_expr(e)),
            Stmt::Print { value, .. } => format!("(print {})", self.print_expr(value)),
            Stmt::Var {
                name,
                initializer: None,
            } => format!("(var {})", name.lexeme),
            Stmt::Var {
                name,
                initializer: Some(e),
            } => format!("(var {} {})", name.lexeme, self.print_expr(e)),
            Stmt::Block(stmts) => {
                let mut x = String::from("(block");
                for stmt in stmts {
                    x.push(' ');
                    x.push_str(&self.print_stmt(stmt));
                }
                x.push(')');
                x
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                None => format!(
                    "(if {} {})",
                    self.print_expr(condition),
                    self.print_stmt(then_branch)
                ),
                Some(else_branch) => format!(
                    "(if-else {} {} {})",
                    self.print_expr(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
            },
            Stmt::While { condition, body } => format!(
                "(while {} {})",
                self.print_expr(condition),
                self.print_stmt(body)
            ),
            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                let mut x = format!("(fun {}({})", decl.name.lexeme, params.join(" "));
                for stmt in &decl.body {
                    x.push(' ');
                    x.push_str(&self.print_stmt(stmt));
                }
                x.push(')');
                x
            }
            Stmt::Return { value: None, .. } => String::from("(return)"),
            Stmt::Return { value: Some(e), .. } => format!("(return {})", self.print_expr(e)),
            Stmt::Break(_) => String::from("(break)"),
        }
    }

    fn parenthesize(&self, name: &str, args: &[&Box<Expr>]) -> String {
        let mut x = String::from("(");
        x.push_str(name);
        for arg in args {
            x.push(' ');
            x.push_str(&self.print_expr(arg));
        }
        x.push(')');
        x
    }
}

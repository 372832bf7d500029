use crate::ast::{Expr, ExprKind, LiteralValue, Stmt};

/// Debug renderings of the syntax tree.
///
/// * [`AstPrinter::print`] – Crafting‑Interpreters prefix form, `(+ 1.0 2.0)`.
/// * [`AstPrinter::source`] – fully parenthesised Lox that parses back to an
///   equivalent expression, `(1 + 2)`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match &expr.kind {
            // ── literals ────────────────────────────────────────────────
            ExprKind::Literal(lit) => match lit {
                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            ExprKind::Grouping(inner) => format!("(group {})", Self::print(inner)),

            ExprKind::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            }
            | ExprKind::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            ExprKind::Variable(name) => name.lexeme.clone(),

            ExprKind::This(_) => "this".into(),

            ExprKind::Assign { name, value } => format!("(= {} {})", name.lexeme, Self::print(value)),

            ExprKind::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            ExprKind::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            ExprKind::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),
        }
    }

    /// Prefix form of a statement, used by `--emit ast`.
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::list("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(function) => {
                let params: Vec<&str> = function.params.iter().map(|p| p.lexeme.as_str()).collect();
                let head = format!("fun {} ({})", function.name.lexeme, params.join(" "));
                Self::list(&head, &function.body)
            }

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Class { name, methods } => {
                let mut s = format!("(class {}", name.lexeme);
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(&Stmt::Function(method.clone())));
                }
                s.push(')');
                s
            }
        }
    }

    fn list(head: &str, statements: &[Stmt]) -> String {
        let mut s = format!("({}", head);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    /// Lox source for `expr` with every compound sub‑expression wrapped in
    /// parentheses, so precedence never depends on the reader.
    pub fn source(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                LiteralValue::Bool(b) => b.to_string(),
                LiteralValue::Nil => "nil".into(),
                LiteralValue::Str(s) => format!("\"{}\"", s),
                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.0}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            ExprKind::Grouping(inner) => format!("({})", Self::source(inner)),

            ExprKind::Unary { operator, right } => {
                format!("({}{})", operator.lexeme, Self::source(right))
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            }
            | ExprKind::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                Self::source(left),
                operator.lexeme,
                Self::source(right)
            ),

            ExprKind::Variable(name) => name.lexeme.clone(),

            ExprKind::This(_) => "this".into(),

            ExprKind::Assign { name, value } => {
                format!("({} = {})", name.lexeme, Self::source(value))
            }

            ExprKind::Call {
                callee, arguments, ..
            } => {
                let args: Vec<String> = arguments.iter().map(Self::source).collect();
                format!("{}({})", Self::source(callee), args.join(", "))
            }

            ExprKind::Get { object, name } => format!("{}.{}", Self::source(object), name.lexeme),

            ExprKind::Set {
                object,
                name,
                value,
            } => format!(
                "({}.{} = {})",
                Self::source(object),
                name.lexeme,
                Self::source(value)
            ),
        }
    }
}

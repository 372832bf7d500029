use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Stdout, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, error, info, trace};

use crate::ast::{Expr, ExprId, ExprKind, FunctionDecl, LiteralValue, Stmt};
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, Value};

/// Host stack the driver gives the thread running a session.  Lox recursion
/// is bounded by this stack; [`MAX_CALL_DEPTH`] is sized to fit inside it.
pub const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Nested Lox calls allowed before the interpreter reports "Stack overflow."
/// instead of exhausting [`INTERPRETER_STACK_SIZE`] bytes of host stack.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// How a statement finished.  `return` travels here, in the `Ok` channel;
/// runtime errors travel in `Err`.  Nothing that handles one sees the other.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Seconds since the Unix epoch, with sub‑second precision.
fn clock(_args: &[Value]) -> Result<Value, String> {
    let micros: i64 = Utc::now().timestamp_micros();
    Ok(Value::Number(micros as f64 / 1_000_000.0))
}

/// Tree‑walking evaluator.  `W` receives the output of `print`.
pub struct Interpreter<W: Write = Stdout> {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    out: W,
    depth: usize,
}

impl Interpreter<Stdout> {
    /// Creates an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Creates an interpreter writing `print` output to `out` and defines
    /// native functions such as `clock`.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new_ref(None);

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            depth: 0,
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Merge a resolver side table.  Tables from earlier source units stay,
    /// since closures created there may still run.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Interprets a list of statements (a "program").  Stops at the first
    /// runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                break;
            }
        }

        if let Err(e) = self.out.flush() {
            error!("Failed to flush output: {}", e);
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                trace!("print {}", value);

                if let Err(e) = writeln!(self.out, "{}", value) {
                    error!("Failed to write output: {}", e);
                }
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let frame: EnvRef = Environment::new_ref(Some(Rc::clone(&self.environment)));
                return self.execute_block(statements, frame);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                );
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                trace!("Returning value: {}", value);
                return Ok(Flow::Return(value));
            }

            Stmt::Class { name, methods } => self.define_class(name, methods)?,
        }

        Ok(Flow::Normal)
    }

    fn define_class(&mut self, name: &Token, methods: &[Rc<FunctionDecl>]) -> IResult<()> {
        debug!("Defining class '{}'", name.lexeme);

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let methods: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(
                    Rc::clone(method),
                    Rc::clone(&self.environment),
                    method.name.lexeme == "init",
                );
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), methods);

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))
    }

    /// Run `statements` with `frame` as the current scope.  The previous
    /// scope is put back whether the block completes, returns or fails.
    pub fn execute_block(&mut self, statements: &[Stmt], frame: EnvRef) -> IResult<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, frame);

        let mut result: IResult<Flow> = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, right } => self.evaluate_unary(operator, right),

            ExprKind::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Variable(name) => self.look_up_variable(name, expr.id),

            ExprKind::This(keyword) => self.look_up_variable(keyword, expr.id),

            ExprKind::Assign { name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(&expr.id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(callee, paren, args)
            }

            ExprKind::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(RuntimeError::new(name, "Only instances have properties.")),
            },

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::new(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> IResult<Value> {
        let right: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(op, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(RuntimeError::new(op, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression.  Both operands are evaluated, left
    /// first, before any type check.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        trace!("Binary {} on {} and {}", op.lexeme, left.type_name(), right.type_name());

        match op.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::new(
                    op,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => {
                let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                    return Err(RuntimeError::new(op, "Operands must be numbers."));
                };
                let (a, b) = (*a, *b);

                match op.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    // IEEE‑754: x/0 is ±inf, 0/0 is NaN.
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    _ => Err(RuntimeError::new(op, "Invalid binary operator.")),
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    fn check_arity(paren: &Token, arity: usize, got: usize) -> IResult<()> {
        if arity == got {
            Ok(())
        } else {
            Err(RuntimeError::new(
                paren,
                format!("Expected {} arguments but got {}.", arity, got),
            ))
        }
    }

    /// Invokes a callable: native function, user function, or class.
    fn call_value(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> IResult<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);
                Self::check_arity(paren, arity, args.len())?;

                func(&args).map_err(|msg| RuntimeError::new(paren, msg))
            }

            Value::Function(function) => {
                Self::check_arity(paren, function.arity(), args.len())?;
                self.call_function(&function, paren, args)
            }

            Value::Class(class) => {
                debug!("Instantiating class '{}'", class.name);
                Self::check_arity(paren, class.arity(), args.len())?;

                let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(&class))));

                if let Some(init) = class.find_method("init") {
                    self.call_function(&init.bind(Rc::clone(&instance)), paren, args)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(RuntimeError::new(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Run a user function body in a fresh frame chained to its closure.
    /// Arity has already been checked.
    fn call_function(
        &mut self,
        function: &LoxFunction,
        paren: &Token,
        args: Vec<Value>,
    ) -> IResult<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(paren, "Stack overflow."));
        }

        debug!(
            "Calling '{}' with {} argument(s) at depth {}",
            function.name(),
            args.len(),
            self.depth
        );

        let frame: EnvRef = Environment::new_ref(Some(Rc::clone(&function.closure)));
        for (param, arg) in function.declaration.params.iter().zip(args) {
            frame.borrow_mut().define(&param.lexeme, arg);
        }

        self.depth += 1;
        let flow: IResult<Flow> = self.execute_block(&function.declaration.body, frame);
        self.depth -= 1;

        let returned: Value = match flow? {
            Flow::Normal => Value::Nil,
            Flow::Return(value) => value,
        };

        if function.is_initializer {
            // `init` always yields its instance, bound at distance 0 of the closure.
            return Ok(function.closure.borrow().lookup("this").unwrap_or(Value::Nil));
        }

        Ok(returned)
    }
}

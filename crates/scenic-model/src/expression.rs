//! Expressions carried by interactions, loop bounds and assertions, and the
//! constant folder used to evaluate closed ones.

use indexmap::IndexMap;
use thiserror::Error;

/// Named constant declarations visible to a scenario, in declaration order.
pub type ConstantTable = IndexMap<String, Expression>;

/// Constant chains deeper than this are treated as cyclic.
const MAX_CONSTANT_DEPTH: usize = 64;

/// Reference to the `index`-th parameter declared by scenario `scenario`.
///
/// Parameters are identified by their declaring scenario and position; the
/// name is kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterRef {
    pub scenario: String,
    pub index: usize,
    pub name: String,
}

impl ParameterRef {
    pub fn new(scenario: impl Into<String>, index: usize, name: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            index,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

/// General expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Expression {
    Int(i64),
    Bool(bool),
    Parameter(ParameterRef),
    /// Reference to a constant declaration of the enclosing package.
    Constant(String),
    /// Runtime reference (component variable, event parameter). Never constant.
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Int(v) => write!(f, "{v}"),
            Expression::Bool(b) => write!(f, "{b}"),
            Expression::Parameter(p) => write!(f, "{}", p.name),
            Expression::Constant(c) => write!(f, "{c}"),
            Expression::Variable(v) => write!(f, "{v}"),
            Expression::Unary {
                op: UnaryOp::Neg,
                operand,
            } => write!(f, "-{operand}"),
            Expression::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "!{operand}"),
            Expression::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

/// Result of folding a closed expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("expression '{0}' is not a compile-time constant")]
    NotConstant(String),
    #[error("unknown constant '{0}'")]
    UnknownConstant(String),
    #[error("constant '{0}' is defined in terms of itself")]
    ConstantCycle(String),
    #[error("type mismatch in '{expression}': expected {expected}")]
    TypeMismatch {
        expression: String,
        expected: &'static str,
    },
    #[error("division by zero in '{0}'")]
    DivisionByZero(String),
    #[error("arithmetic overflow in '{0}'")]
    Overflow(String),
}

impl Expression {
    pub fn int(value: i64) -> Self {
        Expression::Int(value)
    }

    pub fn parameter(scenario: impl Into<String>, index: usize, name: impl Into<String>) -> Self {
        Expression::Parameter(ParameterRef::new(scenario, index, name))
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Expression::Constant(name.into())
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// True if the expression mentions a scenario parameter anywhere.
    pub fn mentions_parameter(&self) -> bool {
        match self {
            Expression::Parameter(_) => true,
            Expression::Unary { operand, .. } => operand.mentions_parameter(),
            Expression::Binary { lhs, rhs, .. } => {
                lhs.mentions_parameter() || rhs.mentions_parameter()
            }
            _ => false,
        }
    }

    /// Fold the expression to a value using the given constant declarations.
    pub fn evaluate(&self, constants: &ConstantTable) -> Result<Value, EvalError> {
        self.evaluate_at(constants, 0)
    }

    /// Fold the expression and require an integer result.
    pub fn evaluate_int(&self, constants: &ConstantTable) -> Result<i64, EvalError> {
        match self.evaluate(constants)? {
            Value::Int(v) => Ok(v),
            Value::Bool(_) => Err(EvalError::TypeMismatch {
                expression: self.to_string(),
                expected: "integer",
            }),
        }
    }

    fn evaluate_at(&self, constants: &ConstantTable, depth: usize) -> Result<Value, EvalError> {
        match self {
            Expression::Int(v) => Ok(Value::Int(*v)),
            Expression::Bool(b) => Ok(Value::Bool(*b)),
            Expression::Constant(name) => {
                if depth >= MAX_CONSTANT_DEPTH {
                    return Err(EvalError::ConstantCycle(name.clone()));
                }
                let bound = constants
                    .get(name)
                    .ok_or_else(|| EvalError::UnknownConstant(name.clone()))?;
                bound.evaluate_at(constants, depth + 1)
            }
            Expression::Parameter(_) | Expression::Variable(_) => {
                Err(EvalError::NotConstant(self.to_string()))
            }
            Expression::Unary { op, operand } => {
                let value = operand.evaluate_at(constants, depth)?;
                match (op, value) {
                    (UnaryOp::Neg, Value::Int(v)) => v
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| EvalError::Overflow(self.to_string())),
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, _) => Err(self.mismatch("integer")),
                    (UnaryOp::Not, _) => Err(self.mismatch("boolean")),
                }
            }
            Expression::Binary { op, lhs, rhs } => {
                let l = lhs.evaluate_at(constants, depth)?;
                let r = rhs.evaluate_at(constants, depth)?;
                self.apply_binary(*op, l, r)
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, l: Value, r: Value) -> Result<Value, EvalError> {
        let overflow = || EvalError::Overflow(self.to_string());
        match (op, l, r) {
            (BinaryOp::Add, Value::Int(a), Value::Int(b)) => {
                a.checked_add(b).map(Value::Int).ok_or_else(overflow)
            }
            (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => {
                a.checked_sub(b).map(Value::Int).ok_or_else(overflow)
            }
            (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => {
                a.checked_mul(b).map(Value::Int).ok_or_else(overflow)
            }
            (BinaryOp::Div | BinaryOp::Mod, Value::Int(_), Value::Int(0)) => {
                Err(EvalError::DivisionByZero(self.to_string()))
            }
            (BinaryOp::Div, Value::Int(a), Value::Int(b)) => {
                a.checked_div(b).map(Value::Int).ok_or_else(overflow)
            }
            (BinaryOp::Mod, Value::Int(a), Value::Int(b)) => {
                a.checked_rem(b).map(Value::Int).ok_or_else(overflow)
            }
            (BinaryOp::And, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
            (BinaryOp::Or, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a || b)),
            (BinaryOp::Eq, a, b) => Ok(Value::Bool(a == b)),
            (BinaryOp::Ne, a, b) => Ok(Value::Bool(a != b)),
            (BinaryOp::Lt, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a < b)),
            (BinaryOp::Le, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a <= b)),
            (BinaryOp::Gt, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a > b)),
            (BinaryOp::Ge, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a >= b)),
            (BinaryOp::And | BinaryOp::Or, _, _) => Err(self.mismatch("boolean")),
            _ => Err(self.mismatch("integer")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> EvalError {
        EvalError::TypeMismatch {
            expression: self.to_string(),
            expected,
        }
    }
}

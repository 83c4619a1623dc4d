//! Abstract Syntax Tree for rule expressions
//!
//! This module defines the AST types produced by the parser. Nodes are
//! immutable once built; unary minus is folded into multiplication by -1, so
//! there is no unary node.

use serde::{Deserialize, Serialize};

/// A rule expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// A numeric literal
    Number(f64),

    /// A namespaced reference such as `trait.caution`
    Reference { namespace: String, name: String },

    /// All values of a namespace, such as `trait.*`
    Wildcard { namespace: String },

    /// Arithmetic on two operands
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// A comparison yielding 1 or 0
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// An aggregate function call
    Call { function: Function, args: Vec<Expression> },

    /// `$current` or `$base`
    Special(SpecialValue),
}

impl Expression {
    /// Create a reference expression
    pub fn reference(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Expression::Reference {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a wildcard expression
    pub fn wildcard(namespace: impl Into<String>) -> Self {
        Expression::Wildcard {
            namespace: namespace.into(),
        }
    }

    /// Create a binary arithmetic expression
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a comparison expression
    pub fn comparison(op: ComparisonOp, left: Expression, right: Expression) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a function call
    pub fn call(function: Function, args: Vec<Expression>) -> Self {
        Expression::Call { function, args }
    }

    /// Negate an expression (`-x` is `x * -1`)
    pub fn negate(operand: Expression) -> Self {
        Self::binary(BinaryOp::Mul, operand, Expression::Number(-1.0))
    }

    /// Check if this expression reads nothing from the context
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Number(_) => true,
            Expression::Reference { .. }
            | Expression::Wildcard { .. }
            | Expression::Special(_) => false,
            Expression::Binary { left, right, .. } | Expression::Comparison { left, right, .. } => {
                left.is_constant() && right.is_constant()
            }
            Expression::Call { args, .. } => args.iter().all(Expression::is_constant),
        }
    }

    /// Visit every node, parents before children
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        visit(self);
        match self {
            Expression::Binary { left, right, .. } | Expression::Comparison { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Expression::Number(_)
            | Expression::Reference { .. }
            | Expression::Wildcard { .. }
            | Expression::Special(_) => {}
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
}

impl BinaryOp {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Equal within tolerance (==)
    Eq,
    /// Not equal within tolerance (!=)
    Ne,
}

impl ComparisonOp {
    /// Evaluate the comparison; `==` and `!=` treat values closer than
    /// `tolerance` as equal
    pub fn evaluate(&self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Le => lhs <= rhs,
            ComparisonOp::Gt => lhs > rhs,
            ComparisonOp::Ge => lhs >= rhs,
            ComparisonOp::Eq => (lhs - rhs).abs() < tolerance,
            ComparisonOp::Ne => (lhs - rhs).abs() >= tolerance,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
        }
    }
}

/// Aggregate functions recognized by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Avg,
    Max,
    Min,
    Sum,
    Count,
    Clamp,
}

impl Function {
    pub const ALL: [Function; 6] = [
        Function::Avg,
        Function::Max,
        Function::Min,
        Function::Sum,
        Function::Count,
        Function::Clamp,
    ];

    /// Look up a function by its source name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Function::Avg => "avg",
            Function::Max => "max",
            Function::Min => "min",
            Function::Sum => "sum",
            Function::Count => "count",
            Function::Clamp => "clamp",
        }
    }
}

/// Special values available to rule expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialValue {
    /// The in-progress value of the attribute being computed
    Current,
    /// The default value for the attribute type being computed
    Base,
}

impl SpecialValue {
    /// Look up a special value by the name following `$`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "current" => Some(SpecialValue::Current),
            "base" => Some(SpecialValue::Base),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialValue::Current => "$current",
            SpecialValue::Base => "$base",
        }
    }
}

//! Expression evaluation
//!
//! Evaluates rule expressions against an [`EvaluationContext`] by walking
//! the tree. Evaluation is pure: the same expression and context always give
//! the same result.

use crate::ast::{BinaryOp, Expression, Function, SpecialValue};
use crate::context::{EvaluationContext, Namespace};
use crate::error::{EvalError, EvalResult};

/// Tolerance used by `==` and `!=`
pub const DEFAULT_TOLERANCE: f64 = 0.0001;

/// Evaluate an expression with the default comparison tolerance
pub fn evaluate(expr: &Expression, context: &EvaluationContext) -> EvalResult<f64> {
    Evaluator::new(context).evaluate(expr)
}

/// Evaluator for rule expressions
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    context: &'a EvaluationContext,
    tolerance: f64,
}

impl<'a> Evaluator<'a> {
    /// Create a new evaluator
    pub fn new(context: &'a EvaluationContext) -> Self {
        Self {
            context,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Override the equality tolerance for `==` and `!=`
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Evaluate an expression to a number
    pub fn evaluate(&self, expr: &Expression) -> EvalResult<f64> {
        match expr {
            Expression::Number(n) => Ok(*n),

            Expression::Reference { namespace, name } => {
                let ns: Namespace = namespace.parse()?;
                self.context
                    .get(ns, name)
                    .ok_or_else(|| EvalError::UndefinedReference {
                        namespace: namespace.clone(),
                        name: name.clone(),
                    })
            }

            Expression::Wildcard { namespace } => Err(EvalError::WildcardMisuse(namespace.clone())),

            Expression::Binary { op, left, right } => {
                let lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;
                apply_binary(*op, lhs, rhs)
            }

            Expression::Comparison { op, left, right } => {
                let lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;
                Ok(if op.evaluate(lhs, rhs, self.tolerance) { 1.0 } else { 0.0 })
            }

            Expression::Call { function, args } => self.evaluate_call(*function, args),

            Expression::Special(SpecialValue::Base) => Ok(self.context.base()),

            Expression::Special(SpecialValue::Current) => {
                self.context.current().ok_or(EvalError::CurrentUnavailable)
            }
        }
    }

    /// Evaluate an aggregate function call
    fn evaluate_call(&self, function: Function, args: &[Expression]) -> EvalResult<f64> {
        match function {
            Function::Clamp => self.evaluate_clamp(args),
            Function::Avg => {
                let values = self.expand_arguments(args)?;
                if values.is_empty() {
                    return Ok(0.0);
                }
                Ok(values.iter().sum::<f64>() / values.len() as f64)
            }
            Function::Max => self
                .expand_arguments(args)?
                .into_iter()
                .reduce(f64::max)
                .ok_or(EvalError::EmptyArguments("max")),
            Function::Min => self
                .expand_arguments(args)?
                .into_iter()
                .reduce(f64::min)
                .ok_or(EvalError::EmptyArguments("min")),
            Function::Sum => Ok(self.expand_arguments(args)?.iter().sum()),
            Function::Count => Ok(self.expand_arguments(args)?.len() as f64),
        }
    }

    /// `clamp(value, low, high)` takes exactly three plain arguments
    fn evaluate_clamp(&self, args: &[Expression]) -> EvalResult<f64> {
        if let Some(Expression::Wildcard { namespace }) =
            args.iter().find(|a| matches!(a, Expression::Wildcard { .. }))
        {
            return Err(EvalError::WildcardMisuse(namespace.clone()));
        }

        let [value, low, high] = args else {
            return Err(EvalError::WrongArity {
                function: Function::Clamp.as_str(),
                expected: 3,
                found: args.len(),
            });
        };

        let value = self.evaluate(value)?;
        let low = self.evaluate(low)?;
        let high = self.evaluate(high)?;

        // f64::clamp panics when low > high
        Ok(value.max(low).min(high))
    }

    /// Evaluate arguments, expanding wildcards into every value of their namespace
    fn expand_arguments(&self, args: &[Expression]) -> EvalResult<Vec<f64>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Expression::Wildcard { namespace } => {
                    let ns: Namespace = namespace.parse()?;
                    values.extend(self.context.values(ns));
                }
                other => values.push(self.evaluate(other)?),
            }
        }
        Ok(values)
    }
}

fn apply_binary(op: BinaryOp, lhs: f64, rhs: f64) -> EvalResult<f64> {
    match op {
        BinaryOp::Add => Ok(lhs + rhs),
        BinaryOp::Sub => Ok(lhs - rhs),
        BinaryOp::Mul => Ok(lhs * rhs),
        BinaryOp::Div => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(lhs / rhs)
        }
    }
}

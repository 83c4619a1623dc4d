//! persona-expr - Expression language for persona attribute rules
//!
//! Composition rules and condition blocks are written in a small arithmetic
//! language over namespaced attribute values:
//!
//! # Expression Syntax
//!
//! - **References**: `trait.caution`, `skill.debugging`, `exp.years`, `stack.rust`, `quirk.night-owl`
//! - **Arithmetic**: `trait.caution * 0.5 + skill.debugging * 0.5`
//! - **Comparisons**: `trait.detail-focus > 70` (yields 1 or 0)
//! - **Aggregates**: `avg(trait.*)`, `max(skill.rust, skill.go)`, `clamp(trait.x, -100, 100)`
//! - **Specials**: `$base`, `$current`
//!
//! # Examples
//!
//! ```
//! use persona_expr::{evaluate, parse, EvaluationContext};
//!
//! let expr = parse("trait.caution * 0.5 + skill.debugging * 0.5").unwrap();
//! let ctx = EvaluationContext::new()
//!     .with_trait("caution", 60.0)
//!     .with_skill("debugging", 80.0);
//! assert_eq!(evaluate(&expr, &ctx).unwrap(), 70.0);
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use context::*;
pub use error::*;
pub use eval::*;
pub use lexer::*;
pub use parser::*;
pub use token::*;

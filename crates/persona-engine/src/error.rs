//! Error types for persona-engine

use persona_expr::{EvalError, ExprError};
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Rule construction errors
    #[error("Rule error: {0}")]
    Rule(#[from] RuleConstructionError),

    /// Expression text that failed to lex or parse
    #[error("Expression error: {0}")]
    Expression(#[from] ExprError),

    /// Expression evaluation errors
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while authoring a composition rule
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleConstructionError {
    /// Rule text failed to lex or parse
    #[error("Invalid expression for {target}: {source}")]
    Expression {
        target: String,
        #[source]
        source: ExprError,
    },

    /// Target prefix is not trait, skill, experience or stack
    #[error("Unknown target namespace in '{0}'")]
    UnknownTargetNamespace(String),

    /// Target is not of the form `namespace.name`
    #[error("Malformed target '{0}', expected 'namespace.name'")]
    MalformedTarget(String),

    /// Weight is negative or not finite
    #[error("Invalid weight {weight} for {target}, weights must be finite and non-negative")]
    InvalidWeight { target: String, weight: f64 },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("TOML parse error: {0}")]
    Parse(String),

    /// A setting is out of range
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

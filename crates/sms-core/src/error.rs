//! Configuration-time error taxonomy for the composition engine.
//!
//! Composing a message never errors; these only surface when a composer is
//! built from configuration that could not honor the budget.

/// Errors produced while validating composer configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error(
        "fixed text leaves {available} body characters under the worst-case header, \
         {required} required"
    )]
    BudgetFloorUnmet { available: usize, required: usize },

    #[error("invalid composer config: {0}")]
    InvalidConfig(String),
}

/// Result type for composer construction.
pub type Result<T> = std::result::Result<T, ComposeError>;

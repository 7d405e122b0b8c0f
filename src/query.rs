use crate::types::RowValues;

/// A SQL statement and its positional parameters, ready to hand to a transport.
///
/// Produced by a [`QueryCompiler`](crate::compiler::QueryCompiler) and consumed, never mutated,
/// by connections.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// The SQL text
    pub sql: String,
    /// The parameters bound positionally to the statement
    pub parameters: Vec<RowValues>,
}

impl CompiledQuery {
    /// Bundle a statement with its parameters.
    pub fn new(sql: impl Into<String>, parameters: Vec<RowValues>) -> Self {
        Self {
            sql: sql.into(),
            parameters,
        }
    }

    /// A statement that takes no parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }
}

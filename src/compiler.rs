use crate::query::CompiledQuery;
use crate::translation::{QueryOptions, translate_placeholders};
use crate::types::RowValues;

/// Turns SQL text and parameters into a [`CompiledQuery`] for one engine.
pub trait QueryCompiler: Send + Sync {
    /// Compile `sql` with `params` under the given per-call options.
    fn compile(&self, sql: &str, params: &[RowValues], options: QueryOptions) -> CompiledQuery;

    /// Quote an identifier so it can be spliced into SQL text.
    fn quote_identifier(&self, ident: &str) -> String;
}

/// SQLite query compiler shared by both D1 dialects.
///
/// Placeholder translation is on by default so `$1`-style SQL written for other engines binds
/// positionally on D1; SQL that already uses `?` is passed through untouched.
#[derive(Debug, Clone, Copy)]
pub struct SqliteQueryCompiler {
    translate_placeholders: bool,
}

impl Default for SqliteQueryCompiler {
    fn default() -> Self {
        Self {
            translate_placeholders: true,
        }
    }
}

impl SqliteQueryCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_translation(mut self, translate_placeholders: bool) -> Self {
        self.translate_placeholders = translate_placeholders;
        self
    }
}

impl QueryCompiler for SqliteQueryCompiler {
    fn compile(&self, sql: &str, params: &[RowValues], options: QueryOptions) -> CompiledQuery {
        // Nothing to bind means nothing to rewrite; `$` may be a literal in raw SQL.
        let enabled = !params.is_empty() && options.translation.resolve(self.translate_placeholders);
        let sql = translate_placeholders(sql, enabled);
        CompiledQuery::new(sql.into_owned(), params.to_vec())
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

use tracing::{debug, warn};

use crate::binding::{D1Binding, D1PreparedStatement};
use crate::error::D1MiddlewareError;
use crate::query::CompiledQuery;
use crate::results::QueryResult;
use crate::transform::build_query_result;

/// Run a fixed number of statements as one atomic binding batch.
///
/// The output has one result per input, in the same positions.
///
/// ```rust,no_run
/// use d1_middleware::prelude::*;
///
/// # async fn demo(binding: &LocalD1Binding) -> Result<(), D1MiddlewareError> {
/// let [inserted, counted] = batch(
///     binding,
///     [
///         CompiledQuery::new("INSERT INTO kv (key, value) VALUES (?, ?)", vec!["a".into(), "1".into()]),
///         CompiledQuery::raw("SELECT count(*) AS n FROM kv"),
///     ],
/// )
/// .await?;
/// # let _ = (inserted, counted);
/// # Ok(()) }
/// ```
///
/// # Errors
/// Fails as a whole with the first statement error reported by the binding; no partial
/// results are returned.
pub async fn batch<B, const N: usize>(
    binding: &B,
    queries: [CompiledQuery; N],
) -> Result<[QueryResult; N], D1MiddlewareError>
where
    B: D1Binding + ?Sized,
{
    let results = batch_all(binding, &queries).await?;
    <[QueryResult; N]>::try_from(results).map_err(|results| {
        D1MiddlewareError::ExecutionError(format!(
            "D1 batch returned {} results for {N} statements",
            results.len()
        ))
    })
}

/// Run any number of statements as one atomic binding batch.
///
/// An empty slice returns immediately without touching the binding.
///
/// # Errors
/// Fails as a whole with the first statement error reported by the binding, or when the binding
/// returns a different number of results than statements submitted.
pub async fn batch_all<B>(
    binding: &B,
    queries: &[CompiledQuery],
) -> Result<Vec<QueryResult>, D1MiddlewareError>
where
    B: D1Binding + ?Sized,
{
    if queries.is_empty() {
        return Ok(Vec::new());
    }

    let statements: Vec<D1PreparedStatement> = queries
        .iter()
        .map(|query| binding.prepare(&query.sql).bind(query.parameters.clone()))
        .collect();
    debug!(statements = statements.len(), "submitting D1 batch");

    let results = binding.batch(&statements).await?;

    if let Some((index, message)) = results
        .iter()
        .enumerate()
        .find_map(|(index, result)| result.error.as_ref().map(|message| (index, message)))
    {
        warn!(statement = index, error = %message, "D1 batch failed");
        return Err(D1MiddlewareError::ExecutionError(message.clone()));
    }

    if results.len() != queries.len() {
        return Err(D1MiddlewareError::ExecutionError(format!(
            "D1 batch returned {} results for {} statements",
            results.len(),
            queries.len()
        )));
    }

    Ok(results.iter().map(build_query_result).collect())
}

use crate::envelope::D1Result;
use crate::results::QueryResult;

/// Map a D1 statement envelope onto a [`QueryResult`].
///
/// Total over its input: absent rows become an empty list, a zero or negative change count
/// leaves `num_affected_rows` unset, and a null (or negative) `last_row_id` leaves
/// `insert_id` unset.
#[must_use]
pub fn build_query_result(result: &D1Result) -> QueryResult {
    let num_affected_rows = if result.meta.changes > 0 {
        u64::try_from(result.meta.changes).ok()
    } else {
        None
    };
    let insert_id = result
        .meta
        .last_row_id
        .and_then(|id| u64::try_from(id).ok());
    let rows = result.results.clone().unwrap_or_default();

    QueryResult::new(rows, insert_id, num_affected_rows)
}

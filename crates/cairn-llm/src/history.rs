use std::collections::HashSet;

use thiserror::Error;

use crate::types::{Role, Turn};

/// Violation of the tool-invocation / tool-result pairing rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("turn {index}: tool invocations are not followed by a tool result turn")]
    MissingResults { index: usize },

    #[error("turn {index}: tool results without a preceding tool invocation turn")]
    UnexpectedResults { index: usize },

    #[error("turn {index}: duplicate tool id {id}")]
    DuplicateId { index: usize, id: String },

    #[error("turn {index}: tool result ids do not match invocations (missing {missing:?}, extra {extra:?})")]
    IdMismatch {
        index: usize,
        missing: Vec<String>,
        extra: Vec<String>,
    },
}

/// Check that every assistant turn with tool invocations is followed by
/// exactly one user turn holding exactly one result per invocation id.
pub fn validate_history(turns: &[Turn]) -> Result<(), HistoryError> {
    let mut index = 0;

    while index < turns.len() {
        let turn = &turns[index];

        if turn.as_tool_results().is_some() {
            return Err(HistoryError::UnexpectedResults { index });
        }

        let invocations = turn.tool_invocations();
        if turn.role != Role::Assistant || invocations.is_empty() {
            index += 1;
            continue;
        }

        let invoked = unique_ids(index, invocations.iter().map(|inv| inv.id.as_str()))?;

        let results_index = index + 1;
        let Some(results) = turns.get(results_index).and_then(Turn::as_tool_results) else {
            return Err(HistoryError::MissingResults { index });
        };

        let answered = unique_ids(
            results_index,
            results.iter().map(|result| result.tool_use_id.as_str()),
        )?;

        if invoked != answered {
            let mut missing: Vec<String> =
                invoked.difference(&answered).map(|id| id.to_string()).collect();
            let mut extra: Vec<String> =
                answered.difference(&invoked).map(|id| id.to_string()).collect();
            missing.sort();
            extra.sort();
            return Err(HistoryError::IdMismatch {
                index: results_index,
                missing,
                extra,
            });
        }

        index += 2;
    }

    Ok(())
}

fn unique_ids<'a>(
    index: usize,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashSet<&'a str>, HistoryError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(HistoryError::DuplicateId {
                index,
                id: id.to_string(),
            });
        }
    }
    Ok(seen)
}

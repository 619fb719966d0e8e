//! Error scan over an executed notebook.

use super::notebook::{Cell, Notebook};
use super::pipeline::BakeError;

/// Fail on the first code cell whose outputs include an error.
///
/// A cell may raise on purpose: if its last source line contains
/// `exemption_phrase` (case-insensitive) it is skipped.
pub fn check_errors(notebook: &Notebook, exemption_phrase: &str) -> Result<(), BakeError> {
    let phrase = exemption_phrase.to_lowercase();

    for cell in &notebook.cells {
        let Cell::Code(code) = cell else {
            continue;
        };
        let exempt = !phrase.is_empty()
            && code
                .source
                .last()
                .is_some_and(|line| line.to_lowercase().contains(&phrase));
        if exempt {
            continue;
        }

        if let Some(output) = code.first_error() {
            return Err(BakeError::CellExecution {
                execution_count: code.execution_count,
                evalue: output.evalue.clone().unwrap_or_default(),
                cell: code.source_text(),
            });
        }
    }

    Ok(())
}

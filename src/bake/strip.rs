//! Removal of solution code from exercise cells.
//!
//! An exercise is a markdown cell of class `exercise` followed by zero or more
//! code cells (the run ends at the next non-code cell). Inside those code
//! cells, any line starting with the marker (`###` by default) opens or closes
//! a solution region:
//!
//! ```text
//! # setup code given to the student (kept)
//!
//! ### Your code here:
//! answer = 42            # removed, replaced by two blank lines
//!
//! ### Check your results:
//! assert answer == 42    # kept
//! ```
//!
//! When an exercise has exactly one code cell and no marker anywhere, the whole
//! cell is the solution and its source is emptied. Stripped cells also lose
//! their outputs.

use std::ops::Range;

use super::html::validate_tags;
use super::notebook::{Cell, CodeCell, Notebook};
use super::pipeline::BakeError;
use super::style::outer_class;

/// Class that marks a markdown cell as an exercise.
pub const EXERCISE_CLASS: &str = "exercise";

/// Placeholder written where a solution region was removed.
const PLACEHOLDER_LINES: [&str; 2] = ["\n", "\n"];

/// Where the scan is relative to solution regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionState {
    Outside,
    InsideSolution,
}

/// What to emit for the line just consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Drop,
    Keep,
    /// Keep the line, then add the blank placeholder lines
    KeepThenPlaceholder,
}

impl SolutionState {
    /// Consume one line: marker lines toggle the state and are always kept;
    /// other lines are kept only outside a solution region.
    pub fn step(self, line: &str, marker: &str) -> (SolutionState, Emit) {
        if !line.starts_with(marker) {
            let emit = match self {
                SolutionState::Outside => Emit::Keep,
                SolutionState::InsideSolution => Emit::Drop,
            };
            return (self, emit);
        }

        match self {
            SolutionState::Outside => (SolutionState::InsideSolution, Emit::KeepThenPlaceholder),
            SolutionState::InsideSolution => (SolutionState::Outside, Emit::Keep),
        }
    }
}

/// Counts reported after stripping a notebook.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StripSummary {
    pub exercises: usize,
    pub code_cells: usize,
    pub removed_lines: usize,
}

pub struct SolutionStripper<'a> {
    marker: &'a str,
}

impl<'a> SolutionStripper<'a> {
    pub fn new(marker: &'a str) -> Self {
        Self { marker }
    }

    /// Strip solution regions from one cell's lines.
    ///
    /// Returns the kept lines and whether any marker was seen.
    pub fn strip_lines(&self, lines: &[String]) -> (Vec<String>, bool) {
        let mut state = SolutionState::Outside;
        let mut saw_marker = false;
        let mut kept = Vec::with_capacity(lines.len());

        for line in lines {
            let (next, emit) = state.step(line, self.marker);
            if next != state {
                saw_marker = true;
            }
            state = next;

            match emit {
                Emit::Drop => {}
                Emit::Keep => kept.push(line.clone()),
                Emit::KeepThenPlaceholder => {
                    kept.push(line.clone());
                    kept.extend(PLACEHOLDER_LINES.map(String::from));
                }
            }
        }

        (kept, saw_marker)
    }

    /// Strip the code cells of one exercise group in place.
    ///
    /// Returns the number of source lines removed.
    pub fn strip_group(&self, cells: &mut [&mut CodeCell]) -> usize {
        let mut saw_marker = false;
        let mut removed = 0;

        for cell in cells.iter_mut() {
            let (kept, marked) = self.strip_lines(&cell.source);
            saw_marker |= marked;
            // placeholders can make `kept` longer than the source
            removed += cell.source.len().saturating_sub(kept.len());
            cell.source = kept;
            cell.clear_outputs();
        }

        if !saw_marker {
            if let [only] = cells {
                removed += only.source.len();
                only.source.clear();
            }
        }

        removed
    }

    /// Strip every exercise group in the notebook.
    pub fn strip_notebook(&self, notebook: &mut Notebook) -> Result<StripSummary, BakeError> {
        let mut summary = StripSummary::default();

        for range in exercise_groups(notebook)? {
            let mut group: Vec<&mut CodeCell> = notebook.cells[range]
                .iter_mut()
                .filter_map(|cell| match cell {
                    Cell::Code(code) => Some(code),
                    _ => None,
                })
                .collect();

            summary.exercises += 1;
            summary.code_cells += group.len();
            summary.removed_lines += self.strip_group(&mut group);
        }

        Ok(summary)
    }
}

/// Locate exercise groups: for each exercise markdown cell, the index range of
/// the code cells immediately following it.
pub fn exercise_groups(notebook: &Notebook) -> Result<Vec<Range<usize>>, BakeError> {
    let mut groups = Vec::new();

    for (i, cell) in notebook.cells.iter().enumerate() {
        let Cell::Markdown(markdown) = cell else {
            continue;
        };
        if markdown.is_blank() {
            continue;
        }

        let text = markdown.source_text();
        let outer = validate_tags(&text).map_err(|e| BakeError::cell(&text, e))?;
        let class = outer_class(outer.as_ref()).map_err(|e| BakeError::cell(&text, e))?;
        if class != EXERCISE_CLASS {
            continue;
        }

        let start = i + 1;
        let len = notebook.cells[start..]
            .iter()
            .take_while(|cell| matches!(cell, Cell::Code(_)))
            .count();
        groups.push(start..start + len);
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bake::notebook::{MarkdownCell, split_lines};
    use proptest::prelude::*;

    fn stripper() -> SolutionStripper<'static> {
        SolutionStripper::new("###")
    }

    fn code(text: &str) -> CodeCell {
        CodeCell::new(text)
    }

    fn notebook(cells: Vec<Cell>) -> Notebook {
        Notebook {
            cells,
            extra: Default::default(),
        }
    }

    fn exercise() -> Cell {
        Cell::Markdown(MarkdownCell::new("<div class=\"exercise\">Question</div>"))
    }

    #[test]
    fn test_transitions() {
        use Emit::*;
        use SolutionState::*;
        assert_eq!(Outside.step("x = 1\n", "###"), (Outside, Keep));
        assert_eq!(Outside.step("### Your code\n", "###"), (InsideSolution, KeepThenPlaceholder));
        assert_eq!(InsideSolution.step("secret\n", "###"), (InsideSolution, Drop));
        assert_eq!(InsideSolution.step("###\n", "###"), (Outside, Keep));
        // the marker must start the line
        assert_eq!(Outside.step("  ### indented\n", "###"), (Outside, Keep));
    }

    #[test]
    fn test_exercise_cell_with_markers() {
        let mut nb = notebook(vec![
            exercise(),
            Cell::Code(code("### \n secret=42\n### \nprint(secret)")),
        ]);
        stripper().strip_notebook(&mut nb).unwrap();
        assert_eq!(nb.cells[1].source_text(), "### \n\n\n### \nprint(secret)");
    }

    #[test]
    fn test_multiple_regions_keep_markers_and_outside_lines() {
        let source = "setup()\n### Your code:\na = 1\nb = 2\n### Check:\ncheck(a)\n### Again\nc = 3\n";
        let (kept, saw) = stripper().strip_lines(&split_lines(source));
        assert!(saw);
        assert_eq!(
            kept.concat(),
            "setup()\n### Your code:\n\n\n### Check:\ncheck(a)\n### Again\n\n\n"
        );
    }

    #[test]
    fn test_single_cell_without_marker_is_emptied() {
        let mut nb = notebook(vec![exercise(), Cell::Code(code("answer = 42\nprint(answer)"))]);
        let summary = stripper().strip_notebook(&mut nb).unwrap();
        assert!(nb.cells[1].source().is_empty());
        assert_eq!(summary.removed_lines, 2);
    }

    #[test]
    fn test_multi_cell_without_marker_is_untouched() {
        let mut nb = notebook(vec![
            exercise(),
            Cell::Code(code("a = 1\n")),
            Cell::Code(code("b = 2\n")),
        ]);
        stripper().strip_notebook(&mut nb).unwrap();
        assert_eq!(nb.cells[1].source_text(), "a = 1\n");
        assert_eq!(nb.cells[2].source_text(), "b = 2\n");
    }

    #[test]
    fn test_marker_in_any_cell_disables_whole_cell_rule() {
        let mut nb = notebook(vec![
            exercise(),
            Cell::Code(code("given = 1\n")),
            Cell::Code(code("###\nsolution\n###\n")),
        ]);
        stripper().strip_notebook(&mut nb).unwrap();
        assert_eq!(nb.cells[1].source_text(), "given = 1\n");
        assert_eq!(nb.cells[2].source_text(), "###\n\n\n###\n");
    }

    #[test]
    fn test_group_stops_at_next_markdown() {
        let mut nb = notebook(vec![
            exercise(),
            Cell::Code(code("solution()\n")),
            Cell::Markdown(MarkdownCell::new("<div class=\"default\">Next</div>")),
            Cell::Code(code("keep_me()\n")),
        ]);
        assert_eq!(exercise_groups(&nb).unwrap(), vec![1..2]);

        stripper().strip_notebook(&mut nb).unwrap();
        assert!(nb.cells[1].source().is_empty());
        assert_eq!(nb.cells[3].source_text(), "keep_me()\n");
    }

    #[test]
    fn test_exercise_at_end_has_empty_group() {
        let mut nb = notebook(vec![Cell::Code(code("x\n")), exercise()]);
        assert_eq!(exercise_groups(&nb).unwrap(), vec![2..2]);
        let summary = stripper().strip_notebook(&mut nb).unwrap();
        assert_eq!(summary.exercises, 1);
        assert_eq!(summary.code_cells, 0);
        assert_eq!(nb.cells[0].source_text(), "x\n");
    }

    #[test]
    fn test_stripped_cells_lose_outputs() {
        let mut cell = code("###\nx\n###\n");
        cell.execution_count = Some(4);
        cell.outputs.push(
            serde_json::from_str(r#"{"output_type": "stream", "name": "stdout", "text": "x"}"#).unwrap(),
        );
        stripper().strip_group(&mut [&mut cell]);
        assert!(cell.outputs.is_empty());
        assert_eq!(cell.execution_count, None);
    }

    #[test]
    fn test_invalid_markdown_reports_cell() {
        let nb = notebook(vec![Cell::Markdown(MarkdownCell::new("<div class=\"exercise\">"))]);
        let err = exercise_groups(&nb).unwrap_err();
        assert!(err.to_string().contains("<div class=\"exercise\">"));
    }

    fn plain_lines() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z0-9 =()+]{0,12}\n", 0..4)
    }

    proptest! {
        #[test]
        fn prop_marker_pairs_keep_outside_and_markers(
            segments in prop::collection::vec((plain_lines(), plain_lines()), 1..4),
            tail in plain_lines(),
        ) {
            let mut source = Vec::new();
            let mut expected = Vec::new();
            for (outside, solution) in &segments {
                source.extend(outside.iter().cloned());
                source.push("### Your code here:\n".to_string());
                source.extend(solution.iter().cloned());
                source.push("### Check:\n".to_string());

                expected.extend(outside.iter().cloned());
                expected.push("### Your code here:\n".to_string());
                expected.push("\n".to_string());
                expected.push("\n".to_string());
                expected.push("### Check:\n".to_string());
            }
            source.extend(tail.iter().cloned());
            expected.extend(tail.iter().cloned());

            let (kept, saw_marker) = stripper().strip_lines(&source);
            prop_assert!(saw_marker);
            prop_assert_eq!(kept, expected);
        }
    }
}

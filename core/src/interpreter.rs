//! Interpretation of MWS response documents.
//!
//! A response is checked in order: a remote `Exception`, a missing `Result`,
//! a `Result` other than `True` (decoded through the error table when
//! possible), and finally the data table itself.
//!
//! The table layout is fixed in shape but not in names:
//!
//! ```text
//! <Response>
//!   <Table>
//!     <Plural>              exactly one, any name
//!       <Singular>          zero or more, all with the same name
//!         <ColumnA>..</ColumnA>
//!         <ColumnB>..</ColumnB>
//!       </Singular>
//!     </Plural>
//!   </Table>
//! </Response>
//! ```

use crate::error::InterpretationError;
use crate::types::{Redacted, ResponseTable, Row};
use crate::xml::XmlNode;

const ERROR_SUMMARY_COLUMN: &str = "Fout_omschrijving";
const ERROR_CODE_COLUMN: &str = "Fout_nummer";

/// Interpret a parsed response document into its table, or classify the
/// failure it reports.
pub fn interpret<N: XmlNode>(document: &N) -> Result<ResponseTable, InterpretationError> {
    if let Some(exception) = document.child("Exception") {
        let message = document
            .child("ExceptionMsg")
            .map(|m| m.text())
            .unwrap_or_else(|| "No ExceptionMsg".to_string());
        return Err(InterpretationError::RemoteException {
            exception: exception.text(),
            message,
            segment: Redacted::new(document.markup()),
        });
    }

    let result = document
        .child("Result")
        .ok_or_else(|| InterpretationError::MissingResult {
            segment: Redacted::new(document.markup()),
        })?
        .text();

    if result != "True" {
        let errors = match parse_rows(document, false) {
            Ok(errors) => errors,
            Err(e) => {
                return Err(InterpretationError::UnreadableErrorTable {
                    result,
                    segment: Redacted::new(document.markup()),
                    source: Box::new(e),
                })
            }
        };
        return Err(InterpretationError::Unsuccessful {
            result,
            summaries: summarize_errors(&errors),
            segment: Redacted::new(document.markup()),
        });
    }

    parse_table(document)
}

/// `<summary> (<code>), ...` for every row of an error table.
fn summarize_errors(errors: &[Row]) -> String {
    errors
        .iter()
        .map(|row| {
            format!(
                "{} ({})",
                row.get(ERROR_SUMMARY_COLUMN).unwrap_or("No summary"),
                row.get(ERROR_CODE_COLUMN).unwrap_or("no code"),
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode the `Table` of a response document into rows.
///
/// Every row must use the same element name and the same ordered columns.
/// Values are returned as text without coercion. An empty plural node gives
/// an empty table.
pub fn parse_table<N: XmlNode>(document: &N) -> Result<ResponseTable, InterpretationError> {
    parse_rows(document, true)
}

/// Error tables leave out columns they have no value for, so they are read
/// with `uniform_columns` off.
fn parse_rows<N: XmlNode>(
    document: &N,
    uniform_columns: bool,
) -> Result<ResponseTable, InterpretationError> {
    let table = document
        .child("Table")
        .ok_or_else(|| InterpretationError::MissingTable {
            segment: Redacted::new(document.markup()),
        })?;

    let mut direct = table.children();
    if direct.len() != 1 {
        return Err(InterpretationError::TableShape {
            count: direct.len(),
            segment: Redacted::new(table.markup()),
        });
    }
    let plural = direct.remove(0);

    let mut row_name: Option<String> = None;
    let mut columns: Option<Vec<String>> = None;
    let mut rows = ResponseTable::new();

    for (index, node) in plural.children().into_iter().enumerate() {
        let expected = row_name.get_or_insert_with(|| node.name().to_string());
        if expected.as_str() != node.name() {
            return Err(InterpretationError::MixedRowNames {
                plural: plural.name().to_string(),
                expected: expected.clone(),
                actual: node.name().to_string(),
                segment: Redacted::new(table.markup()),
            });
        }

        let row: Row = node
            .children()
            .iter()
            .map(|column| (column.name().to_string(), column.text()))
            .collect();

        if !uniform_columns {
            rows.push(row);
            continue;
        }

        let expected = columns.get_or_insert_with(|| row.column_names().map(str::to_string).collect());
        if !expected.iter().map(String::as_str).eq(row.column_names()) {
            return Err(InterpretationError::MixedColumns {
                index,
                expected: expected.join(", "),
                actual: row.column_names().collect::<Vec<_>>().join(", "),
                segment: Redacted::new(node.markup()),
            });
        }

        rows.push(row);
    }

    Ok(rows)
}

//! Result shaping.
//!
//! Converts an engine-native result into the fixed transport shape:
//! `{columns, rows, bytes_scanned}` with every cell coerced to text.
//! Row order is whatever the engine produced; nothing here sorts. Limits cap
//! the row count and the overall payload size, and any cap is flagged in the
//! result metadata rather than applied silently.

use serde::{Deserialize, Serialize};

use crate::engine::NativeResult;

/// Default cap on returned rows.
pub const DEFAULT_MAX_ROWS: usize = 1_000;

/// Default cap on the summed byte length of all cells.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 256 * 1024;

/// Caps applied when shaping a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResultLimits {
    /// Maximum number of rows returned.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Maximum summed byte length of all returned cells.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

impl Default for ResultLimits {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl ResultLimits {
    /// Limits that never truncate, for tests and diagnostics.
    pub fn unbounded() -> Self {
        Self {
            max_rows: usize::MAX,
            max_payload_bytes: usize::MAX,
        }
    }
}

/// The shaped result: all cells textual, aligned positionally with
/// `columns`. Produced once, not mutated after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    /// Ordered column names. Columns are never capped; they reflect the
    /// query.
    pub columns: Vec<String>,

    /// Ordered rows of textual cells.
    pub rows: Vec<Vec<String>>,

    /// Engine cost report, passed through unchanged.
    pub bytes_scanned: u64,

    /// True if any cap removed rows.
    pub truncated: bool,

    /// Number of rows omitted by the caps.
    pub rows_omitted: usize,
}

/// Shapes `native` into the transport form under `limits`.
pub fn shape(native: NativeResult, limits: &ResultLimits) -> ResultSet {
    let columns: Vec<String> = native.columns.into_iter().map(|c| c.name).collect();

    let total_rows = native.rows.len();
    let mut rows = Vec::new();
    let mut payload_bytes = 0usize;

    for row in native.rows {
        if rows.len() >= limits.max_rows {
            break;
        }
        let cells: Vec<String> = row.iter().map(|v| v.to_text()).collect();
        let row_bytes: usize = cells.iter().map(String::len).sum();
        // A row that would blow the payload budget is omitted whole; cells
        // are never split.
        if payload_bytes + row_bytes > limits.max_payload_bytes {
            break;
        }
        payload_bytes += row_bytes;
        rows.push(cells);
    }

    let rows_omitted = total_rows - rows.len();
    ResultSet {
        columns,
        rows,
        bytes_scanned: native.bytes_scanned,
        truncated: rows_omitted > 0,
        rows_omitted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ColumnInfo, Value};
    use pretty_assertions::assert_eq;

    fn synthetic(columns: usize, rows: usize) -> NativeResult {
        let cols = (0..columns)
            .map(|c| ColumnInfo::new(format!("c{c}"), "varchar"))
            .collect();
        let data = (0..rows)
            .map(|r| {
                (0..columns)
                    .map(|c| Value::String(format!("r{r}v{c}")))
                    .collect()
            })
            .collect();
        NativeResult::with_data(cols, data)
    }

    #[test]
    fn test_roundtrip_no_limits() {
        let shaped = shape(synthetic(4, 25), &ResultLimits::unbounded());
        assert_eq!(shaped.columns.len(), 4);
        assert_eq!(shaped.rows.len(), 25);
        let cells: usize = shaped.rows.iter().map(Vec::len).sum();
        assert_eq!(cells, 100);
        assert!(!shaped.truncated);
        assert_eq!(shaped.rows_omitted, 0);
    }

    #[test]
    fn test_row_cap_flags_truncation() {
        let limits = ResultLimits {
            max_rows: 1_000,
            max_payload_bytes: usize::MAX,
        };
        let shaped = shape(synthetic(2, 10_000), &limits);
        assert_eq!(shaped.rows.len(), 1_000);
        assert!(shaped.truncated);
        assert_eq!(shaped.rows_omitted, 9_000);
    }

    #[test]
    fn test_payload_cap_flags_truncation() {
        // Each row: two cells of 4 bytes = 8 bytes
        let limits = ResultLimits {
            max_rows: usize::MAX,
            max_payload_bytes: 20,
        };
        let shaped = shape(synthetic(2, 10), &limits);
        assert_eq!(shaped.rows.len(), 2);
        assert!(shaped.truncated);
        assert_eq!(shaped.rows_omitted, 8);
    }

    #[test]
    fn test_order_preserved() {
        let native = NativeResult::with_data(
            vec![ColumnInfo::new("n", "bigint")],
            vec![
                vec![Value::Int(3)],
                vec![Value::Int(1)],
                vec![Value::Int(2)],
            ],
        );
        let shaped = shape(native, &ResultLimits::default());
        let cells: Vec<&str> = shaped.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(cells, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_cell_coercion() {
        let native = NativeResult::with_data(
            vec![
                ColumnInfo::new("b", "boolean"),
                ColumnInfo::new("i", "bigint"),
                ColumnInfo::new("s", "varchar"),
                ColumnInfo::new("missing", "varchar"),
            ],
            vec![vec![
                Value::Bool(false),
                Value::Int(-7),
                Value::from("text"),
                Value::Null,
            ]],
        );
        let shaped = shape(native, &ResultLimits::default());
        assert_eq!(shaped.rows[0], vec!["false", "-7", "text", ""]);
    }

    #[test]
    fn test_bytes_scanned_passed_through() {
        let native = synthetic(1, 1).with_bytes_scanned(123_456);
        let shaped = shape(native, &ResultLimits::default());
        assert_eq!(shaped.bytes_scanned, 123_456);
    }

    #[test]
    fn test_empty_result() {
        let shaped = shape(NativeResult::default(), &ResultLimits::default());
        assert!(shaped.columns.is_empty());
        assert!(shaped.rows.is_empty());
        assert!(!shaped.truncated);
    }

    #[test]
    fn test_columns_never_capped() {
        let shaped = shape(
            synthetic(40, 1),
            &ResultLimits {
                max_rows: 1,
                max_payload_bytes: usize::MAX,
            },
        );
        assert_eq!(shaped.columns.len(), 40);
    }

    #[test]
    fn test_serialized_shape() {
        let shaped = shape(synthetic(1, 1).with_bytes_scanned(9), &ResultLimits::default());
        let json = serde_json::to_value(&shaped).unwrap();
        assert_eq!(json["columns"], serde_json::json!(["c0"]));
        assert_eq!(json["rows"], serde_json::json!([["r0v0"]]));
        assert_eq!(json["bytes_scanned"], serde_json::json!(9));
    }
}

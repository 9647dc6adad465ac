//! Row filtering for [`crate::types::DataSet`].

use crate::types::{DataSet, Value};

/// Returns a new [`DataSet`] containing only rows where any of `columns` is null.
///
/// Columns missing from the schema count as null.
pub fn filter_any_null(dataset: &DataSet, columns: &[&str]) -> DataSet {
    let idxs: Vec<Option<usize>> = columns.iter().map(|c| dataset.schema.index_of(c)).collect();
    dataset.filter_rows(|row| {
        idxs.iter()
            .any(|idx| idx.and_then(|i| row.get(i)).is_none_or(Value::is_null))
    })
}

#[cfg(test)]
mod tests {
    use super::filter_any_null;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn listings() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("row_num", DataType::Int64),
            Field::new("name", DataType::Utf8),
            Field::new("phone", DataType::Utf8),
        ]);

        let rows = vec![
            vec![
                Value::Int64(0),
                Value::Utf8("Jalsa".to_string()),
                Value::Utf8("08041714161".to_string()),
            ],
            vec![Value::Int64(1), Value::Null, Value::Utf8("08041714162".to_string())],
            vec![Value::Int64(2), Value::Utf8("Spice Elephant".to_string()), Value::Null],
        ];

        DataSet::new(schema, rows)
    }

    #[test]
    fn filter_any_null_selects_incomplete_rows() {
        let ds = listings();
        let out = filter_any_null(&ds, &["name", "phone"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows[0][0], Value::Int64(1));
        assert_eq!(out.rows[1][0], Value::Int64(2));
    }

    #[test]
    fn filter_any_null_treats_missing_column_as_null() {
        let ds = listings();
        let out = filter_any_null(&ds, &["location"]);
        assert_eq!(out.row_count(), 3);
    }

    #[test]
    fn filter_any_null_keeps_schema_when_nothing_matches() {
        let ds = listings();
        let out = filter_any_null(&ds, &["row_num"]);
        assert_eq!(out.schema, ds.schema);
        assert!(out.rows.is_empty());
    }
}

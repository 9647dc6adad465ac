//! Grouped aggregation for [`crate::types::DataSet`].

use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Built-in aggregations applied per group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// Join the non-null values of `column` with `separator`, in row order.
    Join { column: String, separator: String },
}

impl Aggregation {
    /// Shorthand for [`Aggregation::Join`].
    pub fn join(column: impl Into<String>, separator: impl Into<String>) -> Self {
        Self::Join {
            column: column.into(),
            separator: separator.into(),
        }
    }
}

/// Group rows by the value of `key` and compute each `(aggregation, output_name)` per group.
///
/// - Returns `None` if `key` (or a joined column) does not exist in the schema.
/// - Every aggregate column is [`DataType::Utf8`].
/// - Groups are emitted in order of first appearance.
/// - An empty input yields an empty output with the aggregate schema.
pub fn group_by_aggregate(
    dataset: &DataSet,
    key: &str,
    aggregations: &[(Aggregation, &str)],
) -> Option<DataSet> {
    let key_idx = dataset.schema.index_of(key)?;
    let key_field = dataset.schema.fields.get(key_idx)?.clone();

    let mut col_idxs = Vec::with_capacity(aggregations.len());
    for (Aggregation::Join { column, .. }, _) in aggregations {
        col_idxs.push(dataset.schema.index_of(column)?);
    }

    let mut groups: Vec<(Value, Vec<&[Value]>)> = Vec::new();
    for row in &dataset.rows {
        let k = row.get(key_idx).cloned().unwrap_or(Value::Null);
        match groups.iter_mut().find(|(g, _)| *g == k) {
            Some((_, members)) => members.push(row.as_slice()),
            None => groups.push((k, vec![row.as_slice()])),
        }
    }

    let mut fields = vec![key_field];
    for (_, name) in aggregations {
        fields.push(Field::new(*name, DataType::Utf8));
    }

    let rows = groups
        .into_iter()
        .map(|(k, members)| {
            let mut out = Vec::with_capacity(aggregations.len() + 1);
            out.push(k);
            for ((Aggregation::Join { separator, .. }, _), &i) in aggregations.iter().zip(&col_idxs) {
                let joined = members
                    .iter()
                    .filter_map(|r| r.get(i))
                    .filter(|v| !v.is_null())
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(separator.as_str());
                out.push(Value::Utf8(joined));
            }
            out
        })
        .collect();

    Some(DataSet::new(Schema::new(fields), rows))
}

#[cfg(test)]
mod tests {
    use super::{group_by_aggregate, Aggregation};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn issues() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("row_num", DataType::Int64),
            Field::new("issue", DataType::Utf8),
        ]);
        let rows = vec![
            vec![Value::Int64(2), Value::Utf8("null".to_string())],
            vec![Value::Int64(5), Value::Utf8("format".to_string())],
            vec![Value::Int64(9), Value::Utf8("null".to_string())],
        ];
        DataSet::new(schema, rows)
    }

    #[test]
    fn join_collects_ids_per_group_in_row_order() {
        let out = group_by_aggregate(
            &issues(),
            "issue",
            &[(Aggregation::join("row_num", ","), "ids")],
        )
        .unwrap();

        assert_eq!(out.schema.field_names().collect::<Vec<_>>(), vec!["issue", "ids"]);
        assert_eq!(
            out.rows,
            vec![
                vec![
                    Value::Utf8("null".to_string()),
                    Value::Utf8("2,9".to_string()),
                ],
                vec![
                    Value::Utf8("format".to_string()),
                    Value::Utf8("5".to_string()),
                ],
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let ds = issues().filter_rows(|_| false);
        let out = group_by_aggregate(&ds, "issue", &[(Aggregation::join("row_num", ","), "ids")]).unwrap();
        assert_eq!(out.row_count(), 0);
        assert_eq!(out.schema.fields.len(), 2);
    }

    #[test]
    fn missing_columns_return_none() {
        assert!(group_by_aggregate(&issues(), "missing", &[]).is_none());
        assert!(
            group_by_aggregate(&issues(), "issue", &[(Aggregation::join("nope", ","), "x")])
                .is_none()
        );
    }
}

//! Writes the per-file output artifacts.
//!
//! Layout under the output root, for a source file keyed as `<key>`:
//!
//! ```text
//! <output>/<key>/a.out                    accepted records, raw multi-value columns dropped
//! <output>/<key>/not_valid_location.bad   location-invalid records
//! <output>/<key>/b.bad                    rejected records
//! <output>/<key>/b.bad_metadata.csv       Type_of_issue,Row_num_list
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::Classification;
use crate::error::{PipelineError, PipelineResult};
use crate::listing::RAW_DERIVED_SOURCES;
use crate::processing::project;
use crate::types::{DataSet, Schema};

pub const ACCEPTED_FILE: &str = "a.out";
pub const INVALID_LOCATION_FILE: &str = "not_valid_location.bad";
pub const REJECTED_FILE: &str = "b.bad";
pub const REJECT_METADATA_FILE: &str = "b.bad_metadata.csv";

/// Output directory for one source file: `<output_root>/<source dir name>/<file name>`.
pub fn output_dir_for(output_root: &Path, source_path: &Path) -> PathBuf {
    let mut dir = output_root.to_path_buf();
    if let Some(parent) = source_path.parent().and_then(Path::file_name) {
        dir.push(parent);
    }
    if let Some(name) = source_path.file_name() {
        dir.push(name);
    }
    dir
}

/// Write `dataset` as a headed CSV file, replacing `path` atomically.
///
/// Rows go to a sibling `.tmp` file first, which is renamed over `path` once flushed; a
/// failed write removes the temporary and leaves any previous `path` untouched.
pub fn write_csv(dataset: &DataSet, path: &Path) -> PipelineResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = write_csv_to(dataset, &tmp).and_then(|()| Ok(fs::rename(&tmp, path)?));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_csv_to(dataset: &DataSet, path: &Path) -> PipelineResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Paths of the artifacts written for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub dir: PathBuf,
    pub accepted: PathBuf,
    pub invalid_location: PathBuf,
    pub rejected: PathBuf,
    pub reject_metadata: PathBuf,
}

/// Columns written to `a.out`: every cleaned column except the raw multi-value sources.
fn accepted_columns(schema: &Schema) -> Vec<&str> {
    schema
        .field_names()
        .filter(|c| !RAW_DERIVED_SOURCES.contains(c))
        .collect()
}

/// Write all four artifacts into `dir`, creating it if needed.
///
/// Every artifact is attempted even if an earlier one fails; the returned error lists each
/// artifact that could not be written.
pub fn write_partitions(
    dir: &Path,
    classification: &Classification,
) -> PipelineResult<WrittenArtifacts> {
    fs::create_dir_all(dir)?;

    let artifacts = WrittenArtifacts {
        dir: dir.to_path_buf(),
        accepted: dir.join(ACCEPTED_FILE),
        invalid_location: dir.join(INVALID_LOCATION_FILE),
        rejected: dir.join(REJECTED_FILE),
        reject_metadata: dir.join(REJECT_METADATA_FILE),
    };

    let accepted = project(
        &classification.accepted,
        &accepted_columns(&classification.accepted.schema),
    );
    let jobs: [(&DataSet, &Path); 4] = [
        (&accepted, &artifacts.accepted),
        (&classification.invalid_location, &artifacts.invalid_location),
        (&classification.rejected, &artifacts.rejected),
        (&classification.reject_metadata, &artifacts.reject_metadata),
    ];

    let failures: Vec<String> = jobs
        .iter()
        .filter_map(|(ds, path)| {
            write_csv(ds, path)
                .err()
                .map(|e| format!("{}: {e}", path.display()))
        })
        .collect();

    if failures.is_empty() {
        Ok(artifacts)
    } else {
        Err(PipelineError::Output { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::{output_dir_for, write_csv, write_partitions, REJECTED_FILE};
    use crate::classify::{reject_metadata, Classification};
    use crate::error::PipelineError;
    use crate::types::{DataSet, DataType, Field, Schema, Value};
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("listing-pipeline-output-{name}-{nanos}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn output_dir_is_keyed_by_source_dir_and_file_name() {
        assert_eq!(
            output_dir_for(Path::new("output"), Path::new("/data/files/zomato_1.csv")),
            PathBuf::from("output/files/zomato_1.csv")
        );
        assert_eq!(
            output_dir_for(Path::new("output"), Path::new("zomato_1.csv")),
            PathBuf::from("output/zomato_1.csv")
        );
    }

    #[test]
    fn write_csv_renders_header_nulls_and_quotes() {
        let dir = tmp_dir("csv");
        let path = dir.join("a.out");
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("row_num", DataType::Int64),
                Field::new("dish_2", DataType::Utf8),
                Field::new("valid_location", DataType::Bool),
            ]),
            vec![
                vec![Value::Int64(0), Value::Utf8(" Pizza, Pasta".into()), Value::Bool(true)],
                vec![Value::Int64(1), Value::Null, Value::Bool(false)],
            ],
        );

        write_csv(&ds, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "row_num,dish_2,valid_location\n0,\" Pizza, Pasta\",true\n1,,false\n"
        );
        assert!(!dir.join("a.out.tmp").exists());

        // Rewriting replaces rather than appends.
        write_csv(&ds.filter_rows(|_| false), &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "row_num,dish_2,valid_location\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn classification() -> Classification {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("name", DataType::Utf8),
                Field::new("address", DataType::Utf8),
                Field::new("row_num", DataType::Int64),
            ]),
            vec![vec![Value::Utf8("Jalsa".into()), Value::Utf8("1 MG Road".into()), Value::Int64(0)]],
        );
        let rejected = ds.filter_rows(|_| false);
        Classification {
            accepted: ds.clone(),
            invalid_location: ds,
            reject_metadata: reject_metadata(&rejected),
            rejected,
        }
    }

    #[test]
    fn one_failed_artifact_does_not_stop_the_others() {
        let dir = tmp_dir("partial");
        // A directory where b.bad should go makes its rename fail.
        std::fs::create_dir_all(dir.join(REJECTED_FILE)).unwrap();

        let err = write_partitions(&dir, &classification()).unwrap_err();
        let PipelineError::Output { failures } = err else {
            panic!("expected an output error");
        };
        assert_eq!(failures.len(), 1);
        let rejected_path = dir.join(REJECTED_FILE);
        assert!(failures[0].starts_with(&format!("{}: ", rejected_path.display())));

        assert_eq!(
            std::fs::read_to_string(dir.join("a.out")).unwrap(),
            "name,row_num\nJalsa,0\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.join("not_valid_location.bad")).unwrap(),
            "name,address,row_num\nJalsa,1 MG Road,0\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.join("b.bad_metadata.csv")).unwrap(),
            "Type_of_issue,Row_num_list\n"
        );
        assert!(rejected_path.is_dir());

        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temporary files left: {leftovers:?}");

        let _ = std::fs::remove_dir_all(&dir);
    }
}

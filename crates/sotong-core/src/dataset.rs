//! CSV persistence shared by every pipeline stage.
//!
//! Files are UTF-8 with a leading byte-order mark so spreadsheet tools open
//! Korean text correctly. Column order is always passed explicitly; the
//! serialized struct fields must follow the same order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::posts::{LabeledRecord, LabelingSample, Post};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file not found: {path}")]
    NotFound { path: String },

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

impl DatasetError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            DatasetError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            DatasetError::Io {
                path: path.display().to_string(),
                source,
            }
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        DatasetError::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}

impl Post {
    pub const COLUMNS: [&'static str; 8] = [
        "post_id",
        "title",
        "author",
        "date",
        "views",
        "recommends",
        "detail_url",
        "content",
    ];
}

impl LabelingSample {
    pub const COLUMNS: [&'static str; 8] = [
        "post_id",
        "title",
        "content",
        "views",
        "recommends",
        "date",
        "detail_url",
        "label",
    ];
}

impl LabeledRecord {
    pub const COLUMNS: [&'static str; 2] = ["content", "label"];
}

/// Reads every row of a headed CSV file into `T`, matching columns by name.
///
/// A leading BOM is ignored. Columns present in the file but absent from `T`
/// are skipped.
///
/// # Errors
///
/// Returns [`DatasetError::NotFound`] when the file does not exist,
/// [`DatasetError::Io`] for other read failures and [`DatasetError::Csv`]
/// when a row cannot be parsed into `T`.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let bytes = std::fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| DatasetError::csv(path, e))
}

/// Writes `rows` under the given header line, prefixed by a UTF-8 BOM.
///
/// The header is written even when `rows` is empty.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file cannot be created or flushed and
/// [`DatasetError::Csv`] if a row fails to serialize.
pub fn write_csv<T: Serialize>(
    path: &Path,
    columns: &[&str],
    rows: &[T],
) -> Result<(), DatasetError> {
    let file = File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)
        .map_err(|e| DatasetError::io(path, e))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer
        .write_record(columns)
        .map_err(|e| DatasetError::csv(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| DatasetError::csv(path, e))?;
    }
    writer.flush().map_err(|e| DatasetError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    fn post(id: &str, content: &str) -> Post {
        Post {
            post_id: id.to_string(),
            title: format!("제목 {id}"),
            author: "작성자".to_string(),
            date: "2025.01.02".to_string(),
            views: "10".to_string(),
            recommends: "1".to_string(),
            detail_url: format!("https://example.com/view/{id}"),
            content: content.to_string(),
        }
    }

    #[test]
    fn written_file_starts_with_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        write_csv(&path, &Post::COLUMNS, &[post("1", "본문")]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert!(text.starts_with(
            "post_id,title,author,date,views,recommends,detail_url,content\n"
        ));
    }

    #[test]
    fn posts_survive_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let rows = vec![post("1", "첫 줄\n둘째 줄, 쉼표"), post("2", "\"따옴표\"")];
        write_csv(&path, &Post::COLUMNS, &rows).unwrap();

        let back: Vec<Post> = read_csv(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn empty_rows_still_write_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        write_csv::<LabeledRecord>(&path, &LabeledRecord::COLUMNS, &[]).unwrap();

        let back: Vec<LabeledRecord> = read_csv(&path).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn empty_label_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        let sample = LabelingSample {
            post_id: "7".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            views: 3,
            recommends: 0,
            date: "d".to_string(),
            detail_url: "u".to_string(),
            label: None,
        };
        write_csv(&path, &LabelingSample::COLUMNS, &[sample.clone()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.trim_end().ends_with(",u,"), "got: {text}");
        let back: Vec<LabelingSample> = read_csv(&path).unwrap();
        assert_eq!(back, vec![sample]);
    }

    #[test]
    fn float_labels_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        std::fs::write(&path, "content,label\n본문,3.0\n").unwrap();

        let back: Vec<LabeledRecord> = read_csv(&path).unwrap();
        assert_eq!(back[0].label, Tier::OperatorNotice);
    }

    #[test]
    fn out_of_range_label_is_a_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        std::fs::write(&path, "content,label\n본문,9\n").unwrap();

        let result = read_csv::<LabeledRecord>(&path);
        assert!(matches!(result, Err(DatasetError::Csv { .. })));
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_csv::<Post>(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(DatasetError::NotFound { .. })));
    }
}

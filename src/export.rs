use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{CoverageError, Result};

/// Summary of one probed batch, as written to `batch_<N>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    #[serde(rename = "batch number")]
    pub batch_number: usize,
    #[serde(rename = "total observed data layers")]
    pub observed: usize,
    #[serde(rename = "available data layers (value)")]
    pub available: usize,
    #[serde(rename = "id data layers")]
    pub layer_ids: Vec<String>,
}

impl ExportRecord {
    pub fn new(batch_number: usize, observed: usize) -> Self {
        Self {
            batch_number,
            observed,
            available: 0,
            layer_ids: Vec::new(),
        }
    }

    pub(crate) fn mark_available(&mut self, layer_id: String) {
        self.available += 1;
        self.layer_ids.push(layer_id);
    }

    pub fn file_name(&self) -> String {
        format!("batch_{}.json", self.batch_number)
    }
}

/// Writes `record` as 4-space indented JSON.
pub fn write_record<W: Write>(record: &ExportRecord, writer: W) -> std::io::Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    record.serialize(&mut ser)?;
    let mut writer = ser.into_inner();
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Writes `record` to `path`, creating missing parent directories.
pub fn export(record: &ExportRecord, path: &Path) -> Result<()> {
    let fail = |source: std::io::Error| CoverageError::Export {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(fail)?;
        }
    }

    let file = File::create(path).map_err(fail)?;
    write_record(record, BufWriter::new(file)).map_err(fail)?;
    tracing::info!(path = %path.display(), "exported batch summary");
    Ok(())
}

/// Writes `record` as `<dir>/batch_<N>.json` and returns that path.
pub fn export_to_dir(record: &ExportRecord, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(record.file_name());
    export(record, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExportRecord {
        let mut r = ExportRecord::new(2, 3);
        r.mark_available("49464".into());
        r.mark_available("51".into());
        r
    }

    #[test]
    fn layout_and_key_order() {
        let mut out = Vec::new();
        write_record(&sample(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = r#"{
    "batch number": 2,
    "total observed data layers": 3,
    "available data layers (value)": 2,
    "id data layers": [
        "49464",
        "51"
    ]
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn parses_back_to_the_same_record() {
        let mut out = Vec::new();
        write_record(&sample(), &mut out).unwrap();
        let back: ExportRecord = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn export_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("export");

        let path = export_to_dir(&sample(), &target).unwrap();
        assert_eq!(path, target.join("batch_2.json"));

        let back: ExportRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn export_into_a_file_path_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let err = export_to_dir(&sample(), &blocker).unwrap_err();
        assert!(matches!(err, CoverageError::Export { .. }));
    }
}

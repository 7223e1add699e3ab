use crate::{
    config::ExportOptions,
    error::{FlowError, Result},
    tabulator::VelocityRow,
};

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};
use tracing::debug;

pub const HEADER: [&str; 7] = ["x", "y", "z", "t", "vx", "vy", "vz"];

/// Writes one delimited text file per trigger time.
#[derive(Debug, Clone)]
pub struct RowExporter {
    dir: PathBuf,
    options: ExportOptions,
}

impl RowExporter {
    pub fn new(dir: impl Into<PathBuf>, options: ExportOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
        }
    }

    /// `<dir>/<prefix>.<time>`, the time printed in its shortest exact form.
    pub fn path_for(&self, time: f64) -> PathBuf {
        self.dir.join(format!("{}.{}", self.options.prefix, time))
    }

    /// Write `rows` to the file of trigger time `time`, creating the output
    /// directory if needed. Returns the written path.
    pub fn export(&self, time: f64, rows: &[VelocityRow]) -> Result<PathBuf> {
        if rows.is_empty() {
            return Err(FlowError::EmptyRowSet { time });
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(time);
        let mut writer = BufWriter::new(File::create(&path)?);
        self.write_rows(&mut writer, rows)?;
        writer.flush()?;
        debug!(rows = rows.len(), "Wrote {}", path.display());
        Ok(path)
    }

    /// Serialize the header and `rows` into `writer`.
    pub fn write_rows<W: Write>(&self, writer: &mut W, rows: &[VelocityRow]) -> Result<()> {
        let delimiter = self.options.delimiter.to_string();
        writeln!(writer, "{}", HEADER.join(&delimiter))?;
        let precision = self.options.precision;
        for row in rows {
            let fields = [row.x, row.y, row.z, row.t, row.vx, row.vy, row.vz];
            let line = fields
                .iter()
                .map(|value| format_number(*value, precision))
                .collect::<Vec<_>>()
                .join(&delimiter);
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }
}

/// Fixed-point rendering; Rust formatting never consults the locale.
/// Negative zero is written as zero.
fn format_number(value: f64, precision: usize) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:.precision$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(x: f64, vx: f64) -> VelocityRow {
        VelocityRow {
            x,
            y: 0.5,
            z: 2.0,
            t: 50.0,
            vx,
            vy: -1.5,
            vz: 0.0,
        }
    }

    #[test]
    fn rows_are_written_with_fixed_precision() {
        let exporter = RowExporter::new(
            "unused",
            ExportOptions {
                precision: 3,
                ..ExportOptions::default()
            },
        );
        let mut out = Vec::new();
        exporter
            .write_rows(&mut out, &[row(0.0, 1.0), row(1.5, -0.0)])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "x,y,z,t,vx,vy,vz\n\
             0.000,0.500,2.000,50.000,1.000,-1.500,0.000\n\
             1.500,0.500,2.000,50.000,0.000,-1.500,0.000\n"
        );
    }

    #[test]
    fn delimiter_is_configurable() {
        let exporter = RowExporter::new(
            "unused",
            ExportOptions {
                delimiter: ';',
                precision: 1,
                ..ExportOptions::default()
            },
        );
        let mut out = Vec::new();
        exporter.write_rows(&mut out, &[row(2.0, 3.0)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next(), Some("x;y;z;t;vx;vy;vz"));
        assert_eq!(text.lines().nth(1), Some("2.0;0.5;2.0;50.0;3.0;-1.5;0.0"));
    }

    #[test]
    fn file_name_carries_trigger_time() {
        let exporter = RowExporter::new("output", ExportOptions::default());
        assert_eq!(exporter.path_for(50.0), PathBuf::from("output/data.csv.50"));
        assert_eq!(
            exporter.path_for(37.5),
            PathBuf::from("output/data.csv.37.5")
        );
    }

    #[test]
    fn empty_row_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = RowExporter::new(dir.path().join("out"), ExportOptions::default());
        let err = exporter.export(10.0, &[]).unwrap_err();
        assert!(matches!(err, FlowError::EmptyRowSet { time } if time == 10.0));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn export_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = RowExporter::new(dir.path().join("out"), ExportOptions::default());
        let path = exporter.export(20.0, &[row(0.0, 1.0)]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}

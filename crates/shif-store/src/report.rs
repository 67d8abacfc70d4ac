//! Report writer: CSV (and optionally Parquet) tables plus `summary.json`.
//!
//! Row files depend only on the extracted data, so re-running on the same
//! input yields byte-identical tables. Only `summary.json` carries a timestamp.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use shif_core::{Contradiction, ExtractedRule, Gap, RunSummary};
use tracing::info;

use crate::StoreError;
use crate::batch::{contradictions_batch, gaps_batch, rules_batch};

pub const RULES_TABLE: &str = "rules";
pub const CONTRADICTIONS_TABLE: &str = "contradictions";
pub const GAPS_TABLE: &str = "gaps";
pub const SUMMARY_FILE: &str = "summary.json";

/// Which table formats to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Csv,
    #[cfg(feature = "parquet")]
    Parquet,
    #[cfg(feature = "parquet")]
    All,
}

impl ReportFormat {
    fn csv(&self) -> bool {
        match self {
            Self::Csv => true,
            #[cfg(feature = "parquet")]
            Self::Parquet => false,
            #[cfg(feature = "parquet")]
            Self::All => true,
        }
    }

    #[cfg(feature = "parquet")]
    fn parquet(&self) -> bool {
        matches!(self, Self::Parquet | Self::All)
    }
}

/// Writes the report tables into one output directory.
pub struct ReportWriter {
    out_dir: PathBuf,
    format: ReportFormat,
}

impl ReportWriter {
    /// Create the output directory if needed.
    pub fn create(out_dir: &Path, format: ReportFormat) -> Result<Self, StoreError> {
        std::fs::create_dir_all(out_dir)?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            format,
        })
    }

    /// Write rules, contradictions and gaps. Returns the paths written.
    pub fn write_tables(
        &self,
        rules: &[ExtractedRule],
        contradictions: &[Contradiction],
        gaps: &[Gap],
    ) -> Result<Vec<PathBuf>, StoreError> {
        let mut written = Vec::new();
        written.extend(self.write_table(RULES_TABLE, &rules_batch(rules)?)?);
        written.extend(self.write_table(
            CONTRADICTIONS_TABLE,
            &contradictions_batch(contradictions)?,
        )?);
        written.extend(self.write_table(GAPS_TABLE, &gaps_batch(gaps)?)?);
        Ok(written)
    }

    pub fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf, StoreError> {
        let path = self.out_dir.join(SUMMARY_FILE);
        let file = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(file, summary)?;
        info!(path = %path.display(), "wrote summary");
        Ok(path)
    }

    fn write_table(&self, table: &str, batch: &RecordBatch) -> Result<Vec<PathBuf>, StoreError> {
        let mut written = Vec::new();
        if self.format.csv() {
            let path = self.out_dir.join(format!("{table}.csv"));
            write_csv(&path, batch)?;
            written.push(path);
        }
        #[cfg(feature = "parquet")]
        if self.format.parquet() {
            let path = self.out_dir.join(format!("{table}.parquet"));
            write_parquet(&path, batch)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Write one batch as CSV with a header row.
pub fn write_csv(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    let file = BufWriter::new(File::create(path)?);
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    info!(path = %path.display(), rows = batch.num_rows(), "wrote csv");
    Ok(())
}

#[cfg(feature = "parquet")]
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    use parquet::arrow::ArrowWriter;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    info!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(())
}

/// Read a Parquet report table back into record batches.
#[cfg(feature = "parquet")]
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    if !path.exists() {
        return Err(StoreError::InputNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(batches)
}

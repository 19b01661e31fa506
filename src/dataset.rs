use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;

use crate::logging::log_event;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to load price history from {path}: {source}")]
    Load { path: PathBuf, source: PolarsError },
    #[error("failed to materialize price history from {path}: {source}")]
    Collect { path: PathBuf, source: PolarsError },
    #[error("failed to write enriched table to {path}: {source}")]
    Write { path: PathBuf, source: PolarsError },
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// One company's daily trading history, kept lazy until collected.
#[derive(Clone)]
pub struct PriceHistory {
    frame: LazyFrame,
    path: PathBuf,
}

impl PriceHistory {
    pub fn from_csv<P: AsRef<Path>>(path: P) -> DatasetResult<Self> {
        let path_ref = path.as_ref();
        let lazy_reader = LazyCsvReader::new(path_ref)
            .has_header(true)
            .with_try_parse_dates(true)
            .with_infer_schema_length(Some(2048));

        let frame = lazy_reader.finish().map_err(|source| {
            log_event(
                file!(),
                "PriceHistory",
                "from_csv",
                "dataset.load",
                line!(),
                &format!("Failed to load {}", path_ref.display()),
                Some(&source.to_string()),
                None,
            );
            DatasetError::Load {
                path: path_ref.to_path_buf(),
                source,
            }
        })?;

        log_event(
            file!(),
            "PriceHistory",
            "from_csv",
            "dataset.load",
            line!(),
            &format!("Loaded price history from {}", path_ref.display()),
            None,
            None,
        );

        Ok(Self {
            frame,
            path: path_ref.to_path_buf(),
        })
    }

    pub fn collect(&self) -> DatasetResult<DataFrame> {
        self.frame
            .clone()
            .collect()
            .map_err(|source| DatasetError::Collect {
                path: self.path.clone(),
                source,
            })
    }
}

/// Write an enriched table as CSV with headers and no index column, the
/// layout the downstream charting tools read directly.
pub fn write_csv<P: AsRef<Path>>(frame: &mut DataFrame, path: P) -> DatasetResult<()> {
    let path_ref = path.as_ref();
    let write_error = |source: PolarsError| {
        log_event(
            file!(),
            "PriceHistory",
            "write_csv",
            "dataset.write",
            line!(),
            &format!("Failed to write {}", path_ref.display()),
            Some(&source.to_string()),
            None,
        );
        DatasetError::Write {
            path: path_ref.to_path_buf(),
            source,
        }
    };

    let mut file = File::create(path_ref)
        .map_err(PolarsError::from)
        .map_err(write_error)?;

    CsvWriter::new(&mut file)
        .has_header(true)
        .finish(frame)
        .map_err(write_error)?;

    log_event(
        file!(),
        "PriceHistory",
        "write_csv",
        "dataset.write",
        line!(),
        &format!(
            "Wrote {} rows to {}",
            frame.height(),
            path_ref.display()
        ),
        None,
        None,
    );

    Ok(())
}

//! Batch driver: runs one transform over every data file under a root
//! directory, one unit of work per file.

use super::discovery::discover_files;
use super::EtlError;
use crate::warehouse::WarehouseSink;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Receives progress notifications from the batch driver.
pub trait ProgressReporter {
    fn files_found(&mut self, total: usize, root: &Path);
    fn file_processed(&mut self, processed: usize, total: usize, path: &Path);
}

/// Prints progress lines to stdout.
pub struct StdoutProgress;

impl ProgressReporter for StdoutProgress {
    fn files_found(&mut self, total: usize, root: &Path) {
        println!("{} files found in {}", total, root.display());
    }

    fn file_processed(&mut self, processed: usize, total: usize, _path: &Path) {
        println!("{}/{} files processed.", processed, total);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub root: PathBuf,
    pub files_processed: usize,
}

/// Processes every matching file under `root` with `process_file`.
///
/// Each file runs inside its own unit of work and is committed before the
/// next one starts. The first failure rolls back the failing file and stops
/// the batch; files committed before it stay committed.
pub fn process_data<F>(
    sink: &dyn WarehouseSink,
    root: &Path,
    extension: &str,
    mut process_file: F,
    reporter: &mut dyn ProgressReporter,
) -> Result<BatchReport, EtlError>
where
    F: FnMut(&dyn WarehouseSink, &Path) -> Result<(), EtlError>,
{
    let files = discover_files(root, extension)?;
    let total = files.len();
    info!("Processing {} files from {}", total, root.display());
    reporter.files_found(total, root);

    for (index, path) in files.iter().enumerate() {
        debug!("Processing {}", path.display());
        sink.begin_unit().map_err(|e| EtlError::File {
            path: path.clone(),
            source: Box::new(EtlError::from(e)),
        })?;

        let outcome = process_file(sink, path)
            .and_then(|()| sink.commit_unit().map_err(EtlError::from));
        if let Err(e) = outcome {
            if let Err(rollback_err) = sink.rollback_unit() {
                error!(
                    "Failed to roll back {}: {:#}",
                    path.display(),
                    rollback_err
                );
            }
            return Err(EtlError::File {
                path: path.clone(),
                source: Box::new(e),
            });
        }

        reporter.file_processed(index + 1, total, path);
    }

    Ok(BatchReport {
        root: root.to_path_buf(),
        files_processed: total,
    })
}

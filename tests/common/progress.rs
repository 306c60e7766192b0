use sparkify_etl::etl::ProgressReporter;
use std::path::Path;

#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub found: Vec<usize>,
    pub processed: Vec<(usize, usize)>,
}

impl ProgressReporter for RecordingProgress {
    fn files_found(&mut self, total: usize, _root: &Path) {
        self.found.push(total);
    }

    fn file_processed(&mut self, processed: usize, total: usize, _path: &Path) {
        self.processed.push((processed, total));
    }
}

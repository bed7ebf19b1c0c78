pub const DEFAULT_QUEUE_PREFIX: &str = "seed_sweep_";
pub const FIFO_QUEUE_SUFFIX: &str = ".fifo";
pub const SUMMARY_FILE_NAME: &str = "block-info.json";

/// Name of the ordered, deduplicating queue dedicated to one job.
pub fn queue_name(prefix: &str, job_id: &str) -> String {
    format!("{prefix}{job_id}{FIFO_QUEUE_SUFFIX}")
}

/// Location of a job's dispatch summary as `(path segments, file name)`.
pub fn summary_location(job_id: &str) -> (Vec<String>, &'static str) {
    (vec![job_id.to_string()], SUMMARY_FILE_NAME)
}

/// Joins path segments and a file name into one object key, dropping empty
/// segments and redundant slashes.
pub fn object_key<S: AsRef<str>>(segments: &[S], file_name: &str) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .chain(std::iter::once(file_name))
        .flat_map(|segment| segment.split('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

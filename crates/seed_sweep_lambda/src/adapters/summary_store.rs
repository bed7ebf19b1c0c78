pub trait SummaryStore {
    fn write(&self, segments: &[String], file_name: &str, body: &[u8]) -> Result<(), String>;
}

pub trait DispatchInvoker {
    /// Starts the dispatch function for one job without waiting for it to finish.
    fn invoke_dispatch_async(&self, payload: &[u8]) -> Result<(), String>;
}

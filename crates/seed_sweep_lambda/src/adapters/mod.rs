pub mod invoke;
pub mod queue;
pub mod summary_store;

pub mod dispatch;
pub mod start;

pub mod dispatch;
pub mod payload;

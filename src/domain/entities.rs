pub mod forms;
pub mod notification;
pub mod rate_limit;

pub mod forms;
pub mod home;
pub mod json_error;
pub mod send_email;
pub mod system;

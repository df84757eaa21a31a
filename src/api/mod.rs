pub mod attendance;
pub mod notification;
pub mod reports;

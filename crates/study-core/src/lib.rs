pub mod board_api;
pub mod content;
pub mod error;
pub mod formatter;
pub mod model;
pub mod navigation;
pub mod notification;
pub mod scheduler;
pub mod session;
pub mod view_state;

pub mod classes;
pub mod core;
pub mod notifications;
pub mod schedule;
pub mod session;
pub mod setup;
pub mod slots;
pub mod students;

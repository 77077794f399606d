pub mod booking;
pub mod chat;
pub mod lead;
pub mod visitor;

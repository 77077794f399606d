pub mod auth;
pub mod bookings;
pub mod chat;
pub mod export;
pub mod leads;
pub mod visitors;

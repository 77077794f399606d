pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod visitor_repo;
pub use visitor_repo::VisitorRepository;

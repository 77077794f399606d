pub mod booking_service;
pub use booking_service::BookingService;
pub mod chat_service;
pub use chat_service::{AiResponder, GeminiClient};
pub mod lead_service;
pub use lead_service::LeadService;
pub mod visitor_service;
pub use visitor_service::VisitorService;

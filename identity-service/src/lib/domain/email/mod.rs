pub mod errors;
pub mod models;
pub mod ports;

pub use errors::EmailError;
pub use models::EmailMessage;
pub use ports::EmailSender;

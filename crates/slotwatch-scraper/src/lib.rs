pub mod error;
pub mod extract;
pub mod transport;
pub mod user_agent;

pub use error::{ExtractionError, TransportError};
pub use extract::{CalendarExtractor, SlotExtractor};
pub use transport::{ControlChannel, HttpFetcher, RawResponse, TorTransport, Transport};

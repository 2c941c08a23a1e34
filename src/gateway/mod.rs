//! Gateway core and its HTTP surface

mod router;
mod server;
mod service;

pub use router::{AppState, INVALID_PARAMETERS_MESSAGE, SEND_ACTION, SendParams, create_router};
pub use server::Gateway;
pub use service::{DEFAULT_SENDER_ID, DeliveryRequest, HandleOutcome, SmsGateway};

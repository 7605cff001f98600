mod chat;
mod detail;
mod discovery;
mod error;
mod intake;

pub use chat::{ChatFlow, ChatSession, CHAT_GREETING};
pub use detail::load_service_detail;
pub use discovery::{ServiceDiscoveryGate, FALLBACK_RESULT_COUNT};
pub use error::SessionError;
pub use intake::{resolve_device_location, resolve_manual_location, Intake};

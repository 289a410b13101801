//! Validated types for requests, responses and session state.

mod base_url;
mod descriptor;
mod envelope;
mod method;
mod session_state;
mod template;

pub use base_url::BaseUrl;
pub use descriptor::RequestDescriptor;
pub use envelope::{ErrorCode, ResponseEnvelope, is_envelope};
pub use method::Method;
pub use session_state::AuthSessionState;
pub use template::{placeholders, resolve_template};

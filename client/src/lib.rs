//! Client side of the EV-charging back-office API.
//!
//! - [`Gateway`] sends authenticated calls and renews an expired session
//!   once per call;
//! - [`session`] keeps the token pair;
//! - [`sync`] keeps paginated, filtered list views in step with the backend;
//! - [`resources`] holds the typed per-resource handles.

pub use self::envelope::{Envelope, EnvelopeValue, PageInfo, PagedResult};
pub use self::error::ApiError;
pub use self::gateway::{
    Gateway, GatewayBuilder, NavigationPort, REQUEST_ID_HEADER, RequestDescriptor,
};
pub use self::session::{
    AccessClaims, FileSessionStore, MemorySessionStore, SessionStore, TokenPair,
};

pub mod envelope;
pub mod error;
pub mod gateway;
pub mod resources;
pub mod session;
pub mod sync;

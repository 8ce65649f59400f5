//! Client side of chatline: issues the session credential, sends messages
//! through the proxy and assembles streamed replies into the thread store.

pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use session::ChatSession;
pub use transport::{
    ByteStream, ConversationTransport, HttpTransport, OutgoingMessage, SendRequest,
    SessionRequest, WorkflowRef,
};

//! Interlude Core Library
//!
//! Correlates asynchronous user choices with the code waiting on them. A
//! caller starts an interaction and gets back a short token to embed in the
//! buttons it shows; when a press comes back carrying that token, the store
//! records the selection and resumes the registered continuation exactly once.
//! Unanswered interactions expire, and the whole store is snapshotted to disk
//! so pending interactions survive a restart.

pub mod clock;
pub mod config;
pub mod continuation;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod markup;
pub mod persistence;
pub mod reporter;
pub mod service;
pub mod session;
pub mod sweeper;
pub mod token;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{InterludeConfig, LoggingConfig, SweepConfig};
pub use continuation::{ContinuationRegistry, OnResolved, ResumeAction, from_fn};
pub use dispatcher::{DispatchOutcome, ResolutionDispatcher};
pub use error::{InterludeError, InterludeResult, UnifiedError};
pub use event::InboundEvent;
pub use markup::{ChoiceButton, ChoiceKeyboard};
pub use persistence::PersistenceGateway;
pub use reporter::{ErrorReporter, TracingReporter};
pub use service::CallbackService;
pub use session::{
    BoundTransport, ChoiceOption, NewSession, Resolution, SessionEntry, SessionState,
    SessionStore, StoreSnapshot,
};
pub use sweeper::ExpirySweeper;
pub use token::{CallbackPayload, PAYLOAD_SEPARATOR, Token, TokenGenerator};

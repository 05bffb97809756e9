//! Structured streaming response handling: accumulate an incremental model
//! response, recover a JSON object from it, and validate against a declared
//! output shape.

pub mod accumulator;
pub mod recovery;
pub mod resolver;
pub mod session;
pub mod shape;

pub use resolver::{ErrorKind, ErrorRecord, ResolvedRecord};
pub use session::{AgentSession, SessionEvent};
pub use shape::{FieldKind, OutputShape};

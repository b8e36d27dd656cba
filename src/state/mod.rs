//! Shared crawl-session state
//!
//! Everything that concurrently running crawl tasks mutate lives here, wrapped
//! in one explicit [`Session`] object that is created with the service and
//! passed by reference to the dispatcher and the monitor.
//!
//! # Components
//!
//! - `DedupRegistry`: the claimed-in-flight and visited URL sets
//! - `TaskCounter`: an in-flight counter that can be awaited until it drains
//! - `Session`: registry, session-wide task counter and shutdown signals

mod counter;
mod registry;
mod session;

// Re-export main types
pub use counter::TaskCounter;
pub use registry::DedupRegistry;
pub use session::{Session, SessionStatus};

//! floorwatch - client runtime for live factory-floor dashboards
//!
//! Two pieces shared by every dashboard view:
//!
//! - [`stream`]: a server-sent event subscription that parses JSON messages,
//!   reports its lifecycle and reconnects with capped exponential backoff.
//! - [`identity`]: a "who am I" lookup with a TTL cache and a single shared
//!   request in flight.
//!
//! [`config`] resolves backend endpoints and tunables; [`cli`] drives both
//! pieces from the command line.

pub mod cli;
pub mod config;
pub mod identity;
pub mod logging;
pub mod stream;

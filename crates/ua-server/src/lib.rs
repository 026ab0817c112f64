//! OPC-UA internal server runtime.
//!
//! Wraps [`ua_core`]'s session logic with the pieces that need a process:
//! the system clock and OS randomness, a background worker for the server
//! clock, and in-memory collaborators to run against.
//!
//! # Components
//!
//! - [`InternalServer`]: session factory, discovery registry, endpoint
//!   list, server status and history toggles
//! - [`Scheduler`]: single-worker runtime for repeating jobs
//! - [`SystemEnv`]: production environment (wall clock, crypto RNG)
//! - [`memory`]: address space, subscription engine and history store held
//!   in memory
//! - [`ServerConfig`]: configuration with defaults for every field

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod memory;
mod scheduler;
mod server;
mod system_env;

pub use config::{DEFAULT_ENDPOINT_URL, DEFAULT_NAMESPACE_URI, ServerConfig};
pub use error::ServerError;
pub use memory::{MemoryBackend, Retention};
pub use scheduler::{Scheduler, SchedulerError};
pub use server::{INTERNAL_SESSION_NAME, InternalServer};
pub use system_env::SystemEnv;

//! Delegation coach core library: bot API messaging with an offline fallback,
//! conversation sessions, and the delegation-instruction generator.

pub mod config;
pub mod fallback;
pub mod init;
pub mod messaging;
pub mod planner;
pub mod session;

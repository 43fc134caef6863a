//! Backend library for the MedHire healthcare job board.
//!
//! The `board` module owns the domain: jobs, seeker and employer profiles,
//! the application lifecycle engine, employer stat aggregation, and the
//! notification/email fan-out. Storage, email delivery, file uploads, and
//! token verification are traits implemented by the service crate.

pub mod board;
pub mod config;
pub mod error;
pub mod telemetry;

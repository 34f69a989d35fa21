//! Application services.
//!
//! Operations that span several tables or need a transaction live here;
//! handlers call into them with a locked connection.

pub mod backup;
pub mod study;
pub mod transfer;

//! Business rules between the HTTP handlers and storage.
//!
//! Every function takes the storage by its trait so the rules can run on any
//! backend that implements it.

pub mod catalog;
pub mod films;
pub mod users;

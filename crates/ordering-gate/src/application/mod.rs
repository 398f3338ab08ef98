//! Application layer: the gate itself, its commit link and its outbound
//! stream.

pub mod commit_link;
pub mod service;
pub mod stream;

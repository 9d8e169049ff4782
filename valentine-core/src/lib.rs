//! Valentine Core
//!
//! Core types and abstractions for the Valentine book.
//!
//! This crate contains:
//! - Domain types: tabs, page books, couple identifiers, statistics and the
//!   book cursor used to page through a tab
//! - DTOs: the cloud record and the backup document exchanged with storage

pub mod domain;
pub mod dto;
pub mod error;

pub use error::{CoreError, Result};

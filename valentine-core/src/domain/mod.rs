//! Core domain types
//!
//! This module contains the domain structures shared by the storage layer
//! and the command-line front end. They describe what a Valentine book is
//! (two tabs of fixed pages, owned by a couple) without knowing where it is
//! stored.

pub mod book;
pub mod couple;
pub mod pages;
pub mod stats;
pub mod tab;

//! Data Transfer Objects
//!
//! Shapes that leave the process: the record written to the cloud database
//! and the backup document the user downloads and re-uploads.

pub mod backup;
pub mod record;

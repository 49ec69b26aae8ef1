//! HTTP gateway for Cloudinary-hosted media assets
//!
//! Accepts uploads, lists and deletes assets through a small JSON API and
//! translates those calls to Cloudinary's upload and admin endpoints.

pub mod assets;
pub mod coordinator;
pub mod error;
pub mod mime;
pub mod models;
pub mod server;

pub use error::{Error, Result};

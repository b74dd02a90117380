//! stickies-core - Core library for Stickies
//!
//! This crate contains the note model, the store and blob storage
//! boundaries with their adapters, the note repository, and the per-screen
//! view state shared by every Stickies front end.

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod repository;
pub mod screens;
pub mod storage;
pub mod store;
pub mod util;

pub use error::{Error, ErrorKind, Result};
pub use models::{Note, PickedImage};
pub use repository::{CallPolicy, NoteRepository, RemoteNoteRepository};

//! Data models for Stickies

mod image;
mod note;

pub use image::PickedImage;
pub use note::{validate_required, Note};

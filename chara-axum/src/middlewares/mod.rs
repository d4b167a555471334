pub mod multipart;

pub use multipart::{CharacterForm, MultipartConfig};

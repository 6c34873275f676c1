//! file/mod.rs
//! The password file as a whole: path, password, file handle and the loaded tree.

pub mod password_file;
pub mod export;

pub use password_file::*;
pub use export::render_text;

pub mod truncation;
pub mod url;

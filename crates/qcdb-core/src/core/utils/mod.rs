pub mod elements;
pub mod text;

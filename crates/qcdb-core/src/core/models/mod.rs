pub mod catalog;
pub mod geometry;
pub mod stage;
pub mod status;
pub mod structure;

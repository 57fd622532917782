pub mod admin;
pub mod analysis;
pub mod public;

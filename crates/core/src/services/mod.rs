pub mod analysis;
pub mod sources;

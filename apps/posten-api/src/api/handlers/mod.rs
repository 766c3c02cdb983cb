pub mod delivery;
pub mod meta;

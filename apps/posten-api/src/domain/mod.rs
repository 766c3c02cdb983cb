// Domain layer module exports
// Domain is independent of HTTP and transport concerns

pub mod delivery;
pub mod postal_code;
pub mod token;

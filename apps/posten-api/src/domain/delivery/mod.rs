pub mod dates;
pub mod failure;
pub mod gateway;
pub mod service;

pub use dates::{DeliveryDates, InvalidPayload};
pub use failure::{FailureOrigin, Stage, UpstreamFailure};
pub use gateway::PostenGateway;
pub use service::DeliveryService;

// Infrastructure layer module
// Adapters for the Posten upstream and in-process state

pub mod daily_cache;
pub mod posten_client;
pub mod retry;
pub mod token_scraper;
pub mod upstream_status;

pub use posten_client::{PostenClient, Timeouts};
pub use retry::RetryPolicy;
pub use upstream_status::UpstreamStatus;

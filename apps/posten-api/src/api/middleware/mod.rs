pub mod forwarded;

pub use forwarded::UrlRoot;

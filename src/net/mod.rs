pub mod fetch;
pub mod safety;

pub use fetch::PageFetcher;
pub use safety::{SafeTarget, UrlGuard};

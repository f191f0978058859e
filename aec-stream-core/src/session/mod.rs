pub mod canceller;
pub mod endpoint;
pub mod shared;

//! Java and Spring knowledge for chainscope: the default configuration
//! preset and controller endpoint discovery.

pub mod endpoints;
pub mod preset;

pub use endpoints::{Endpoint, HttpMethod, discover};
pub use preset::preset;

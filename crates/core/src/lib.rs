pub mod error;
pub mod logging;

pub mod analysis;
pub mod config;
pub mod filter;
pub mod generics;
pub mod index;
pub mod registry;
pub mod resolver;
pub mod tree;

pub use analysis::Analyzer;
pub use config::{AnalysisConfig, ConfigFile, RawGenericPolicy};
pub use error::{ChainscopeError, ConfigError, Result};
pub use filter::IgnoreFilter;
pub use index::{IndexBuilder, SymbolIndex};

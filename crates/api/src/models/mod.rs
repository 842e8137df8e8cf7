pub mod naming;
pub mod source;
pub mod tree;
pub mod types;

pub use naming::EntryRef;
pub use source::*;
pub use tree::*;
pub use types::TypeRef;

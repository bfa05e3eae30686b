mod arena;
mod core;
mod node;
mod ops;
mod plugin;
mod query;
mod serde_value;
mod transforms;

pub use crate::arena::*;
pub use crate::core::*;
pub use crate::node::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::query::*;
pub use crate::serde_value::*;
pub use crate::transforms::*;

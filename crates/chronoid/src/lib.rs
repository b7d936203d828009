mod codec;
mod entropy;
mod error;
mod factory;
mod generator;
mod id;
mod lock;
mod sequence;
pub mod serde;
mod time;

pub use crate::codec::*;
pub use crate::entropy::*;
pub use crate::error::*;
pub use crate::factory::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::lock::*;
pub use crate::sequence::*;
pub use crate::time::*;

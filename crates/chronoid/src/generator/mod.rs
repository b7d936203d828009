mod monotonic;
mod snowflake;

pub use monotonic::MonotonicRandom;
pub use snowflake::{IdGenStatus, SnowflakeGenerator, SnowflakeLayout};

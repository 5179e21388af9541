#[macro_use]
extern crate async_trait;
#[macro_use]
extern crate tracing;

pub mod aggregate;
pub mod assembler;
pub mod channel_set;
pub mod factory;
pub mod reconcile;
pub mod record;

#[macro_use]
extern crate async_trait;
#[macro_use]
extern crate tracing;

pub mod controller;
pub mod gap;
pub mod processor;

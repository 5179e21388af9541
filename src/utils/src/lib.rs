pub mod interval_set;
pub mod time;

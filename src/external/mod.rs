pub mod bar_source;
pub mod mock;
pub mod yahoo;

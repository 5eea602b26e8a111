//! contains utils used in reading genome lists and run parameters

pub mod files;
pub mod parameters;

pub use files::*;
pub use parameters::*;

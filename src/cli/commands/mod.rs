pub mod config;
pub mod run;

pub use config::*;
pub use run::*;

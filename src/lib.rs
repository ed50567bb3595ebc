// Bedtime - iterative children's story generator
// Library exports

pub mod config;
pub mod logging;
pub mod providers;
pub mod story;

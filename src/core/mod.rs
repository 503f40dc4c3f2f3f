pub mod count;
pub mod engine;
pub mod io;
pub mod model;
pub mod stats;

pub mod cache;
pub mod cli;
pub mod ctx;
pub mod dvh;
pub mod error;
pub mod grid;
pub mod io;
pub mod mask;
pub mod math;
pub mod metrics;
pub mod models;
pub mod params;
pub mod pipeline;
pub mod schema;
pub mod session;

pub use error::{EngineError, StructureError};

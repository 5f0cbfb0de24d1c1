pub mod normal;
pub mod stats;

pub mod config;
pub mod engine;
pub mod entity;
pub mod lod;
pub mod merge_distance;
pub mod point;
pub mod snapshot;
pub mod visuals;

pub use config::*;
pub use entity::*;
pub use lod::*;
pub use point::*;
pub use snapshot::*;

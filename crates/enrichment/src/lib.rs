pub mod cache;
pub mod pipeline;
pub mod request;
pub mod state;
pub mod summarizer;

pub use cache::*;
pub use pipeline::*;
pub use request::*;
pub use state::*;
pub use summarizer::*;

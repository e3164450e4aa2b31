pub mod builder;
pub mod model;

pub use builder::FileBuilder;
pub use model::{File, FileState, Status, VideoMetadata};

pub mod model;

pub use model::{GoogleSearchConfig, Tool};

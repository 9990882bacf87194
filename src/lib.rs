pub mod import;
pub mod model;
pub mod traits;

// Re-export common types for convenience
pub use import::*;
pub use model::*;
pub use traits::*;

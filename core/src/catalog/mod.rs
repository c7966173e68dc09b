mod traits;
mod types;

pub use traits::Catalog;
pub use types::CompletedFile;

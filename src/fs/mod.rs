mod mock;
mod real;
mod r#trait;
mod tree;

pub use mock::MockFileSystem;
pub use r#trait::{FileSystem, FileType};
pub use real::RealFileSystem;
pub use tree::ProjectTree;

pub mod error;
pub mod repository;
pub mod revision;
pub mod tool;

pub use error::ScmError;
pub use repository::Repository;
pub use revision::Revision;
pub use tool::ScmTool;

pub mod file_access;

pub use file_access::FileAccess;

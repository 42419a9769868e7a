pub mod reading;
pub mod tasks;

pub use reading::{ContentReader, RawContent, ReadingStrategy, ReadingStrategySet};
pub use tasks::{TaskStrategy, TaskStrategySet};

pub mod manager;

pub use manager::PipelineStore;

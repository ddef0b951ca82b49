pub mod relay;
pub mod scheduler;

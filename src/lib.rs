pub mod batch;
pub mod cli;
pub mod executor;
pub mod hosts;
pub mod security;
pub mod ssh;
pub mod utils;

pub use batch::CommandBatch;
pub use cli::Cli;
pub use executor::{ExecutionResult, ParallelExecutor, ResultSink, SessionRunner};
pub use hosts::HostTarget;

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod pipeline;
pub mod state;

pub mod agent;
pub mod cli;
pub mod context;
pub mod core;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

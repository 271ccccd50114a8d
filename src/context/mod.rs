//! Prompt construction for the reply chain.

pub mod prompt;

pub use prompt::Persona;

//! The email reply chain.

pub mod email;

pub use email::{ChainOptions, DraftedReply, EmailReplyChain};

//! Agent module for askcsv
//!
//! This module contains the agent that answers questions about the dataset
//! by calling table tools, and the per-question conversation it keeps.

pub mod conversation;
pub mod core;

pub use conversation::Conversation;
pub use core::{Agent, QueryOutcome};

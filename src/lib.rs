//! Retrieval-augmented question answering for Kubernetes support.
//!
//! A query is embedded, the nearest passages are fetched from a vector
//! index, and a hosted chat model answers from those passages only.

pub mod client;
pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod vector_math;

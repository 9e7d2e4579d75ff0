//! Mail Lens: normalize provider email records and run them through a
//! local LLM for translation and financial analysis.

pub mod config;
pub mod error;
pub mod llm;
pub mod mail;
pub mod pipeline;
pub mod server;

//! # querynote
//!
//! Conversational SQL analysis with publishing to a document workspace.
//!
//! A reasoning engine answers questions about a relational database using
//! the tools of two MCP providers: a query-execution server and a
//! document-publishing server. When an utterance asks for the result to be
//! saved or sent, the answer is published as a page, split into blocks of
//! at most 2000 characters, with per-block failure recovery.
//!
//! ## Modules
//!
//! - [`core`]: publish trigger detection and text segmentation
//! - [`publish`]: workspace HTTP client and the document publisher
//! - [`mcp`]: tool-provider gateway and the built-in workspace MCP server
//! - [`agent`]: reasoning engine, session memory and conversation orchestrator
//! - [`cli`]: command-line interface
//! - [`error`]: error types

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod mcp;
pub mod publish;

pub use error::{Error, Result};

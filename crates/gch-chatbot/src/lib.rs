//! # gch-chatbot
//!
//! Forwards visitor messages to the n8n chatbot webhook and normalises the
//! loosely-typed replies it sends back. Delivery never fails from the
//! caller's point of view: any problem yields the configured apology.

pub mod client;
pub mod reply;
pub mod request;

pub use client::{ChatReply, ChatbotClient};
pub use request::{Attachment, ChatRequest, ProjectContext};

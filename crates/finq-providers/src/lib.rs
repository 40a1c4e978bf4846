//! finq-providers: reasoning service implementations for finq
//!
//! This crate provides implementations of the Provider trait for chat
//! completion APIs.

pub mod openai;

pub use openai::OpenAIProvider;

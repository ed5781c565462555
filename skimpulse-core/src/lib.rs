//! Core types for Skimpulse
//!
//! This crate defines the shared data structures used across the workspace:
//! the article record and the bounded, ordered article list.

pub mod article;

pub use article::{Article, ArticleList, MAX_ARTICLES};

//! Boolean query construction for the patent search service
//!
//! Keyword groups (user keywords, AI suggestions, synonym expansions) are
//! rendered into a single AND/OR expression:
//!
//! ```text
//! (semiconductor OR chip) AND (probe) AND (automated)
//! ```
//!
//! The same expression is applied to the title, abstract and claims fields.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod builder;

pub use builder::{sanitize_term, QueryBuilder};

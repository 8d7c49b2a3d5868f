//! Application services: upstream reads, normalization and page assembly.

pub mod backend;
pub mod blog;
pub mod chrome;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod page;
pub mod pagination;
pub mod render;
pub mod search;

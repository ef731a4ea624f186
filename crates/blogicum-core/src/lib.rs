//! # Blogicum Core
//!
//! The domain layer of the Blogicum blog.
//! Entities, repository ports, the post query composer, pagination and the
//! ownership guard. No infrastructure dependencies live here.

pub mod domain;
pub mod error;
pub mod guard;
pub mod pagination;
pub mod ports;
pub mod query;

pub use error::DomainError;
pub use guard::{Actor, Authorization};
pub use pagination::{DEFAULT_PAGE_SIZE, Page, PageRequest, Paginator};
pub use query::{PostCard, PostQuery};

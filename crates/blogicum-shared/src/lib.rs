//! # Blogicum Shared
//!
//! Wire types shared by the server and its rendering front-end: submitted
//! forms, view-models and response envelopes.

pub mod dto;
pub mod forms;
pub mod response;

pub use forms::FormErrors;
pub use response::{ErrorResponse, TemplateResponse};

//! Naming template, unique-path allocation, and the composed subject.
//!
//! Data flow: the presentation layer mutates [`NamingSubject`] (sample
//! selection), the [`PathTemplate`] recomputes the canonical path, the
//! [`UniquePathAllocator`] resolves it against the filesystem and the result
//! is published as a `PathChanged` event.

pub mod allocator;
pub mod subject;
pub mod template;

pub use allocator::{UniqueCandidatePath, UniquePathAllocator};
pub use subject::NamingSubject;
pub use template::{date_stamp, PathTemplate};

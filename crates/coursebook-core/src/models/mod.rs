//! Data models for coursebook entities.
//!
//! This module contains the records shown in paginated lists:
//!
//! - `Student`: a person with an ordered list of enrolled courses
//! - `Course`, `CourseCategory`: course records grouped by category
//! - `Item`: the generic list item used by the plain list demo
//!
//! Every list entity implements [`Entity`]; anything that can be searched by
//! title implements [`Searchable`].

pub mod item;
pub mod student;

pub use item::Item;
pub use student::{Course, CourseCategory, Student};

use serde::{de::DeserializeOwned, Serialize};

/// A record that can appear in a paginated list.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Identifier, unique within an accumulated list.
    fn id(&self) -> &str;
}

/// A record with a display title that text search matches against.
pub trait Searchable {
    fn title(&self) -> &str;
}

/// A record that belongs to exactly one category.
pub trait Categorized {
    type Category: Copy + PartialEq;

    fn category(&self) -> Self::Category;
}

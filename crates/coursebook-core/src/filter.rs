//! Search and grouping for list display.

use crate::models::{Categorized, Course, CourseCategory, Searchable};

/// A named group of entities for sectioned rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a, C, T> {
    pub category: C,
    pub entities: Vec<&'a T>,
}

impl<C, T> Section<'_, C, T> {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Case-insensitive substring match on title. A blank query matches everything.
///
/// Only the blank check trims; a non-blank query is matched as typed.
pub fn filter_by_text<'a, T: Searchable>(entities: &'a [T], query: &str) -> Vec<&'a T> {
    if query.trim().is_empty() {
        return entities.iter().collect();
    }
    let needle = query.to_lowercase();
    entities
        .iter()
        .filter(|e| e.title().to_lowercase().contains(&needle))
        .collect()
}

/// Group entities by category, keeping categories in first-seen order.
pub fn group_by_category<'a, T, I>(entities: I) -> Vec<Section<'a, T::Category, T>>
where
    T: Categorized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut sections: Vec<Section<'a, T::Category, T>> = Vec::new();
    for entity in entities {
        let category = entity.category();
        match sections.iter_mut().find(|s| s.category == category) {
            Some(section) => section.entities.push(entity),
            None => sections.push(Section {
                category,
                entities: vec![entity],
            }),
        }
    }
    sections
}

/// Courses matching `query`, grouped by category.
pub fn course_sections<'a>(courses: &'a [Course], query: &str) -> Vec<Section<'a, CourseCategory, Course>> {
    group_by_category(filter_by_text(courses, query))
}

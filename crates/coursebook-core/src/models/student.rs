use serde::{Deserialize, Serialize};

use super::{Categorized, Entity, Searchable};

/// Fixed set of course categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum CourseCategory {
    Programming,
    Design,
    Math,
    Science,
    Language,
    Business,
}

impl CourseCategory {
    pub const ALL: [CourseCategory; 6] = [
        CourseCategory::Programming,
        CourseCategory::Design,
        CourseCategory::Math,
        CourseCategory::Science,
        CourseCategory::Language,
        CourseCategory::Business,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            CourseCategory::Programming => "Programming",
            CourseCategory::Design => "Design",
            CourseCategory::Math => "Math",
            CourseCategory::Science => "Science",
            CourseCategory::Language => "Language",
            CourseCategory::Business => "Business",
        }
    }
}

impl std::fmt::Display for CourseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Course {
    /// Unique within the owning student
    pub id: String,
    pub title: String,
    pub category: CourseCategory,
    /// Display duration, e.g. "6 weeks"
    pub duration: String,
    pub credits: u32,
}

impl Searchable for Course {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Categorized for Course {
    type Category = CourseCategory;

    fn category(&self) -> CourseCategory {
        self.category
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub courses: Vec<Course>,
}

impl Student {
    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    pub fn total_credits(&self) -> u32 {
        self.courses.iter().map(|c| c.credits).sum()
    }

    /// Number of distinct categories across enrolled courses
    pub fn category_count(&self) -> usize {
        let mut seen: Vec<CourseCategory> = Vec::new();
        for course in &self.courses {
            if !seen.contains(&course.category) {
                seen.push(course.category);
            }
        }
        seen.len()
    }

    /// "1 course enrolled" / "3 courses enrolled"
    pub fn enrollment_summary(&self) -> String {
        let count = self.course_count();
        format!(
            "{} course{} enrolled",
            count,
            if count == 1 { "" } else { "s" }
        )
    }
}

impl Entity for Student {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Student {
    fn title(&self) -> &str {
        &self.name
    }
}

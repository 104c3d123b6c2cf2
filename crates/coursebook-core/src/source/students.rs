//! Mock student data source.
//!
//! Students are numbered by their position in the full list, so ids are
//! unique across pages. Names, emails and course selections are random; the
//! seeded variant derives a fresh RNG per page from its seed, which makes
//! every page reproducible regardless of fetch order.

use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{entity_number, simulate_latency, DataSource, Page};
use crate::config::Config;
use crate::error::FetchError;
use crate::models::{Course, CourseCategory, Student};

const FIRST_NAMES: &[&str] = &[
    "Alex", "Jordan", "Taylor", "Casey", "Morgan", "Riley", "Avery", "Quinn", "Blake", "Cameron",
    "Drew", "Emery", "Finley", "Hayden", "Jamie", "Kendall", "Logan", "Parker", "Reese", "Sage",
    "Skyler", "Sydney", "Tatum", "River",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White",
];

const EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "student.edu",
    "university.edu",
];

/// Length of the random suffix on course ids
const COURSE_ID_SUFFIX_LEN: usize = 9;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn course_titles(category: CourseCategory) -> &'static [&'static str] {
    match category {
        CourseCategory::Programming => &[
            "React Native Development",
            "JavaScript Fundamentals",
            "Python Programming",
            "Web Development",
            "Mobile App Development",
            "Data Structures",
            "Algorithms",
        ],
        CourseCategory::Design => &[
            "UI/UX Design",
            "Graphic Design",
            "Web Design",
            "Mobile Design",
            "Typography",
            "Color Theory",
            "Design Systems",
        ],
        CourseCategory::Math => &[
            "Calculus I",
            "Linear Algebra",
            "Statistics",
            "Discrete Mathematics",
            "Probability",
            "Differential Equations",
            "Number Theory",
        ],
        CourseCategory::Science => &[
            "Physics I",
            "Chemistry",
            "Biology",
            "Environmental Science",
            "Astronomy",
            "Geology",
            "Computer Science",
        ],
        CourseCategory::Language => &[
            "English Literature",
            "Spanish",
            "French",
            "German",
            "Chinese",
            "Japanese",
            "Creative Writing",
        ],
        CourseCategory::Business => &[
            "Marketing",
            "Finance",
            "Management",
            "Entrepreneurship",
            "Economics",
            "Accounting",
            "Business Strategy",
        ],
    }
}

fn pick<'a, R: Rng>(rng: &mut R, values: &[&'a str]) -> &'a str {
    values[rng.gen_range(0..values.len())]
}

fn random_suffix<R: Rng>(rng: &mut R) -> String {
    (0..COURSE_ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// 2-5 distinct categories with 1-3 distinct courses each.
fn generate_courses<R: Rng>(rng: &mut R) -> Vec<Course> {
    let num_categories = rng.gen_range(2..=5);
    let categories: Vec<CourseCategory> = CourseCategory::ALL
        .choose_multiple(rng, num_categories)
        .copied()
        .collect();

    let mut courses = Vec::new();
    for category in categories {
        let num_courses = rng.gen_range(1..=3);
        let titles: Vec<&str> = course_titles(category)
            .choose_multiple(rng, num_courses)
            .copied()
            .collect();

        for title in titles {
            courses.push(Course {
                id: format!("{}-{}-{}", category, title, random_suffix(rng)),
                title: title.to_string(),
                category,
                duration: format!("{} weeks", rng.gen_range(4..=11)),
                credits: rng.gen_range(2..=4),
            });
        }
    }
    courses
}

fn generate_student<R: Rng>(rng: &mut R, id: String) -> Student {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let domain = pick(rng, EMAIL_DOMAINS);

    Student {
        id,
        name: format!("{} {}", first, last),
        email: format!("{}.{}@{}", first.to_lowercase(), last.to_lowercase(), domain),
        courses: generate_courses(rng),
    }
}

/// Stable 64-bit mix of a string, used to seed per-student RNGs.
fn mix_id(id: &str) -> u64 {
    id.bytes()
        .fold(0xcbf2_9ce4_8422_2325, |acc, b| (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3))
}

#[derive(Debug, Clone)]
pub struct MockStudentSource {
    max_pages: u32,
    delay: Duration,
    student_delay: Duration,
    seed: Option<u64>,
}

impl MockStudentSource {
    /// Random students on every call.
    pub fn new(config: &Config) -> Self {
        Self {
            max_pages: config.max_pages,
            delay: config.fetch_delay(),
            student_delay: config.student_delay(),
            seed: None,
        }
    }

    /// Reproducible students: the same seed and page always yield the same data.
    pub fn seeded(config: &Config, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new(config)
        }
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    fn rng_for(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15)),
            None => StdRng::from_entropy(),
        }
    }

    /// Generate a page without delay. Pages past `max_pages` are empty.
    pub fn generate_page(&self, page: u32, page_size: usize) -> Vec<Student> {
        if page == 0 || page > self.max_pages {
            return Vec::new();
        }
        let mut rng = self.rng_for(page as u64);
        (0..page_size)
            .map(|i| generate_student(&mut rng, entity_number(page, page_size, i).to_string()))
            .collect()
    }

    /// Fetch a single student by id.
    pub async fn fetch_student(&self, id: &str) -> Result<Student, FetchError> {
        simulate_latency(self.student_delay).await;
        // Offset the stream so a student never shares an RNG with a page
        let mut rng = self.rng_for(mix_id(id).rotate_left(17));
        Ok(generate_student(&mut rng, id.to_string()))
    }
}

impl DataSource for MockStudentSource {
    type Entity = Student;

    fn fetch_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Page<Student>, FetchError>> + Send {
        async move {
            if page == 0 {
                return Err(FetchError::PageOutOfRange(page));
            }
            simulate_latency(self.delay).await;

            let entities = self.generate_page(page, page_size);
            debug!(page, count = entities.len(), "Generated students");
            Ok(Page {
                page,
                entities,
                has_more: page < self.max_pages,
            })
        }
    }
}

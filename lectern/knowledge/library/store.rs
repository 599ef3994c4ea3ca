use std::sync::Arc;

use indexmap::IndexMap;
use lectern_evidence::AnnotatedOutline;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::course::{Course, Lecture};

/// Outcome of adding a lecture to the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryUpdate {
    /// Course that received the lecture.
    pub course_id: Uuid,
    /// New lecture id.
    pub lecture_id: Uuid,
    /// True when no existing course matched.
    pub created_course: bool,
}

/// Thread-safe in-memory course library, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct CourseLibrary {
    courses: Arc<RwLock<IndexMap<Uuid, Course>>>,
}

impl CourseLibrary {
    /// Adds a processed lecture. It joins the course whose normalized name
    /// matches `outline.course_name`, or starts a new course.
    pub fn add_lecture(&self, outline: &AnnotatedOutline) -> LibraryUpdate {
        let lecture = Lecture::from_outline(outline);
        let lecture_id = lecture.id;
        let mut courses = self.courses.write();

        if let Some(course) = courses
            .values_mut()
            .find(|course| course.matches(&outline.course_name))
        {
            course.lectures.push(lecture);
            return LibraryUpdate {
                course_id: course.id,
                lecture_id,
                created_course: false,
            };
        }

        let course = Course::new(outline.course_name.clone(), lecture);
        let course_id = course.id;
        courses.insert(course_id, course);
        LibraryUpdate {
            course_id,
            lecture_id,
            created_course: true,
        }
    }

    /// Looks a course up by id.
    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<Course> {
        self.courses.read().get(id).cloned()
    }

    /// Looks a course up by loosely matched name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Course> {
        self.courses
            .read()
            .values()
            .find(|course| course.matches(name))
            .cloned()
    }

    /// Removes a course, returning it.
    pub fn remove(&self, id: &Uuid) -> Option<Course> {
        self.courses.write().shift_remove(id)
    }

    /// Snapshot of all courses.
    #[must_use]
    pub fn courses(&self) -> Vec<Course> {
        self.courses.read().values().cloned().collect()
    }

    /// Number of courses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.read().len()
    }

    /// True when no course has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.read().is_empty()
    }
}

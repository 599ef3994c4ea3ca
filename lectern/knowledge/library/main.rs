//! Course library: the course → lecture → module → concept tree built from
//! processed lectures.

/// Tree node types.
pub mod course;
/// Shared in-memory library.
pub mod store;

pub use course::{normalize_course_name, Course, Lecture, LibraryConcept, LibraryModule};
pub use store::{CourseLibrary, LibraryUpdate};

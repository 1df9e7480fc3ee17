//! Course module - the enrollment side of a course.

mod aggregate;

pub use aggregate::Course;

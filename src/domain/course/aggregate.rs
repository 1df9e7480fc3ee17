//! Course record as seen by enrollment.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, UserId};

/// A course. Authoring fields are maintained elsewhere; this side only
/// tracks who is enrolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub enrolled_students: Vec<UserId>,
}

impl Course {
    pub fn new(id: CourseId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            enrolled_students: Vec::new(),
        }
    }

    pub fn has_student(&self, user_id: &UserId) -> bool {
        self.enrolled_students.contains(user_id)
    }

    /// Adds the student unless already present. Returns true if it was added.
    pub fn enroll_student(&mut self, user_id: UserId) -> bool {
        if self.has_student(&user_id) {
            return false;
        }
        self.enrolled_students.push(user_id);
        true
    }
}

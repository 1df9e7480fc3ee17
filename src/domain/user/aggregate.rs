//! Local mirror of an identity-provider user.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, Timestamp, UserId};

/// Profile fields copied from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub image_url: String,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfileUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

impl From<UserProfile> for UserProfileUpdate {
    fn from(profile: UserProfile) -> Self {
        Self {
            email: Some(profile.email),
            name: Some(profile.name),
            image_url: Some(profile.image_url),
        }
    }
}

/// A marketplace user.
///
/// Profile fields belong to the identity provider; `enrolled_courses` is
/// owned by payment reconciliation and survives profile updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub image_url: String,
    pub enrolled_courses: Vec<CourseId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn new(id: UserId, profile: UserProfile) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            email: profile.email,
            name: profile.name,
            image_url: profile.image_url,
            enrolled_courses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_profile(&mut self, update: &UserProfileUpdate) {
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(image_url) = &update.image_url {
            self.image_url = image_url.clone();
        }
        self.updated_at = Timestamp::now();
    }

    pub fn is_enrolled_in(&self, course_id: &CourseId) -> bool {
        self.enrolled_courses.contains(course_id)
    }

    /// Adds the course unless already present. Returns true if it was added.
    pub fn enroll(&mut self, course_id: CourseId) -> bool {
        if self.is_enrolled_in(&course_id) {
            return false;
        }
        self.enrolled_courses.push(course_id);
        self.updated_at = Timestamp::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            UserId::new("user_1").unwrap(),
            UserProfile {
                email: "grace@example.com".to_string(),
                name: "Grace Hopper".to_string(),
                image_url: "https://img.example.com/g.png".to_string(),
            },
        )
    }

    #[test]
    fn enroll_is_idempotent() {
        let mut u = user();
        let course = CourseId::new("c1").unwrap();

        assert!(u.enroll(course.clone()));
        assert!(!u.enroll(course.clone()));

        assert_eq!(u.enrolled_courses, vec![course]);
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let mut u = user();
        u.apply_profile(&UserProfileUpdate {
            name: Some("Rear Admiral Hopper".to_string()),
            ..Default::default()
        });

        assert_eq!(u.name, "Rear Admiral Hopper");
        assert_eq!(u.email, "grace@example.com");
    }

    #[test]
    fn profile_update_keeps_enrollments() {
        let mut u = user();
        u.enroll(CourseId::new("c1").unwrap());

        u.apply_profile(&UserProfileUpdate::from(UserProfile {
            email: "new@example.com".to_string(),
            name: "G".to_string(),
            image_url: String::new(),
        }));

        assert_eq!(u.enrolled_courses.len(), 1);
        assert_eq!(u.email, "new@example.com");
    }
}

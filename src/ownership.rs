use crate::authentication::AuthUser;
use crate::errors::RequestError;
use crate::models::{Comment, PostRecord};

/// Anything with an author that only that author may mutate.
pub trait Authored {
    fn author_email(&self) -> &str;
}

impl Authored for PostRecord {
    fn author_email(&self) -> &str {
        &self.author_email
    }
}

impl Authored for Comment {
    fn author_email(&self) -> &str {
        &self.author_email
    }
}

pub fn can_mutate(principal: &AuthUser, resource: &impl Authored) -> bool {
    resource.author_email() == principal.email
}

/// Callers load the resource (and 404 on absence) before asking.
pub fn ensure_can_mutate(
    principal: &AuthUser,
    resource: &impl Authored,
    denial: &'static str,
) -> Result<(), RequestError> {
    if can_mutate(principal, resource) {
        Ok(())
    } else {
        tracing::info!(
            principal = %principal.email,
            author = %resource.author_email(),
            "ownership check denied"
        );
        Err(RequestError::Forbidden(denial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn principal(email: &str) -> AuthUser {
        AuthUser {
            id: 1,
            email: email.to_string(),
            name: None,
            profile_image: None,
        }
    }

    fn post_by(email: &str) -> PostRecord {
        PostRecord {
            id: 1,
            title: Some("t".to_string()),
            content: Some("c".to_string()),
            category: None,
            image_url: None,
            views: 0,
            claps: 0,
            created_at: Utc::now(),
            user_id: 1,
            author_name: None,
            author_email: email.to_string(),
            author_image: None,
        }
    }

    fn comment_by(email: &str) -> Comment {
        Comment {
            id: 1,
            content: "hi".to_string(),
            created_at: Utc::now(),
            post_id: 1,
            user_id: 1,
            author_name: None,
            author_email: email.to_string(),
            author_image: None,
        }
    }

    #[test]
    fn author_may_mutate() {
        let alice = principal("alice@example.com");
        assert!(can_mutate(&alice, &post_by("alice@example.com")));
        assert!(can_mutate(&alice, &comment_by("alice@example.com")));
        assert!(ensure_can_mutate(&alice, &post_by("alice@example.com"), "no").is_ok());
    }

    #[test]
    fn everyone_else_is_forbidden_for_every_resource_kind() {
        let bob = principal("bob@example.com");
        for author in ["alice@example.com", "ALICE@example.com", ""] {
            assert!(matches!(
                ensure_can_mutate(&bob, &post_by(author), "no"),
                Err(RequestError::Forbidden("no"))
            ));
            assert!(matches!(
                ensure_can_mutate(&bob, &comment_by(author), "no"),
                Err(RequestError::Forbidden("no"))
            ));
        }
    }
}

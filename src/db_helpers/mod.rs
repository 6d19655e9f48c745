use sqlx::SqlitePool;

mod comment_helpers;
mod contact_helpers;
mod draft_helpers;
mod post_helpers;
mod subscriber_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use contact_helpers::*;
pub use draft_helpers::*;
pub use post_helpers::*;
pub use subscriber_helpers::*;
pub use user_helpers::*;

pub(crate) const POSTS_TABLE: &str = "blog_posts";
pub(crate) const DRAFTS_TABLE: &str = "draft_posts";

/// Collects `column = ?` assignments for a partial `UPDATE`; absent values are skipped.
struct QueryBuilder {
    query: String,
    params: Vec<String>,
    seperator: &'static str,
}

impl QueryBuilder {
    fn update(table: &str) -> Self {
        Self {
            query: format!("UPDATE {table} SET "),
            params: Vec::new(),
            seperator: ", ",
        }
    }

    fn add_param(mut self, column: &str, param: Option<String>) -> Self {
        if let Some(value) = param {
            if !self.params.is_empty() {
                self.query.push_str(self.seperator);
            }
            self.query.push_str(column);
            self.query.push_str(" = ?");
            self.params.push(value);
        }
        self
    }

    /// `None` when there is nothing to assign.
    fn build(mut self, id: i64) -> Option<(String, Vec<String>, i64)> {
        if self.params.is_empty() {
            return None;
        }
        self.query.push_str(" WHERE id = ?");
        Some((self.query, self.params, id))
    }

    async fn execute(self, pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
        let (query, params, id) = match self.build(id) {
            Some(parts) => parts,
            None => return Ok(0),
        };
        let mut query = sqlx::query(&query);
        for param in params {
            query = query.bind(param);
        }
        let result = query.bind(id).execute(pool).await?;
        Ok(result.rows_affected())
    }
}

/// Post-with-author projection shared by published posts and drafts.
fn record_query(table: &str) -> String {
    format!(
        r#"
        SELECT {table}.id         AS id,
               {table}.title      AS title,
               {table}.content    AS content,
               {table}.category   AS category,
               {table}.image_url  AS image_url,
               {table}.views      AS views,
               {table}.claps      AS claps,
               {table}.created_at AS created_at,
               {table}.user_id    AS user_id,
               users.name          AS author_name,
               users.email         AS author_email,
               users.profile_image AS author_image
        FROM   {table}
               JOIN users
                 ON users.id = {table}.user_id
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_skips_absent_values() {
        let (query, params, id) = QueryBuilder::update("blog_posts")
            .add_param("title", Some("New".to_string()))
            .add_param("content", None)
            .add_param("category", Some("rust".to_string()))
            .build(4)
            .unwrap();
        assert_eq!(query, "UPDATE blog_posts SET title = ?, category = ? WHERE id = ?");
        assert_eq!(params, vec!["New".to_string(), "rust".to_string()]);
        assert_eq!(id, 4);
    }

    #[test]
    fn builder_without_values_builds_nothing() {
        assert!(QueryBuilder::update("users")
            .add_param("name", None)
            .build(1)
            .is_none());
    }
}

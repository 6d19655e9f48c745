mod payload;
mod request;
mod response;
mod wrapper;

pub use payload::*;
pub use request::*;
pub use response::*;
pub use wrapper::*;

use std::collections::HashMap;

use crate::errors::RequestError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(RequestError::bad_request(format!(
                "Invalid sort direction: {value}"
            ))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Columns a post listing may be ordered by. Anything else never reaches SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSortField {
    CreatedAt,
    Title,
    Views,
    Claps,
    Category,
    Id,
}

impl PostSortField {
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        match value {
            "createdAt" | "created_at" => Ok(PostSortField::CreatedAt),
            "title" => Ok(PostSortField::Title),
            "views" => Ok(PostSortField::Views),
            "claps" => Ok(PostSortField::Claps),
            "category" => Ok(PostSortField::Category),
            "id" => Ok(PostSortField::Id),
            _ => Err(RequestError::bad_request(format!("Invalid sort field: {value}"))),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            PostSortField::CreatedAt => "created_at",
            PostSortField::Title => "title",
            PostSortField::Views => "views",
            PostSortField::Claps => "claps",
            PostSortField::Category => "category",
            PostSortField::Id => "id",
        }
    }
}

/// Zero-based page of a post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: PostSortField,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: PostSortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl PageRequest {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, RequestError> {
        let mut request = PageRequest::default();
        if let Some(page) = params.get("page") {
            request.page = parse_number("page", page)?;
        }
        if let Some(size) = params.get("size") {
            request.size = parse_number("size", size)?;
        }
        if request.page < 0 {
            return Err(RequestError::bad_request("page must not be negative"));
        }
        if request.size < 1 {
            return Err(RequestError::bad_request("size must be positive"));
        }
        if let Some(sort) = params.get("sortBy") {
            request.sort = PostSortField::parse(sort)?;
        }
        if let Some(direction) = params.get("direction") {
            request.direction = SortDirection::parse(direction)?;
        }
        Ok(request)
    }

    /// Rows to skip. Saturates, so a page far past the end is simply empty.
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    /// `ORDER BY` clause; ties fall back to id so pages never overlap.
    pub fn order_by(&self, table: &str) -> String {
        let direction = self.direction.as_sql();
        if self.sort == PostSortField::Id {
            format!("{table}.id {direction}")
        } else {
            format!(
                "{table}.{} {direction}, {table}.id {direction}",
                self.sort.column()
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Name,
    Email,
    Id,
}

impl UserSortField {
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        match value {
            "name" => Ok(UserSortField::Name),
            "email" => Ok(UserSortField::Email),
            "id" => Ok(UserSortField::Id),
            _ => Err(RequestError::bad_request(format!("Invalid sort field: {value}"))),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            UserSortField::Name => "name",
            UserSortField::Email => "email",
            UserSortField::Id => "id",
        }
    }
}

/// Page of a user search. Out-of-range values are clamped instead of rejected:
/// a negative page becomes 0 and a size outside `1..=100` becomes 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: UserSortField,
    pub direction: SortDirection,
}

impl UserPageRequest {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, RequestError> {
        let mut page = match params.get("page") {
            Some(page) => parse_number("page", page)?,
            None => 0,
        };
        let mut size = match params.get("size") {
            Some(size) => parse_number("size", size)?,
            None => DEFAULT_PAGE_SIZE,
        };
        if page < 0 {
            page = 0;
        }
        if !(1..=100).contains(&size) {
            size = DEFAULT_PAGE_SIZE;
        }
        let sort = match params.get("sortBy") {
            Some(sort) => UserSortField::parse(sort)?,
            None => UserSortField::Name,
        };
        let direction = match params.get("direction") {
            Some(direction) => SortDirection::parse(direction)?,
            None => SortDirection::Asc,
        };
        Ok(UserPageRequest {
            page,
            size,
            sort,
            direction,
        })
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    pub fn order_by(&self) -> String {
        let direction = self.direction.as_sql();
        format!("{} {direction}, id {direction}", self.sort.column())
    }
}

pub fn parse_number(name: &str, value: &str) -> Result<i64, RequestError> {
    value
        .trim()
        .parse()
        .map_err(|_| RequestError::bad_request(format!("{name} must be a number")))
}

/// `ceil(total / size)`; an empty listing has zero pages.
pub fn page_count(total: i64, size: i64) -> i64 {
    if size <= 0 || total <= 0 {
        return 0;
    }
    total / size + i64::from(total % size != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn page_count_is_ceiling_division() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        for total in 0..60 {
            for size in 1..12 {
                let expected = (total as f64 / size as f64).ceil() as i64;
                assert_eq!(page_count(total, size), expected, "{total}/{size}");
            }
        }
        assert_eq!(page_count(7, i64::MAX), 1);
        assert_eq!(page_count(i64::MAX, i64::MAX), 1);
        assert_eq!(page_count(i64::MAX, 2), i64::MAX / 2 + 1);
    }

    #[test]
    fn huge_pages_saturate_instead_of_overflowing() {
        let max = i64::MAX.to_string();
        let request =
            PageRequest::from_params(&params(&[("page", max.as_str()), ("size", "2")])).unwrap();
        assert_eq!(request.offset(), i64::MAX);
        let request = PageRequest::from_params(&params(&[("size", max.as_str())])).unwrap();
        assert_eq!(request.offset(), 0);

        let request = UserPageRequest::from_params(&params(&[("page", max.as_str())])).unwrap();
        assert_eq!(request.offset(), i64::MAX);
    }

    #[test]
    fn defaults_are_newest_first_page_zero() {
        let request = PageRequest::from_params(&HashMap::new()).unwrap();
        assert_eq!(request, PageRequest::default());
        assert_eq!(
            request.order_by("blog_posts"),
            "blog_posts.created_at DESC, blog_posts.id DESC"
        );
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn explicit_paging_and_sort() {
        let request = PageRequest::from_params(&params(&[
            ("page", "2"),
            ("size", "5"),
            ("sortBy", "claps"),
            ("direction", "ASC"),
        ]))
        .unwrap();
        assert_eq!(request.offset(), 10);
        assert_eq!(
            request.order_by("blog_posts"),
            "blog_posts.claps ASC, blog_posts.id ASC"
        );
    }

    #[test]
    fn user_paging_clamps_instead_of_failing() {
        let request =
            UserPageRequest::from_params(&params(&[("page", "-3"), ("size", "500")])).unwrap();
        assert_eq!(request.page, 0);
        assert_eq!(request.size, DEFAULT_PAGE_SIZE);
        assert_eq!(request.order_by(), "name ASC, id ASC");

        let request = UserPageRequest::from_params(&params(&[
            ("page", "1"),
            ("size", "0"),
            ("sortBy", "email"),
            ("direction", "desc"),
        ]))
        .unwrap();
        assert_eq!(request.offset(), 10);
        assert_eq!(request.order_by(), "email DESC, id DESC");

        assert!(UserPageRequest::from_params(&params(&[("sortBy", "password")])).is_err());
    }

    #[test]
    fn unsafe_or_invalid_input_is_rejected() {
        for bad in [
            params(&[("sortBy", "title; DROP TABLE users")]),
            params(&[("direction", "sideways")]),
            params(&[("size", "0")]),
            params(&[("page", "-1")]),
            params(&[("page", "one")]),
        ] {
            assert!(matches!(
                PageRequest::from_params(&bad),
                Err(RequestError::BadRequest(_))
            ));
        }
    }
}

use serde::{Deserialize, Serialize};

use super::page_count;
use crate::models::CategoryCount;

/// Pagination envelope used by every post listing.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage<T> {
    pub content: Vec<T>,
    pub current_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> PostPage<T> {
    pub fn new(content: Vec<T>, current_page: i64, size: i64, total_items: i64) -> Self {
        PostPage {
            content,
            current_page,
            total_items,
            total_pages: page_count(total_items, size),
        }
    }

    pub fn empty(current_page: i64) -> Self {
        PostPage {
            content: Vec::new(),
            current_page,
            total_items: 0,
            total_pages: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryEntry {
    pub name: Option<String>,
    pub count: i64,
}

/// Category counts. Totals count distinct categories, not grouped rows.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPage {
    pub categories: Vec<CategoryEntry>,
    pub current_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl CategoryPage {
    pub fn new(rows: Vec<CategoryCount>, current_page: i64, size: i64, distinct: i64) -> Self {
        CategoryPage {
            categories: rows
                .into_iter()
                .map(|CategoryCount { name, count }| CategoryEntry { name, count })
                .collect(),
            current_page,
            total_items: distinct,
            total_pages: page_count(distinct, size),
        }
    }
}

/// Pagination envelope of the user search endpoints.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage<T> {
    pub content: Vec<T>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub size: i64,
    pub number: i64,
    pub empty: bool,
}

impl<T> UserPage<T> {
    pub fn new(content: Vec<T>, number: i64, size: i64, total_elements: i64) -> Self {
        UserPage {
            empty: content.is_empty(),
            content,
            total_elements,
            total_pages: page_count(total_elements, size),
            size,
            number,
        }
    }
}

//! Paginated list results

use serde::Serialize;

use super::entity::Entity;
use super::models::Pagination;

/// One page of entities
///
/// Built from `meta.pagination` when the server sent it. Otherwise the page
/// is the only one: `total` and `per_page` equal the number of items and
/// `current_page` is 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    items: Vec<Entity>,
    pagination: Pagination,
    #[serde(skip)]
    paginated: bool,
}

impl Page {
    pub fn new(items: Vec<Entity>, pagination: Option<Pagination>) -> Self {
        match pagination {
            Some(pagination) => Self {
                items,
                pagination,
                paginated: true,
            },
            None => {
                let count = items.len() as u64;
                Self {
                    items,
                    pagination: Pagination {
                        total: count,
                        per_page: count,
                        current_page: 1,
                    },
                    paginated: false,
                }
            }
        }
    }

    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Entity> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the counters came from the server
    pub fn is_paginated(&self) -> bool {
        self.paginated
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn total(&self) -> u64 {
        self.pagination.total
    }

    pub fn per_page(&self) -> u64 {
        self.pagination.per_page
    }

    pub fn current_page(&self) -> u64 {
        self.pagination.current_page
    }

    pub fn last_page(&self) -> u64 {
        let Pagination {
            total, per_page, ..
        } = self.pagination;
        if per_page == 0 {
            return 1;
        }
        total.div_ceil(per_page).max(1)
    }

    pub fn has_more(&self) -> bool {
        self.current_page() < self.last_page()
    }
}

impl IntoIterator for Page {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Page {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

use std::cmp::Ordering;

use crate::{
    Failure,
    domain::tour::{Difficulty, Tour},
};

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Duration,
    RatingsAverage,
    MaxGroupSize,
    Name,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    /// Parses a comma separated list such as `-price,ratingsAverage`.
    pub fn parse_list(raw: &str) -> Result<Vec<SortKey>, Failure> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (descending, name) = match part.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, part),
                };
                let field = match name {
                    "price" => SortField::Price,
                    "duration" => SortField::Duration,
                    "ratingsAverage" => SortField::RatingsAverage,
                    "maxGroupSize" => SortField::MaxGroupSize,
                    "name" => SortField::Name,
                    "createdAt" => SortField::CreatedAt,
                    _ => return Err(Failure::cast("sort", part, "SortKey")),
                };
                Ok(SortKey { field, descending })
            })
            .collect()
    }

    fn compare(&self, a: &Tour, b: &Tour) -> Ordering {
        let ordering = match self.field {
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Duration => a.duration.cmp(&b.duration),
            SortField::RatingsAverage => a.ratings_average.total_cmp(&b.ratings_average),
            SortField::MaxGroupSize => a.max_group_size.cmp(&b.max_group_size),
            SortField::Name => a.name.cmp(&b.name),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Filter, order and window for listing tours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourQuery {
    pub duration: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub sort: Vec<SortKey>,
    pub page: u32,
    pub limit: u32,
}

impl Default for TourQuery {
    fn default() -> Self {
        Self {
            duration: None,
            difficulty: None,
            sort: Vec::new(),
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TourQuery {
    /// Clamps page and limit into their accepted ranges.
    pub fn with_window(mut self, page: Option<u32>, limit: Option<u32>) -> Self {
        let mut limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            limit = DEFAULT_LIMIT;
        }
        if limit > MAX_LIMIT {
            limit = MAX_LIMIT;
        }
        self.limit = limit;
        self.page = page.unwrap_or(1).max(1);
        self
    }

    pub fn matches(&self, tour: &Tour) -> bool {
        self.duration.is_none_or(|d| tour.duration == d)
            && self.difficulty.is_none_or(|d| tour.difficulty == d)
    }

    /// Filters, sorts (newest first when no order is given) and pages `tours`.
    pub fn apply(&self, tours: impl IntoIterator<Item = Tour>) -> Vec<Tour> {
        let mut selected: Vec<Tour> = tours.into_iter().filter(|t| self.matches(t)).collect();
        if self.sort.is_empty() {
            selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        } else {
            selected.sort_by(|a, b| {
                self.sort
                    .iter()
                    .map(|key| key.compare(a, b))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }
        let skip = (self.page as usize - 1) * self.limit as usize;
        selected
            .into_iter()
            .skip(skip)
            .take(self.limit as usize)
            .collect()
    }
}

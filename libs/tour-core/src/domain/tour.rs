use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::{FieldError, Failure};

pub const NAME_MIN_LEN: usize = 10;
pub const NAME_MAX_LEN: usize = 40;
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

// --- Identity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TourId(Uuid);

impl TourId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a client supplied identifier, classifying garbage as a cast failure.
    pub fn parse(raw: &str) -> Result<Self, Failure> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| Failure::cast("id", raw, "Uuid"))
    }
}

impl Default for TourId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// --- Difficulty ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "difficult" => Ok(Difficulty::Difficult),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        };
        f.write_str(s)
    }
}

// --- Tour document ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: TourId,
    pub name: String,
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: u32,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_cover: String,
    pub images: Vec<String>,
    pub start_dates: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A validated tour that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTour {
    pub name: String,
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: u32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub images: Vec<String>,
    pub start_dates: Vec<DateTime<Utc>>,
}

impl NewTour {
    pub fn into_tour(self, id: TourId, created_at: DateTime<Utc>) -> Tour {
        Tour {
            id,
            name: self.name,
            duration: self.duration,
            max_group_size: self.max_group_size,
            difficulty: self.difficulty,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary,
            description: self.description,
            image_cover: self.image_cover,
            images: self.images,
            start_dates: self.start_dates,
            created_at,
        }
    }
}

/// Client input for create and partial update. Every field is optional here;
/// the rules decide what is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDraft {
    pub name: Option<String>,
    pub duration: Option<u32>,
    pub max_group_size: Option<u32>,
    pub difficulty: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<u32>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
}

impl TourDraft {
    /// Overlays `patch` on this draft; fields present in the patch win.
    pub fn merge(self, patch: TourDraft) -> TourDraft {
        TourDraft {
            name: patch.name.or(self.name),
            duration: patch.duration.or(self.duration),
            max_group_size: patch.max_group_size.or(self.max_group_size),
            difficulty: patch.difficulty.or(self.difficulty),
            ratings_average: patch.ratings_average.or(self.ratings_average),
            ratings_quantity: patch.ratings_quantity.or(self.ratings_quantity),
            price: patch.price.or(self.price),
            price_discount: patch.price_discount.or(self.price_discount),
            summary: patch.summary.or(self.summary),
            description: patch.description.or(self.description),
            image_cover: patch.image_cover.or(self.image_cover),
            images: patch.images.or(self.images),
            start_dates: patch.start_dates.or(self.start_dates),
        }
    }

    /// Runs every rule, collecting one violation per field in document order.
    pub fn validate(self) -> Result<NewTour, Failure> {
        let mut errors = Vec::new();

        let name = self.name.map(|n| n.trim().to_string());
        match name.as_deref() {
            None | Some("") => {
                errors.push(FieldError::new("name", "required", "A tour must have a name"))
            }
            Some(n) if n.chars().count() > NAME_MAX_LEN => errors.push(FieldError::new(
                "name",
                "maxlength",
                format!("A tour name must have less or equal then {NAME_MAX_LEN} characters"),
            )),
            Some(n) if n.chars().count() < NAME_MIN_LEN => errors.push(FieldError::new(
                "name",
                "minlength",
                format!("A tour name must have more or equal then {NAME_MIN_LEN} characters"),
            )),
            Some(_) => {}
        }

        match self.duration {
            None => errors.push(FieldError::new(
                "duration",
                "required",
                "A tour must have a duration",
            )),
            Some(0) => errors.push(FieldError::new(
                "duration",
                "min",
                "Duration must be at least 1 day",
            )),
            Some(_) => {}
        }

        match self.max_group_size {
            None => errors.push(FieldError::new(
                "maxGroupSize",
                "required",
                "A tour must have a group size",
            )),
            Some(0) => errors.push(FieldError::new(
                "maxGroupSize",
                "min",
                "Group size must be at least 1",
            )),
            Some(_) => {}
        }

        let difficulty = match self.difficulty.as_deref() {
            None => {
                errors.push(FieldError::new(
                    "difficulty",
                    "required",
                    "A tour must have a difficulty",
                ));
                None
            }
            Some(raw) => match raw.parse::<Difficulty>() {
                Ok(d) => Some(d),
                Err(()) => {
                    errors.push(FieldError::new(
                        "difficulty",
                        "enum",
                        "Difficulty is either: easy, medium, difficult",
                    ));
                    None
                }
            },
        };

        let ratings_average = self.ratings_average.unwrap_or(DEFAULT_RATINGS_AVERAGE);
        if ratings_average < 1.0 {
            errors.push(FieldError::new(
                "ratingsAverage",
                "min",
                "Rating must be above 1.0",
            ));
        } else if ratings_average > 5.0 {
            errors.push(FieldError::new(
                "ratingsAverage",
                "max",
                "Rating must be below 5.0",
            ));
        }

        match self.price {
            None => errors.push(FieldError::new("price", "required", "A tour must have a price")),
            Some(p) if !(p > 0.0) => errors.push(FieldError::new(
                "price",
                "min",
                "Price must be greater than zero",
            )),
            Some(_) => {}
        }

        if let (Some(discount), Some(price)) = (self.price_discount, self.price) {
            if discount >= price {
                errors.push(FieldError::new(
                    "priceDiscount",
                    "user defined",
                    format!("Discount price ({discount}) should be below regular price"),
                ));
            }
        }

        let summary = self.summary.map(|s| s.trim().to_string());
        if summary.as_deref().is_none_or(str::is_empty) {
            errors.push(FieldError::new(
                "summary",
                "required",
                "A tour must have a description",
            ));
        }

        let image_cover = self.image_cover.map(|s| s.trim().to_string());
        if image_cover.as_deref().is_none_or(str::is_empty) {
            errors.push(FieldError::new(
                "imageCover",
                "required",
                "A tour must have a cover image",
            ));
        }

        if let Some(failure) = Failure::validation(errors) {
            return Err(failure);
        }

        // Every required field was checked above.
        match (name, self.duration, self.max_group_size, difficulty, self.price, summary, image_cover) {
            (
                Some(name),
                Some(duration),
                Some(max_group_size),
                Some(difficulty),
                Some(price),
                Some(summary),
                Some(image_cover),
            ) => Ok(NewTour {
                name,
                duration,
                max_group_size,
                difficulty,
                ratings_average,
                ratings_quantity: self.ratings_quantity.unwrap_or(0),
                price,
                price_discount: self.price_discount,
                summary,
                description: self.description.map(|d| d.trim().to_string()),
                image_cover,
                images: self.images.unwrap_or_default(),
                start_dates: self.start_dates.unwrap_or_default(),
            }),
            _ => Err(Failure::unexpected("tour validation accepted an incomplete draft")),
        }
    }
}

impl From<&Tour> for TourDraft {
    fn from(tour: &Tour) -> Self {
        TourDraft {
            name: Some(tour.name.clone()),
            duration: Some(tour.duration),
            max_group_size: Some(tour.max_group_size),
            difficulty: Some(tour.difficulty.to_string()),
            ratings_average: Some(tour.ratings_average),
            ratings_quantity: Some(tour.ratings_quantity),
            price: Some(tour.price),
            price_discount: tour.price_discount,
            summary: Some(tour.summary.clone()),
            description: tour.description.clone(),
            image_cover: Some(tour.image_cover.clone()),
            images: Some(tour.images.clone()),
            start_dates: Some(tour.start_dates.clone()),
        }
    }
}

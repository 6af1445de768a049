use async_trait::async_trait;

// Declare modules
pub mod adapters;
pub mod domain;
pub mod error;
pub mod failure;
pub mod sanitize;

pub use error::{AppError, Status};
pub use failure::{FieldError, Failure};

use domain::{
    query::TourQuery,
    tour::{NewTour, Tour, TourDraft, TourId},
};

// Port for tour persistence. Adapters classify their own failures
// (duplicate keys, validation) into `Failure` before returning.
#[async_trait]
pub trait TourStore: Send + Sync {
    async fn create(&self, tour: NewTour) -> Result<Tour, Failure>;

    async fn find(&self, query: &TourQuery) -> Result<Vec<Tour>, Failure>;

    async fn find_by_id(&self, id: &TourId) -> Result<Option<Tour>, Failure>;

    /// Applies `patch` over the stored tour and re-runs validation.
    /// Returns `None` when no tour has that id.
    async fn update(&self, id: &TourId, patch: TourDraft) -> Result<Option<Tour>, Failure>;

    async fn delete(&self, id: &TourId) -> Result<Option<Tour>, Failure>;
}

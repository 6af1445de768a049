use crate::{
    Failure, TourStore,
    domain::{
        query::TourQuery,
        tour::{NewTour, Tour, TourDraft, TourId},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::Arc;
use tracing::debug;

/// In-memory implementation of the TourStore port for tests and single-executable mode.
/// Tour names are unique, enforced through a name -> id index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTourStore {
    tours: Arc<DashMap<TourId, Tour>>,
    names: Arc<DashMap<String, TourId>>,
}

impl InMemoryTourStore {
    /// Claims `name` for `id`, failing like a unique index would.
    fn reserve_name(&self, name: &str, id: TourId) -> Result<(), Failure> {
        match self.names.entry(name.to_string()) {
            Entry::Occupied(entry) if *entry.get() != id => {
                Err(Failure::duplicate_key("name", name))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
        }
    }

    fn release_name(&self, name: &str, id: TourId) {
        self.names.remove_if(name, |_, owner| *owner == id);
    }
}

#[async_trait]
impl TourStore for InMemoryTourStore {
    async fn create(&self, tour: NewTour) -> Result<Tour, Failure> {
        let id = TourId::new();
        self.reserve_name(&tour.name, id)?;
        let tour = tour.into_tour(id, Utc::now());
        self.tours.insert(id, tour.clone());
        debug!("stored tour {} ({})", tour.id, tour.name);
        Ok(tour)
    }

    async fn find(&self, query: &TourQuery) -> Result<Vec<Tour>, Failure> {
        // Snapshot first so no shard lock is held while sorting.
        let snapshot: Vec<Tour> = self.tours.iter().map(|e| e.value().clone()).collect();
        Ok(query.apply(snapshot))
    }

    async fn find_by_id(&self, id: &TourId) -> Result<Option<Tour>, Failure> {
        Ok(self.tours.get(id).map(|e| e.value().clone()))
    }

    async fn update(&self, id: &TourId, patch: TourDraft) -> Result<Option<Tour>, Failure> {
        // The entry lock is held until the write lands so a concurrent delete
        // either runs first or removes the updated tour.
        let Some(mut entry) = self.tours.get_mut(id) else {
            return Ok(None);
        };
        let current = entry.value();

        let validated = TourDraft::from(current).merge(patch).validate()?;
        let renamed = validated.name != current.name;
        if renamed {
            self.reserve_name(&validated.name, current.id)?;
        }

        let updated = validated.into_tour(current.id, current.created_at);
        let previous = std::mem::replace(entry.value_mut(), updated.clone());
        if renamed {
            self.release_name(&previous.name, previous.id);
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: &TourId) -> Result<Option<Tour>, Failure> {
        Ok(self.tours.remove(id).map(|(_, tour)| {
            self.release_name(&tour.name, tour.id);
            tour
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tour::Difficulty;

    fn draft(name: &str) -> TourDraft {
        TourDraft {
            name: Some(name.to_string()),
            duration: Some(5),
            max_group_size: Some(25),
            difficulty: Some("easy".into()),
            price: Some(397.0),
            summary: Some("Breathtaking hike through the park".into()),
            image_cover: Some("tour-1-cover.jpg".into()),
            ..TourDraft::default()
        }
    }

    async fn seed(store: &InMemoryTourStore, name: &str) -> Tour {
        store.create(draft(name).validate().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_by_id() {
        let store = InMemoryTourStore::default();
        let tour = seed(&store, "The Forest Hiker").await;

        let loaded = store.find_by_id(&tour.id).await.unwrap();
        assert_eq!(loaded, Some(tour));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let store = InMemoryTourStore::default();
        seed(&store, "The Forest Hiker").await;

        let result = store
            .create(draft("The Forest Hiker").validate().unwrap())
            .await;
        assert_eq!(
            result.unwrap_err(),
            Failure::duplicate_key("name", "The Forest Hiker")
        );
        assert_eq!(store.tours.len(), 1);
    }

    #[tokio::test]
    async fn test_update_revalidates_and_renames() {
        let store = InMemoryTourStore::default();
        let tour = seed(&store, "The Forest Hiker").await;

        let patch = TourDraft {
            name: Some("The Forest Wanderer".into()),
            difficulty: Some("medium".into()),
            ..TourDraft::default()
        };
        let updated = store.update(&tour.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "The Forest Wanderer");
        assert_eq!(updated.difficulty, Difficulty::Medium);
        assert_eq!(updated.created_at, tour.created_at);

        // The old name is free again.
        seed(&store, "The Forest Hiker").await;
    }

    #[tokio::test]
    async fn test_update_with_invalid_patch_keeps_original() {
        let store = InMemoryTourStore::default();
        let tour = seed(&store, "The Forest Hiker").await;

        let patch = TourDraft {
            ratings_average: Some(0.5),
            ..TourDraft::default()
        };
        let result = store.update(&tour.id, patch).await;
        assert!(matches!(result, Err(Failure::Validation { .. })));
        assert_eq!(store.find_by_id(&tour.id).await.unwrap(), Some(tour));
    }

    #[tokio::test]
    async fn test_update_into_taken_name() {
        let store = InMemoryTourStore::default();
        seed(&store, "The Forest Hiker").await;
        let other = seed(&store, "The Sea Explorer").await;

        let patch = TourDraft {
            name: Some("The Forest Hiker".into()),
            ..TourDraft::default()
        };
        let result = store.update(&other.id, patch).await;
        assert_eq!(
            result.unwrap_err(),
            Failure::duplicate_key("name", "The Forest Hiker")
        );
    }

    #[tokio::test]
    async fn test_missing_ids_yield_none() {
        let store = InMemoryTourStore::default();
        let id = TourId::new();
        assert_eq!(store.find_by_id(&id).await.unwrap(), None);
        assert_eq!(store.update(&id, TourDraft::default()).await.unwrap(), None);
        assert_eq!(store.delete(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_releases_name() {
        let store = InMemoryTourStore::default();
        let tour = seed(&store, "The Forest Hiker").await;

        assert_eq!(store.delete(&tour.id).await.unwrap(), Some(tour));
        assert!(store.find(&TourQuery::default()).await.unwrap().is_empty());
        seed(&store, "The Forest Hiker").await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_update_racing_delete_never_resurrects() {
        let store = InMemoryTourStore::default();
        for round in 0..200 {
            let tour = seed(&store, &format!("The Forest Hiker {round:03}")).await;
            let patch = TourDraft {
                name: Some(format!("The Forest Wanderer {round:03}")),
                ..TourDraft::default()
            };

            let updater = {
                let store = store.clone();
                tokio::spawn(async move { store.update(&tour.id, patch).await })
            };
            let deleter = {
                let store = store.clone();
                tokio::spawn(async move { store.delete(&tour.id).await })
            };
            updater.await.unwrap().unwrap();
            assert!(deleter.await.unwrap().unwrap().is_some());

            assert_eq!(store.find_by_id(&tour.id).await.unwrap(), None);
        }
        assert!(store.tours.is_empty());
        assert!(store.names.is_empty());
    }
}

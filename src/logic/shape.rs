use crate::model::{Fetch, ItemRecord, Reference};
use crate::store::WorkItemService;

/// Fetches items and collections and shapes them into plain records
pub struct Shaper;

impl Shaper {
    /// Fetch one item's facts and collection summaries.
    ///
    /// An empty reference gives `Fetch::Empty` without calling the service;
    /// a failed call is logged and gives `Fetch::Failed`.
    pub async fn fetch_item<S: WorkItemService + ?Sized>(
        service: &S,
        reference: &Reference,
        facts: &[&str],
        collections: &[&str],
    ) -> Fetch<ItemRecord> {
        if reference.is_empty() {
            return Fetch::Empty;
        }

        let fetch: Vec<&str> = facts.iter().chain(collections).copied().collect();
        let shaped = match service.get(reference, &fetch).await {
            Ok(raw) => ItemRecord::shape(&raw, facts, collections),
            Err(e) => Err(e),
        };

        match shaped {
            Ok(record) => Fetch::Fetched(record),
            Err(e) => {
                log::error!("{} (getting data on {})", e, reference);
                Fetch::Failed(e)
            }
        }
    }

    /// Fetch every member of a collection, each shaped like `fetch_item` plus its own reference.
    /// Members keep the order the service returned them in.
    pub async fn fetch_collection<S: WorkItemService + ?Sized>(
        service: &S,
        reference: &Reference,
        facts: &[&str],
        collections: &[&str],
    ) -> Fetch<Vec<ItemRecord>> {
        if reference.is_empty() {
            return Fetch::Empty;
        }

        let fetch: Vec<&str> = facts.iter().chain(collections).copied().collect();
        let shaped = match service.get_collection(reference, &fetch).await {
            Ok(members) => members
                .iter()
                .map(|member| ItemRecord::shape_member(member, facts, collections))
                .collect::<Result<Vec<_>, _>>(),
            Err(e) => Err(e),
        };

        match shaped {
            Ok(records) => Fetch::Fetched(records),
            Err(e) => {
                log::error!("{} (getting data on {})", e, reference);
                Fetch::Failed(e)
            }
        }
    }
}

use serde_json::{Map, Value};

use crate::model::{Fetch, ItemRecord, Reference, TestCase};
use crate::store::{ServiceError, WorkItemService};

/// Why a walk stopped before reaching the end of its test cases
#[derive(Debug)]
pub enum HaltReason {
    /// The test case belongs to no user story
    NoParent,
    ParentFetch(ServiceError),
    Update(ServiceError),
}

#[derive(Debug)]
pub enum WalkOutcome {
    Completed { updated: usize },
    Halted {
        updated: usize,
        test_case: Reference,
        reason: HaltReason,
    },
}

impl WalkOutcome {
    pub fn updated(&self) -> usize {
        match self {
            WalkOutcome::Completed { updated } | WalkOutcome::Halted { updated, .. } => *updated,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, WalkOutcome::Completed { .. })
    }
}

/// Copies each test case's user-story description onto the test case
pub struct Propagator;

impl Propagator {
    /// Walk the test cases strictly one at a time. The next test case is not
    /// touched until the previous update has settled, and the first test case
    /// without a parent, or whose parent read or update fails, halts the walk.
    pub async fn propagate<S: WorkItemService + ?Sized>(
        service: &S,
        test_cases: &[TestCase],
    ) -> WalkOutcome {
        let mut updated = 0;

        for test_case in test_cases {
            if let Err(reason) = Self::copy_description(service, test_case).await {
                return WalkOutcome::Halted {
                    updated,
                    test_case: test_case.reference.clone(),
                    reason,
                };
            }
            updated += 1;
        }

        WalkOutcome::Completed { updated }
    }

    async fn copy_description<S: WorkItemService + ?Sized>(
        service: &S,
        test_case: &TestCase,
    ) -> Result<(), HaltReason> {
        let Some(story) = test_case.work_product.as_ref().filter(|r| !r.is_empty()) else {
            log::error!("Test case belongs to no user story. ({})", test_case.reference);
            return Err(HaltReason::NoParent);
        };

        let story_data = match crate::logic::Shaper::fetch_item(service, story, &["Description"], &[]).await {
            Fetch::Fetched(record) => record,
            Fetch::Failed(e) => {
                log::error!("{} (getting user-story data)", e);
                return Err(HaltReason::ParentFetch(e));
            }
            // The story reference is non-empty, so the shaper never answers Empty
            Fetch::Empty => ItemRecord::default(),
        };

        // Absent or null descriptions are copied as empty text
        let description = story_data
            .fact("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut fields = Map::new();
        fields.insert("Description".to_string(), Value::String(description));

        match service.update(&test_case.reference, fields).await {
            Ok(_) => {
                log::info!("copied description of {} to {}", story, test_case.reference);
                Ok(())
            }
            Err(e) => {
                log::error!("{} (copying user-story description)", e);
                Err(HaltReason::Update(e))
            }
        }
    }
}

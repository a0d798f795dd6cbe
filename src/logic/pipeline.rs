use crate::logic::{Propagator, Resolution, Resolver, Shaper, WalkOutcome};
use crate::model::{Fetch, TestCase};
use crate::store::WorkItemService;

/// Where a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The folder ID did not resolve; nothing was fetched
    FolderUnresolved,
    /// The folder or its test cases could not be read
    FetchFailed,
    Walked(WalkOutcome),
}

/// Copy user-story descriptions onto every test case of the test folder `folder_id`
pub async fn run<S: WorkItemService + ?Sized>(service: &S, folder_id: Option<&str>) -> RunOutcome {
    let folder = match Resolver::resolve(service, "TestFolder", folder_id).await {
        Resolution::Found(reference) => reference,
        Resolution::Unresolved(_) => return RunOutcome::FolderUnresolved,
    };

    let folder_data = match Shaper::fetch_item(service, &folder, &[], &["TestCases"]).await {
        Fetch::Fetched(record) => record,
        Fetch::Empty | Fetch::Failed(_) => return RunOutcome::FetchFailed,
    };
    let Some(test_cases_ref) = folder_data.collection("testCases").map(|c| c.reference.clone()) else {
        return RunOutcome::FetchFailed;
    };

    let records = match Shaper::fetch_collection(service, &test_cases_ref, &["WorkProduct"], &[]).await {
        Fetch::Fetched(records) => records,
        Fetch::Empty => Vec::new(),
        Fetch::Failed(_) => return RunOutcome::FetchFailed,
    };

    log::info!("{} test cases in {}", records.len(), folder);
    let test_cases: Vec<TestCase> = records.iter().map(TestCase::from).collect();

    RunOutcome::Walked(Propagator::propagate(service, &test_cases).await)
}

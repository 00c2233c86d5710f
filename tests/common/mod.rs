#![allow(dead_code)]

use async_trait::async_trait;
use prospectr::clients::{
    CostLine, KeyStore, KeysError, NewRun, PeopleApi, RunOperation, RunStatus, RunTracker,
    RunsError, SearchPage, UpstreamError,
};
use prospectr::config::Config;
use prospectr::db::Store;
use prospectr::domain::{CampaignKey, RunContext};
use prospectr::models::{MatchQuery, Organization, Person, SearchParams};
use prospectr::services::LeadService;
use prospectr::state::SharedState;
use std::sync::{Arc, Mutex};

/// In-process people API backed by a fixed catalog.
#[derive(Default)]
pub struct FakePeople {
    pub catalog: Mutex<Vec<Person>>,
    /// Reported instead of the catalog size when set.
    pub total_override: Mutex<Option<u64>>,
    pub fail_status: Mutex<Option<u16>>,
    pub search_pages: Mutex<Vec<u32>>,
    pub enrich_calls: Mutex<Vec<String>>,
    pub match_calls: Mutex<Vec<MatchQuery>>,
    pub bulk_calls: Mutex<Vec<Vec<MatchQuery>>>,
    /// Advanced by "another request" while the next search is in flight.
    pub race_cursor: Mutex<Option<(Store, CampaignKey)>>,
}

impl FakePeople {
    pub fn with_catalog(people: Vec<Person>) -> Self {
        Self {
            catalog: Mutex::new(people),
            ..Self::default()
        }
    }

    pub fn upstream_calls(&self) -> usize {
        self.search_pages.lock().unwrap().len()
            + self.enrich_calls.lock().unwrap().len()
            + self.match_calls.lock().unwrap().len()
            + self.bulk_calls.lock().unwrap().len()
    }

    fn check_failure(&self) -> Result<(), UpstreamError> {
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(UpstreamError::Status {
                status,
                message: "provider rejected the request".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn find_match(&self, query: &MatchQuery) -> Option<Person> {
        self.catalog
            .lock()
            .unwrap()
            .iter()
            .find(|p| {
                let domain = p
                    .organization
                    .as_ref()
                    .and_then(|o| o.primary_domain.as_deref())
                    .unwrap_or_default();
                p.first_name
                    .as_deref()
                    .is_some_and(|f| f.eq_ignore_ascii_case(&query.first_name))
                    && p.last_name
                        .as_deref()
                        .is_some_and(|l| l.eq_ignore_ascii_case(&query.last_name))
                    && domain.eq_ignore_ascii_case(&query.organization_domain)
            })
            .cloned()
    }
}

#[async_trait]
impl PeopleApi for FakePeople {
    async fn search(
        &self,
        _api_key: &str,
        _params: &SearchParams,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage, UpstreamError> {
        self.search_pages.lock().unwrap().push(page);
        self.check_failure()?;

        let race = self.race_cursor.lock().unwrap().take();
        if let Some((store, key)) = race {
            let cursor = store.find_cursor(&key).await.unwrap().unwrap();
            let next_page = cursor.current_page + 1;
            assert!(
                store
                    .advance_cursor(&cursor, next_page, cursor.total_entries, false)
                    .await
                    .unwrap()
            );
        }

        let catalog = self.catalog.lock().unwrap();
        let start = ((page.max(1) - 1) * per_page) as usize;
        let people: Vec<Person> = catalog
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();
        let total_entries = self
            .total_override
            .lock()
            .unwrap()
            .unwrap_or(catalog.len() as u64);

        Ok(SearchPage {
            people,
            total_entries,
        })
    }

    async fn enrich(
        &self,
        _api_key: &str,
        person_id: &str,
    ) -> Result<Option<Person>, UpstreamError> {
        self.enrich_calls.lock().unwrap().push(person_id.to_string());
        self.check_failure()?;

        Ok(self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id.as_deref() == Some(person_id))
            .cloned())
    }

    async fn match_person(
        &self,
        _api_key: &str,
        query: &MatchQuery,
    ) -> Result<Option<Person>, UpstreamError> {
        self.match_calls.lock().unwrap().push(query.clone());
        self.check_failure()?;
        Ok(self.find_match(query))
    }

    async fn bulk_match(
        &self,
        _api_key: &str,
        queries: &[MatchQuery],
    ) -> Result<Vec<Option<Person>>, UpstreamError> {
        self.bulk_calls.lock().unwrap().push(queries.to_vec());
        self.check_failure()?;
        Ok(queries.iter().map(|q| self.find_match(q)).collect())
    }
}

#[derive(Default)]
pub struct FakeKeys {
    pub missing: Mutex<bool>,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl KeyStore for FakeKeys {
    async fn provider_key(
        &self,
        organization_id: &str,
        provider: &str,
    ) -> Result<String, KeysError> {
        *self.calls.lock().unwrap() += 1;
        if *self.missing.lock().unwrap() {
            return Err(KeysError::NotConfigured {
                provider: provider.to_string(),
                organization_id: organization_id.to_string(),
            });
        }
        Ok(format!("key-{organization_id}"))
    }
}

/// Records every run-protocol call as a short string.
#[derive(Default)]
pub struct FakeRuns {
    pub events: Mutex<Vec<String>>,
    pub fail_on: Mutex<Option<RunOperation>>,
    next_id: Mutex<u32>,
}

impl FakeRuns {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn cost_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with("cost:"))
            .collect()
    }

    fn fail_if(&self, operation: RunOperation) -> Result<(), RunsError> {
        if *self.fail_on.lock().unwrap() == Some(operation) {
            return Err(RunsError::Status {
                operation,
                status: 503,
                message: "runs service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RunTracker for FakeRuns {
    async fn create_run(&self, run: &NewRun) -> Result<String, RunsError> {
        self.fail_if(RunOperation::Create)?;
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = format!("run_{}", *next);
        self.events.lock().unwrap().push(format!(
            "create:{}:{}:{}",
            id, run.task_name, run.parent_run_id
        ));
        Ok(id)
    }

    async fn add_costs(&self, run_id: &str, costs: &[CostLine]) -> Result<(), RunsError> {
        self.fail_if(RunOperation::AddCosts)?;
        let mut events = self.events.lock().unwrap();
        for line in costs {
            events.push(format!("cost:{run_id}:{}:{}", line.cost_name, line.quantity));
        }
        Ok(())
    }

    async fn update_run(&self, run_id: &str, status: RunStatus) -> Result<(), RunsError> {
        self.fail_if(RunOperation::Update)?;
        self.events
            .lock()
            .unwrap()
            .push(format!("update:{run_id}:{status:?}"));
        Ok(())
    }
}

pub struct Harness {
    pub shared: Arc<SharedState>,
    pub store: Store,
    pub people: Arc<FakePeople>,
    pub keys: Arc<FakeKeys>,
    pub runs: Arc<FakeRuns>,
}

impl Harness {
    pub fn service(&self) -> &Arc<dyn LeadService> {
        &self.shared.lead_service
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.observability.metrics_enabled = false;
    config
}

pub async fn harness(people: FakePeople) -> Harness {
    let config = test_config();
    let store = Store::new(&config.general.database_path)
        .await
        .expect("in-memory store");

    let people = Arc::new(people);
    let keys = Arc::new(FakeKeys::default());
    let runs = Arc::new(FakeRuns::default());

    let shared = Arc::new(SharedState::with_collaborators(
        config,
        store.clone(),
        people.clone(),
        keys.clone(),
        runs.clone(),
    ));

    Harness {
        shared,
        store,
        people,
        keys,
        runs,
    }
}

pub fn person(index: usize, with_email: bool) -> Person {
    Person {
        id: Some(format!("p{index}")),
        first_name: Some(format!("First{index}")),
        last_name: Some(format!("Last{index}")),
        email: with_email.then(|| format!("person{index}@example.com")),
        title: Some("CTO".to_string()),
        organization: Some(Organization {
            name: Some(format!("Company {index}")),
            primary_domain: Some(format!("company{index}.com")),
            ..Organization::default()
        }),
        ..Person::default()
    }
}

pub fn catalog(count: usize) -> Vec<Person> {
    (1..=count).map(|i| person(i, true)).collect()
}

pub fn ctx(campaign: Option<&str>) -> RunContext {
    RunContext {
        organization_id: "org_1".to_string(),
        parent_run_id: "parent_run".to_string(),
        app_id: "app_1".to_string(),
        brand_id: "brand_1".to_string(),
        campaign_id: campaign.map(str::to_string),
    }
}

pub fn titles(values: &[&str]) -> SearchParams {
    SearchParams {
        person_titles: Some(values.iter().map(|v| (*v).to_string()).collect()),
        ..SearchParams::default()
    }
}

//! Test utilities for the backend crate.
//!
//! In-memory adapters for every driven port, shared by unit tests (in `src/`)
//! and integration tests (in `tests/`). Compiled for tests and behind the
//! `test-support` feature.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use mockable::DefaultClock;

use crate::domain::ports::{
    ActivityLog, MoleculeRepository, PredictionRepository, ProjectRepository, RateLimitStore,
    RateLimitStoreError, RepositoryError, UserRepository, WindowCount,
};
use crate::domain::{
    AccountService, ActivityId, ActivityLogEntry, ActivityService, Email, Molecule,
    MoleculeFilter, MoleculeId, MoleculeService, MoleculeStatistics, NewActivity, NewMolecule,
    NewPrediction, NewProject, NewUser, Page, Prediction, PredictionCategory, PredictionId,
    PredictionService, Project, ProjectChanges, ProjectFilter, ProjectId, ProjectService,
    RateLimitPolicy, RateLimiter, Role, Smiles, Tier, UsageCounts, User, UserChanges, UserId,
    UserRecord,
};
use crate::inbound::http::configure;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::http::validation::{json_config, path_config, query_config};
use crate::middleware::Trace;
use crate::outbound::credentials::{Argon2PasswordHasher, JwtSessionTokens};

/// Signing key used by [`http_state`]; long enough for release rules.
pub const TEST_SIGNING_KEY: &[u8] = b"test-signing-key-that-is-32-bytes-long!";

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    projects: Vec<Project>,
    molecules: Vec<Molecule>,
    predictions: Vec<Prediction>,
    activity: Vec<ActivityLogEntry>,
}

impl Tables {
    fn user_position(&self, id: &UserId) -> Option<usize> {
        self.users.iter().position(|user| user.id == *id)
    }

    fn cascade_molecule(&mut self, id: &MoleculeId) {
        self.predictions.retain(|p| p.molecule_id != *id);
    }
}

/// Single in-memory database implementing every repository port.
///
/// Rows are kept in insertion order; listings return newest first. Deletes
/// cascade the way the relational schema does.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryDatabase {
    /// Empty database.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Grant or revoke the administrative role; there is no API for this.
    pub fn set_role(&self, id: &UserId, role: Role) {
        let mut tables = self.lock();
        if let Some(index) = tables.user_position(id) {
            if let Some(user) = tables.users.get_mut(index) {
                user.role = role;
            }
        }
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Number of stored molecules, across all owners.
    pub fn molecule_count(&self) -> usize {
        self.lock().molecules.len()
    }

    /// Number of stored predictions, across all owners.
    pub fn prediction_count(&self) -> usize {
        self.lock().predictions.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::conflict("email"));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::conflict("username"));
        }
        let now = Utc::now();
        let record = UserRecord {
            id: UserId::random(),
            email: user.email.clone(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            institution: user.institution.clone(),
            tier: Tier::Free,
            role: Role::Member,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(record.clone());
        Ok(User::from(record))
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == *id)
            .cloned()
            .map(User::from))
    }

    async fn get_by_natural_key(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == *email)
            .cloned()
            .map(User::from))
    }

    async fn update(
        &self,
        id: &UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.lock();
        let Some(record) = tables.users.iter_mut().find(|u| u.id == *id) else {
            return Ok(None);
        };
        if let Some(full_name) = &changes.full_name {
            record.full_name.clone_from(full_name);
        }
        if let Some(institution) = &changes.institution {
            record.institution.clone_from(institution);
        }
        if let Some(tier) = changes.tier {
            record.tier = tier;
        }
        if let Some(is_active) = changes.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Utc::now();
        Ok(Some(User::from(record.clone())))
    }

    async fn usage_counts(&self, id: &UserId) -> Result<UsageCounts, RepositoryError> {
        let tables = self.lock();
        let projects = tables.projects.iter().filter(|p| p.user_id == *id).count();
        let molecules = tables.molecules.iter().filter(|m| m.user_id == *id).count();
        Ok(UsageCounts {
            projects: projects as u64,
            molecules: molecules as u64,
        })
    }
}

#[async_trait]
impl ProjectRepository for InMemoryDatabase {
    async fn create(&self, project: &NewProject) -> Result<Project, RepositoryError> {
        let now = Utc::now();
        let stored = Project {
            id: ProjectId::random(),
            user_id: project.user_id,
            name: project.name.clone(),
            description: project.description.clone(),
            disease_target: project.disease_target.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lock().projects.push(stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(self.lock().projects.iter().find(|p| p.id == *id).cloned())
    }

    async fn search(
        &self,
        owner: &UserId,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, RepositoryError> {
        let needle = filter.name_contains.as_deref().map(str::to_lowercase);
        Ok(self
            .lock()
            .projects
            .iter()
            .rev()
            .filter(|p| p.user_id == *owner)
            .filter(|p| {
                needle
                    .as_deref()
                    .is_none_or(|n| p.name.to_lowercase().contains(n))
            })
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: &ProjectId,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, RepositoryError> {
        let mut tables = self.lock();
        let Some(project) = tables.projects.iter_mut().find(|p| p.id == *id) else {
            return Ok(None);
        };
        let mut next = project.with_changes(changes);
        next.updated_at = Utc::now();
        *project = next.clone();
        Ok(Some(next))
    }

    async fn delete(&self, id: &ProjectId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != *id);
        if tables.projects.len() == before {
            return Ok(false);
        }
        let orphaned: Vec<MoleculeId> = tables
            .molecules
            .iter()
            .filter(|m| m.project_id == *id)
            .map(|m| m.id)
            .collect();
        tables.molecules.retain(|m| m.project_id != *id);
        for molecule in &orphaned {
            tables.cascade_molecule(molecule);
        }
        Ok(true)
    }
}

fn materialise(molecule: &NewMolecule) -> Molecule {
    Molecule {
        id: MoleculeId::random(),
        project_id: molecule.project_id,
        user_id: molecule.user_id,
        smiles: molecule.smiles.clone(),
        name: molecule.name.clone(),
        generation_method: molecule.generation_method.clone(),
        properties: molecule.properties.clone(),
        created_at: Utc::now(),
    }
}

fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    match (min, max) {
        (None, None) => true,
        _ => value.is_some_and(|v| min.is_none_or(|lo| v >= lo) && max.is_none_or(|hi| v <= hi)),
    }
}

fn matches(molecule: &Molecule, filter: &MoleculeFilter) -> bool {
    let props = &molecule.properties;
    within(
        props.molecular_weight,
        filter.min_molecular_weight,
        filter.max_molecular_weight,
    ) && within(props.logp, filter.min_logp, filter.max_logp)
        && within(props.qed, filter.min_qed, filter.max_qed)
        && filter
            .generation_method
            .as_deref()
            .is_none_or(|method| molecule.generation_method == method)
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

/// Mirror of the `molecules.project_id` foreign key.
fn project_exists(tables: &Tables, molecule: &NewMolecule) -> Result<(), RepositoryError> {
    if tables.projects.iter().any(|p| p.id == molecule.project_id) {
        Ok(())
    } else {
        Err(RepositoryError::query("referenced record does not exist"))
    }
}

#[async_trait]
impl MoleculeRepository for InMemoryDatabase {
    async fn create(&self, molecule: &NewMolecule) -> Result<Molecule, RepositoryError> {
        let mut tables = self.lock();
        project_exists(&tables, molecule)?;
        let stored = materialise(molecule);
        tables.molecules.push(stored.clone());
        Ok(stored)
    }

    /// All or nothing: the batch is checked in full before any row lands.
    async fn bulk_create(
        &self,
        molecules: &[NewMolecule],
    ) -> Result<Vec<Molecule>, RepositoryError> {
        let mut tables = self.lock();
        for molecule in molecules {
            project_exists(&tables, molecule)?;
        }
        let stored: Vec<Molecule> = molecules.iter().map(materialise).collect();
        tables.molecules.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn get_by_id(&self, id: &MoleculeId) -> Result<Option<Molecule>, RepositoryError> {
        Ok(self.lock().molecules.iter().find(|m| m.id == *id).cloned())
    }

    async fn get_by_natural_key(
        &self,
        owner: &UserId,
        smiles: &Smiles,
    ) -> Result<Option<Molecule>, RepositoryError> {
        Ok(self
            .lock()
            .molecules
            .iter()
            .rev()
            .find(|m| m.user_id == *owner && m.smiles == *smiles)
            .cloned())
    }

    async fn search(
        &self,
        owner: &UserId,
        filter: &MoleculeFilter,
    ) -> Result<Vec<Molecule>, RepositoryError> {
        Ok(self
            .lock()
            .molecules
            .iter()
            .rev()
            .filter(|m| m.user_id == *owner && matches(m, filter))
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn list_for_project(
        &self,
        project: &ProjectId,
        page: Page,
    ) -> Result<Vec<Molecule>, RepositoryError> {
        Ok(self
            .lock()
            .molecules
            .iter()
            .rev()
            .filter(|m| m.project_id == *project)
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn statistics(&self, project: &ProjectId) -> Result<MoleculeStatistics, RepositoryError> {
        let tables = self.lock();
        let rows: Vec<&Molecule> = tables
            .molecules
            .iter()
            .filter(|m| m.project_id == *project)
            .collect();
        let mut generation_methods = BTreeMap::new();
        for row in &rows {
            *generation_methods
                .entry(row.generation_method.clone())
                .or_insert(0_i64) += 1;
        }
        Ok(MoleculeStatistics {
            total_count: i64::try_from(rows.len()).unwrap_or(i64::MAX),
            avg_molecular_weight: average(rows.iter().filter_map(|m| m.properties.molecular_weight)),
            avg_logp: average(rows.iter().filter_map(|m| m.properties.logp)),
            avg_qed: average(rows.iter().filter_map(|m| m.properties.qed)),
            generation_methods,
        })
    }

    async fn delete(&self, id: &MoleculeId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.molecules.len();
        tables.molecules.retain(|m| m.id != *id);
        let removed = tables.molecules.len() != before;
        if removed {
            tables.cascade_molecule(id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl PredictionRepository for InMemoryDatabase {
    async fn bulk_create(
        &self,
        predictions: &[NewPrediction],
    ) -> Result<Vec<Prediction>, RepositoryError> {
        let mut tables = self.lock();
        let mut stored: Vec<Prediction> = Vec::with_capacity(predictions.len());
        for new in predictions {
            let duplicate = tables.predictions.iter().chain(stored.iter()).any(|p| {
                p.molecule_id == new.molecule_id
                    && p.category == new.category
                    && p.model_version == new.model_version
            });
            if duplicate {
                return Err(RepositoryError::conflict("modelVersion"));
            }
            stored.push(Prediction {
                id: PredictionId::random(),
                molecule_id: new.molecule_id,
                category: new.category,
                payload: new.payload.clone(),
                confidence: new.confidence,
                model_version: new.model_version.clone(),
                created_at: Utc::now(),
            });
        }
        tables.predictions.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn list_for_molecule(
        &self,
        molecule: &MoleculeId,
        category: Option<PredictionCategory>,
    ) -> Result<Vec<Prediction>, RepositoryError> {
        Ok(self
            .lock()
            .predictions
            .iter()
            .rev()
            .filter(|p| p.molecule_id == *molecule && category.is_none_or(|c| p.category == c))
            .cloned()
            .collect())
    }

    async fn latest_by_category(
        &self,
        molecule: &MoleculeId,
        category: PredictionCategory,
    ) -> Result<Option<Prediction>, RepositoryError> {
        Ok(self
            .lock()
            .predictions
            .iter()
            .rev()
            .find(|p| p.molecule_id == *molecule && p.category == category)
            .cloned())
    }
}

#[async_trait]
impl ActivityLog for InMemoryDatabase {
    async fn append(&self, entry: &NewActivity) -> Result<ActivityLogEntry, RepositoryError> {
        let stored = ActivityLogEntry {
            id: ActivityId::random(),
            user_id: entry.user_id,
            action: entry.action,
            target: entry.target,
            details: entry.details.clone(),
            created_at: Utc::now(),
        };
        self.lock().activity.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<ActivityLogEntry>, RepositoryError> {
        Ok(self
            .lock()
            .activity
            .iter()
            .rev()
            .filter(|e| e.user_id == *user)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Fixed-window counters held in process memory.
///
/// Set `unavailable` to simulate a store outage.
#[derive(Clone, Default)]
pub struct InMemoryRateLimitStore {
    counters: Arc<Mutex<HashMap<String, (u64, Instant)>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl InMemoryRateLimitStore {
    /// Store with no counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent hit fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = unavailable;
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<WindowCount, RateLimitStoreError> {
        if *self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(RateLimitStoreError::unavailable("store offline"));
        }
        let now = Instant::now();
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = counters
            .entry(key.to_owned())
            .or_insert((0, now + Duration::from_secs(window_secs)));
        if entry.1 <= now {
            *entry = (0, now + Duration::from_secs(window_secs));
        }
        entry.0 += 1;
        let remaining = entry.1.saturating_duration_since(now).as_secs().max(1);
        Ok(WindowCount {
            count: entry.0,
            ttl_secs: remaining,
        })
    }
}

/// Fully wired HTTP state over in-memory adapters and the real credential
/// adapters.
pub fn http_state(
    db: &InMemoryDatabase,
    store: &InMemoryRateLimitStore,
    policy: RateLimitPolicy,
) -> HttpState {
    let db = Arc::new(db.clone());
    let tokens = JwtSessionTokens::new(TEST_SIGNING_KEY, ChronoDuration::minutes(30));
    let accounts = Arc::new(AccountService::new(
        db.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(tokens),
        db.clone(),
        Arc::new(DefaultClock),
    ));
    let projects = Arc::new(ProjectService::new(db.clone(), db.clone()));
    let molecules = Arc::new(MoleculeService::new(db.clone(), db.clone(), db.clone()));
    let predictions = Arc::new(PredictionService::new(db.clone(), db.clone(), db.clone()));
    let activity = Arc::new(ActivityService::new(db));
    let store: Arc<dyn RateLimitStore> = Arc::new(store.clone());
    HttpState::new(
        HttpStatePorts {
            accounts: accounts.clone(),
            accounts_query: accounts,
            projects: projects.clone(),
            projects_query: projects,
            molecules: molecules.clone(),
            molecules_query: molecules,
            predictions: predictions.clone(),
            predictions_query: predictions,
            activity,
        },
        RateLimiter::new(store, policy),
    )
}

/// Versioned API over `state`, configured as the server configures it.
pub fn api_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn counters_reset_per_key() {
        let store = InMemoryRateLimitStore::new();
        for expected in 1..=3 {
            let count = store.hit("rl:a:60s:ip:1", 60).await.expect("hit");
            assert_eq!(count.count, expected);
        }
        let other = store.hit("rl:a:60s:ip:2", 60).await.expect("hit");
        assert_eq!(other.count, 1);
        assert!(other.ttl_secs <= 60 && other.ttl_secs >= 1);
    }

    #[rstest]
    #[tokio::test]
    async fn outage_is_reported() {
        let store = InMemoryRateLimitStore::new();
        store.set_unavailable(true);
        assert!(store.hit("k", 60).await.is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_a_project_cascades() {
        let db = InMemoryDatabase::new();
        let owner = UserId::random();
        let project = ProjectRepository::create(
            &db,
            &NewProject {
                user_id: owner,
                name: "p".to_owned(),
                description: None,
                disease_target: None,
            },
        )
        .await
        .expect("project");
        let molecule = MoleculeRepository::create(
            &db,
            &NewMolecule {
                project_id: project.id,
                user_id: owner,
                smiles: Smiles::parse("CCO").expect("smiles"),
                name: None,
                generation_method: "manual".to_owned(),
                properties: crate::domain::MolecularProperties::default(),
            },
        )
        .await
        .expect("molecule");
        PredictionRepository::bulk_create(
            &db,
            &[NewPrediction {
                molecule_id: molecule.id,
                category: PredictionCategory::Toxicity,
                payload: serde_json::json!({}),
                confidence: None,
                model_version: "v1".to_owned(),
            }],
        )
        .await
        .expect("prediction");

        assert!(ProjectRepository::delete(&db, &project.id).await.expect("delete"));
        assert_eq!(db.molecule_count(), 0);
        assert_eq!(db.prediction_count(), 0);
    }

    fn new_project(owner: UserId) -> NewProject {
        NewProject {
            user_id: owner,
            name: "p".to_owned(),
            description: None,
            disease_target: None,
        }
    }

    fn new_molecule(project_id: ProjectId, owner: UserId, smiles: &str) -> NewMolecule {
        NewMolecule {
            project_id,
            user_id: owner,
            smiles: Smiles::parse(smiles).expect("smiles"),
            name: None,
            generation_method: "manual".to_owned(),
            properties: crate::domain::MolecularProperties::default(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn molecule_batches_with_a_dangling_project_store_nothing() {
        let db = InMemoryDatabase::new();
        let owner = UserId::random();
        let project = ProjectRepository::create(&db, &new_project(owner))
            .await
            .expect("project");

        let err = MoleculeRepository::bulk_create(
            &db,
            &[
                new_molecule(project.id, owner, "CCO"),
                new_molecule(ProjectId::random(), owner, "CCN"),
                new_molecule(project.id, owner, "CCC"),
            ],
        )
        .await
        .expect_err("dangling project");

        assert!(matches!(err, RepositoryError::Query { .. }));
        assert_eq!(db.molecule_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn prediction_batches_with_a_duplicate_store_nothing() {
        let db = InMemoryDatabase::new();
        let owner = UserId::random();
        let project = ProjectRepository::create(&db, &new_project(owner))
            .await
            .expect("project");
        let molecule = MoleculeRepository::create(&db, &new_molecule(project.id, owner, "CCO"))
            .await
            .expect("molecule");
        let prediction = |category| NewPrediction {
            molecule_id: molecule.id,
            category,
            payload: serde_json::json!({}),
            confidence: None,
            model_version: "v1".to_owned(),
        };

        let err = PredictionRepository::bulk_create(
            &db,
            &[
                prediction(PredictionCategory::Admet),
                prediction(PredictionCategory::Admet),
                prediction(PredictionCategory::Toxicity),
            ],
        )
        .await
        .expect_err("duplicate model version");

        assert_eq!(err, RepositoryError::conflict("modelVersion"));
        assert_eq!(db.prediction_count(), 0);
    }
}

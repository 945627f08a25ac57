use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::clock::{FixedClock, SequentialIds};
use crate::workflows::placement::catalog::{Catalog, CatalogError, InMemoryCatalog};
use crate::workflows::placement::domain::{
    Application, ApplicationId, NewOpportunity, Opportunity, OpportunityId, Role,
    SearchPreferences, User, UserId,
};
use crate::workflows::placement::recommendation::MatchPolicy;
use crate::workflows::placement::service::PlacementPortal;

pub(super) const STUDENT: &str = "user-1";
pub(super) const PLACEMENT_CELL: &str = "placement-cell-1";
pub(super) const MENTOR: &str = "mentor-1";
pub(super) const EMPLOYER: &str = "employer-1";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2023, 11, 10)
}

pub(super) fn id(value: &str) -> UserId {
    UserId(value.to_string())
}

pub(super) fn opp(value: &str) -> OpportunityId {
    OpportunityId(value.to_string())
}

fn skills(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn student() -> User {
    User {
        id: id(STUDENT),
        name: "Rajesh Kumar".to_string(),
        email: "rajesh.kumar@example.com".to_string(),
        role: Role::Student,
        department: Some("Computer Science".to_string()),
        skills: skills(&["JavaScript", "React", "Node.js", "Python"]),
        preferences: Some(SearchPreferences {
            location: "Ranchi".to_string(),
            min_stipend: 10000,
            max_stipend: 25000,
            placement_conversion: true,
        }),
    }
}

pub(super) fn staff(user_id: &str, role: Role) -> User {
    User {
        id: id(user_id),
        name: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        role,
        department: Some("Computer Science".to_string()),
        skills: Vec::new(),
        preferences: None,
    }
}

pub(super) fn frontend_listing() -> Opportunity {
    Opportunity {
        id: opp("opp-1"),
        title: "Frontend Developer Intern".to_string(),
        company: "Tech Solutions Inc.".to_string(),
        description: "Work on cutting-edge web applications using React and TypeScript."
            .to_string(),
        required_skills: skills(&["JavaScript", "React", "HTML", "CSS"]),
        department: "Computer Science".to_string(),
        stipend: 15000,
        duration: "6 months".to_string(),
        location: "Ranchi".to_string(),
        placement_conversion: true,
        application_deadline: date(2023, 12, 15),
        posted_by: id(PLACEMENT_CELL),
        created_at: date(2023, 11, 1),
    }
}

pub(super) fn data_science_listing() -> Opportunity {
    Opportunity {
        id: opp("opp-2"),
        title: "Data Science Trainee".to_string(),
        company: "Data Analytics Group".to_string(),
        description: "Analyze large datasets and build predictive models.".to_string(),
        required_skills: skills(&["Python", "Machine Learning", "SQL", "Data Visualization"]),
        department: "Computer Science".to_string(),
        stipend: 20000,
        duration: "8 months".to_string(),
        location: "Remote".to_string(),
        placement_conversion: true,
        application_deadline: date(2023, 12, 20),
        posted_by: id(PLACEMENT_CELL),
        created_at: date(2023, 11, 5),
    }
}

pub(super) fn draft() -> NewOpportunity {
    NewOpportunity {
        title: "Backend Engineer Intern".to_string(),
        company: "Cloudworks".to_string(),
        description: "Build REST services.".to_string(),
        required_skills: skills(&["Node.js", "SQL"]),
        department: "Computer Science".to_string(),
        stipend: 18000,
        duration: "6 months".to_string(),
        location: "Ranchi".to_string(),
        placement_conversion: false,
        application_deadline: date(2023, 12, 31),
    }
}

pub(super) type TestPortal = PlacementPortal<InMemoryCatalog>;

/// Portal seeded with one student, the staff roles and two listings, pinned to 2023-11-10.
pub(super) fn build_portal() -> (Arc<TestPortal>, Arc<InMemoryCatalog>, Arc<FixedClock>) {
    let catalog = Arc::new(InMemoryCatalog::new());
    let clock = Arc::new(FixedClock::new(today()));
    let portal = Arc::new(PlacementPortal::new(
        catalog.clone(),
        clock.clone(),
        Arc::new(SequentialIds::starting_at(100)),
        MatchPolicy::default(),
    ));

    portal.register_user(student()).expect("student registers");
    for (user_id, role) in [
        (PLACEMENT_CELL, Role::PlacementCell),
        (MENTOR, Role::FacultyMentor),
        (EMPLOYER, Role::Employer),
    ] {
        portal
            .register_user(staff(user_id, role))
            .expect("staff registers");
    }
    catalog
        .insert_opportunity(frontend_listing())
        .expect("seed opp-1");
    catalog
        .insert_opportunity(data_science_listing())
        .expect("seed opp-2");

    (portal, catalog, clock)
}

pub(super) fn applied(portal: &TestPortal) -> Application {
    portal
        .apply(&id(STUDENT), &opp("opp-1"))
        .expect("student applies")
}

/// Catalog double that loses races on demand: either every revision check fails, or the
/// application listing is hidden so only the keyed insert can spot a duplicate.
#[derive(Default)]
pub(super) struct RacingCatalog {
    pub(super) inner: InMemoryCatalog,
    stale_updates: bool,
    hide_applications: bool,
}

impl RacingCatalog {
    pub(super) fn always_stale() -> Self {
        Self {
            stale_updates: true,
            ..Self::default()
        }
    }

    pub(super) fn hiding_applications() -> Self {
        Self {
            hide_applications: true,
            ..Self::default()
        }
    }
}

impl Catalog for RacingCatalog {
    fn user(&self, id: &UserId) -> Result<Option<User>, CatalogError> {
        self.inner.user(id)
    }

    fn insert_user(&self, user: User) -> Result<User, CatalogError> {
        self.inner.insert_user(user)
    }

    fn edit_skills(
        &self,
        id: &UserId,
        edit: &mut dyn FnMut(&mut Vec<String>),
    ) -> Result<User, CatalogError> {
        self.inner.edit_skills(id, edit)
    }

    fn opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, CatalogError> {
        self.inner.opportunity(id)
    }

    fn opportunities(&self) -> Result<Vec<Opportunity>, CatalogError> {
        self.inner.opportunities()
    }

    fn insert_opportunity(&self, opportunity: Opportunity) -> Result<Opportunity, CatalogError> {
        self.inner.insert_opportunity(opportunity)
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, CatalogError> {
        self.inner.application(id)
    }

    fn applications(&self) -> Result<Vec<Application>, CatalogError> {
        if self.hide_applications {
            return Ok(Vec::new());
        }
        self.inner.applications()
    }

    fn insert_application(&self, application: Application) -> Result<Application, CatalogError> {
        self.inner.insert_application(application)
    }

    fn update_application(
        &self,
        next: Application,
        expected_revision: u64,
    ) -> Result<Application, CatalogError> {
        if self.stale_updates {
            return Err(CatalogError::Stale {
                expected: expected_revision,
                found: expected_revision + 1,
            });
        }
        self.inner.update_application(next, expected_revision)
    }
}

/// Portal over `catalog` seeded with the student, a mentor and the frontend listing.
pub(super) fn racing_portal(catalog: Arc<RacingCatalog>) -> PlacementPortal<RacingCatalog> {
    let portal = PlacementPortal::new(
        catalog.clone(),
        Arc::new(FixedClock::new(today())),
        Arc::new(SequentialIds::new()),
        MatchPolicy::default(),
    );
    portal.register_user(student()).expect("student");
    portal
        .register_user(staff(MENTOR, Role::FacultyMentor))
        .expect("mentor");
    catalog
        .inner
        .insert_opportunity(frontend_listing())
        .expect("seed");
    portal
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

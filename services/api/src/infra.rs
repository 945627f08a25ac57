use chrono::{Duration, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use placement_hub::error::AppError;
use placement_hub::workflows::placement::{
    open_application, ApplicationId, Catalog, InMemoryCatalog, Opportunity, OpportunityId,
    PortalError, Role, SearchPreferences, User, UserId,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) const DEMO_STUDENT: &str = "user-1";
pub(crate) const DEMO_PLACEMENT_CELL: &str = "placement-cell-1";
pub(crate) const DEMO_MENTOR: &str = "mentor-1";
pub(crate) const DEMO_EMPLOYER: &str = "employer-1";
pub(crate) const DEMO_APPLICATION: &str = "app-1";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn skills(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn staff(id: &str, name: &str, role: Role) -> User {
    User {
        id: UserId(id.to_string()),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        role,
        department: Some("Computer Science".to_string()),
        skills: Vec::new(),
        preferences: None,
    }
}

fn seed_users() -> Vec<User> {
    vec![
        User {
            id: UserId(DEMO_STUDENT.to_string()),
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
        },
        staff(DEMO_PLACEMENT_CELL, "Placement Cell", Role::PlacementCell),
        staff(DEMO_MENTOR, "Dr. Anita Sharma", Role::FacultyMentor),
        staff(DEMO_EMPLOYER, "Tech Solutions Inc. HR", Role::Employer),
    ]
}

fn seed_opportunities(anchor: NaiveDate) -> Vec<Opportunity> {
    vec![
        Opportunity {
            id: OpportunityId("opp-1".to_string()),
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
            application_deadline: anchor + Duration::days(35),
            posted_by: UserId(DEMO_PLACEMENT_CELL.to_string()),
            created_at: anchor - Duration::days(9),
        },
        Opportunity {
            id: OpportunityId("opp-2".to_string()),
            title: "Data Science Trainee".to_string(),
            company: "Data Analytics Group".to_string(),
            description: "Analyze large datasets and build predictive models using Python and ML libraries."
                .to_string(),
            required_skills: skills(&["Python", "Machine Learning", "SQL", "Data Visualization"]),
            department: "Computer Science".to_string(),
            stipend: 20000,
            duration: "8 months".to_string(),
            location: "Remote".to_string(),
            placement_conversion: true,
            application_deadline: anchor + Duration::days(40),
            posted_by: UserId(DEMO_PLACEMENT_CELL.to_string()),
            created_at: anchor - Duration::days(5),
        },
    ]
}

/// Load the campus session used by the server and the demo: four users, two listings and one
/// pending application submitted on `anchor`. Both listings stay open for five weeks after it.
pub(crate) fn seed_catalog(anchor: NaiveDate) -> Result<Arc<InMemoryCatalog>, AppError> {
    let catalog = Arc::new(InMemoryCatalog::new());
    let users = seed_users();
    for user in &users {
        catalog.insert_user(user.clone()).map_err(PortalError::from)?;
    }

    let opportunities = seed_opportunities(anchor);
    for opportunity in &opportunities {
        catalog
            .insert_opportunity(opportunity.clone())
            .map_err(PortalError::from)?;
    }

    let application = open_application(
        ApplicationId(DEMO_APPLICATION.to_string()),
        &users[0],
        &opportunities[0],
        anchor,
    )?;
    catalog
        .insert_application(application)
        .map_err(PortalError::from)?;

    info!(
        users = users.len(),
        opportunities = opportunities.len(),
        applications = 1,
        "seeded placement catalog"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;
    use placement_hub::clock::{self, SequentialIds};
    use placement_hub::workflows::placement::{MatchPolicy, PlacementPortal};

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 11, 10).expect("valid date")
    }

    #[test]
    fn seeded_catalog_has_pending_application() {
        let catalog = seed_catalog(anchor()).expect("seed loads");
        let application = catalog
            .application(&ApplicationId(DEMO_APPLICATION.to_string()))
            .expect("catalog readable")
            .expect("seeded application");
        assert_eq!(application.student_id.0, DEMO_STUDENT);
        assert_eq!(application.opportunity_id.0, "opp-1");
        assert_eq!(application.applied_date, anchor());

        let listings = catalog.opportunities().expect("listings");
        assert_eq!(listings.len(), 2);
        assert_eq!(
            listings[0].application_deadline,
            NaiveDate::from_ymd_opt(2023, 12, 15).expect("valid date")
        );
        assert_eq!(
            listings[1].created_at,
            NaiveDate::from_ymd_opt(2023, 11, 5).expect("valid date")
        );
    }

    #[test]
    fn wall_clock_server_accepts_applications_to_seeded_listings() {
        let seeded_on = clock::today(&DefaultClock);
        let portal = PlacementPortal::new(
            seed_catalog(seeded_on).expect("seed loads"),
            Arc::new(DefaultClock),
            Arc::new(SequentialIds::default()),
            MatchPolicy::default(),
        );

        let application = portal
            .apply(
                &UserId(DEMO_STUDENT.to_string()),
                &OpportunityId("opp-2".to_string()),
            )
            .expect("seeded listing is still open");
        assert_eq!(application.applied_date, seeded_on);
    }

    #[test]
    fn parse_date_reports_bad_input() {
        assert!(parse_date("2023-11-10").is_ok());
        let err = parse_date("10/11/2023").expect_err("wrong format");
        assert!(err.contains("YYYY-MM-DD"));
    }
}

use crate::infra::{
    parse_date, seed_catalog, DEMO_APPLICATION, DEMO_EMPLOYER, DEMO_MENTOR, DEMO_PLACEMENT_CELL,
    DEMO_STUDENT,
};
use chrono::NaiveDate;
use clap::Args;
use placement_hub::clock::{FixedClock, SequentialIds};
use placement_hub::error::AppError;
use placement_hub::workflows::placement::{
    Application, ApplicationId, MatchPolicy, MentorDecision, OpportunityId, PlacementPortal,
    PortalError, UserId,
};
use std::sync::Arc;

/// Date the demo catalog is seeded on; listings close five weeks later.
const SESSION_START: &str = "2023-11-10";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the walkthrough runs on (YYYY-MM-DD). Defaults to the seeded session date.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let session_start = parse_date(SESSION_START)
        .map_err(|err| AppError::Portal(PortalError::InvalidInput(err)))?;
    let today = args.today.unwrap_or(session_start);

    let portal = PlacementPortal::new(
        seed_catalog(session_start)?,
        Arc::new(FixedClock::new(today)),
        Arc::new(SequentialIds::default()),
        MatchPolicy::default(),
    );

    let student = UserId(DEMO_STUDENT.to_string());
    let placement_cell = UserId(DEMO_PLACEMENT_CELL.to_string());
    let mentor = UserId(DEMO_MENTOR.to_string());
    let employer = UserId(DEMO_EMPLOYER.to_string());

    println!("Placement portal demo ({today})");
    let profile = portal.user(&student)?;
    println!("- {} | skills: {}", profile.name, profile.skills.join(", "));

    println!("\nRecommended opportunities");
    let recommendations = portal.recommendations(&student)?;
    if recommendations.is_empty() {
        println!("  none at the current match threshold");
    }
    for entry in &recommendations {
        println!(
            "  - {} at {} | {}/{} skills | deadline {}{}",
            entry.opportunity.title,
            entry.opportunity.company,
            entry.skill_match.matched_count(),
            entry.skill_match.required_count,
            entry.opportunity.application_deadline,
            if entry.already_applied {
                " | applied"
            } else {
                ""
            }
        );
    }

    println!("\nApplying to opp-2");
    match portal.apply(&student, &OpportunityId("opp-2".to_string())) {
        Ok(application) => {
            print!("  submitted: ");
            print_application(&application);
        }
        Err(err) => println!("  refused: {err}"),
    }
    println!("Applying to opp-1 again");
    if let Err(err) = portal.apply(&student, &OpportunityId("opp-1".to_string())) {
        println!("  refused: {err}");
    }

    let application_id = ApplicationId(DEMO_APPLICATION.to_string());
    println!("\nLifecycle for {application_id}");
    let completed = step(
        "mentor approval",
        portal.decide_mentor_approval(
            &application_id,
            &mentor,
            MentorDecision::Approve,
            "Good fit for the frontend track",
        ),
    ) && step(
        "interview",
        portal.schedule_interview(
            &application_id,
            &placement_cell,
            today + chrono::Duration::days(7),
        ),
    ) && step(
        "offer",
        portal.extend_offer(&application_id, &placement_cell),
    ) && step(
        "feedback",
        portal.complete_with_feedback(
            &application_id,
            &employer,
            4,
            "Shipped two features independently",
        ),
    );
    if !completed {
        println!("  walkthrough stopped early");
    }

    let stored = portal.application(&application_id)?;
    match serde_json::to_string_pretty(&stored.status_view()) {
        Ok(json) => println!("\nStudent dashboard payload:\n{json}"),
        Err(err) => println!("\nStudent dashboard payload unavailable: {err}"),
    }

    Ok(())
}

/// Print one lifecycle step; returns whether the walkthrough should continue.
fn step(label: &str, outcome: Result<Application, PortalError>) -> bool {
    match outcome {
        Ok(application) => {
            print!("  {label}: ");
            print_application(&application);
            true
        }
        Err(err) => {
            println!("  {label} refused: {err}");
            false
        }
    }
}

fn print_application(application: &Application) {
    println!(
        "{} -> {} (mentor {})",
        application.id, application.status, application.mentor_approval.status
    );
}

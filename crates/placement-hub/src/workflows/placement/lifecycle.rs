//! Application state machine.
//!
//! ```text
//! applied -> [approved] -> interviewScheduled -> offerExtended -> completed
//! applied | approved | interviewScheduled -> rejected
//! ```
//!
//! The mentor gate (`pending | approved | rejected`) is tracked beside the
//! status. Nothing leaves `applied` until the mentor has decided; a pending
//! application can only be closed by the mentor's own rejection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Feedback, MentorApproval,
    MentorApprovalStatus, MentorDecision, Opportunity, Rating, Role, StatusChange, User,
};
use super::error::PortalError;

/// An action taken against an existing application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LifecycleCommand {
    MentorDecision {
        decision: MentorDecision,
        #[serde(default)]
        comments: String,
    },
    Acknowledge,
    ScheduleInterview {
        date: NaiveDate,
    },
    ExtendOffer,
    Reject,
    Complete {
        rating: i64,
        #[serde(default)]
        comments: String,
    },
}

impl LifecycleCommand {
    pub const fn action(&self) -> &'static str {
        match self {
            LifecycleCommand::MentorDecision { .. } => "record mentor decision",
            LifecycleCommand::Acknowledge => "acknowledge application",
            LifecycleCommand::ScheduleInterview { .. } => "schedule interview",
            LifecycleCommand::ExtendOffer => "extend offer",
            LifecycleCommand::Reject => "reject application",
            LifecycleCommand::Complete { .. } => "complete with feedback",
        }
    }

    /// Roles allowed to issue this command.
    pub const fn allowed_roles(&self) -> &'static [Role] {
        match self {
            LifecycleCommand::MentorDecision { .. } => &[Role::FacultyMentor],
            LifecycleCommand::Acknowledge
            | LifecycleCommand::ScheduleInterview { .. }
            | LifecycleCommand::ExtendOffer
            | LifecycleCommand::Reject => &[Role::PlacementCell],
            LifecycleCommand::Complete { .. } => &[Role::PlacementCell, Role::Employer],
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

/// Build the initial `applied` record for `student` on `opportunity`.
///
/// The duplicate check needs the catalog and is left to the caller.
pub fn open_application(
    id: ApplicationId,
    student: &User,
    opportunity: &Opportunity,
    today: NaiveDate,
) -> Result<Application, PortalError> {
    if !student.is_student() {
        return Err(PortalError::invalid_state(
            "apply",
            format!("only students may apply ({} '{}')", student.role, student.id),
        ));
    }

    if today > opportunity.application_deadline {
        return Err(PortalError::DeadlinePassed {
            deadline: opportunity.application_deadline,
            today,
        });
    }

    Ok(Application {
        id,
        student_id: student.id.clone(),
        opportunity_id: opportunity.id.clone(),
        status: ApplicationStatus::Applied,
        applied_date: today,
        mentor_approval: MentorApproval::pending(),
        interview_date: None,
        feedback: None,
        history: vec![StatusChange {
            status: ApplicationStatus::Applied,
            on: today,
            actor: student.id.clone(),
        }],
        revision: 0,
    })
}

/// Apply `command` to `application`, returning the next value.
///
/// The input is never modified; on error the caller has nothing to write.
pub fn transition(
    application: &Application,
    command: LifecycleCommand,
    actor: &User,
    today: NaiveDate,
) -> Result<Application, PortalError> {
    let action = command.action();
    if !command.permits(actor.role) {
        return Err(PortalError::invalid_state(
            action,
            format!(
                "{} users are not permitted (requires {})",
                actor.role,
                role_list(command.allowed_roles())
            ),
        ));
    }

    let status = application.status;
    let gate = application.mentor_approval.status;
    let mut next = application.clone();

    match command {
        LifecycleCommand::MentorDecision { decision, comments } => {
            if gate != MentorApprovalStatus::Pending {
                return Err(PortalError::invalid_state(
                    action,
                    format!("mentor decision already recorded as {gate}"),
                ));
            }
            require_status(action, status, &[ApplicationStatus::Applied])?;

            next.mentor_approval = MentorApproval {
                status: decision.outcome(),
                comments,
                decided_by: Some(actor.id.clone()),
                decided_on: Some(today),
            };
            if decision == MentorDecision::Reject {
                enter(&mut next, ApplicationStatus::Rejected, actor, today);
            }
        }
        LifecycleCommand::Acknowledge => {
            require_status(action, status, &[ApplicationStatus::Applied])?;
            require_mentor_approval(action, gate)?;
            enter(&mut next, ApplicationStatus::Approved, actor, today);
        }
        LifecycleCommand::ScheduleInterview { date } => {
            require_status(
                action,
                status,
                &[ApplicationStatus::Applied, ApplicationStatus::Approved],
            )?;
            require_mentor_approval(action, gate)?;
            if date < today {
                return Err(PortalError::InvalidInput(format!(
                    "interview date {date} is before today ({today})"
                )));
            }
            next.interview_date = Some(date);
            enter(&mut next, ApplicationStatus::InterviewScheduled, actor, today);
        }
        LifecycleCommand::ExtendOffer => {
            require_status(action, status, &[ApplicationStatus::InterviewScheduled])?;
            enter(&mut next, ApplicationStatus::OfferExtended, actor, today);
        }
        LifecycleCommand::Reject => {
            require_status(
                action,
                status,
                &[
                    ApplicationStatus::Applied,
                    ApplicationStatus::Approved,
                    ApplicationStatus::InterviewScheduled,
                ],
            )?;
            require_mentor_approval(action, gate)?;
            enter(&mut next, ApplicationStatus::Rejected, actor, today);
        }
        LifecycleCommand::Complete { rating, comments } => {
            require_status(action, status, &[ApplicationStatus::OfferExtended])?;
            let rating = Rating::new(rating).ok_or_else(|| {
                PortalError::InvalidInput(format!(
                    "rating must be between {} and {} (found {rating})",
                    Rating::MIN,
                    Rating::MAX
                ))
            })?;
            next.feedback = Some(Feedback {
                rating,
                comments,
                date: today,
            });
            enter(&mut next, ApplicationStatus::Completed, actor, today);
        }
    }

    next.revision = application.revision + 1;
    Ok(next)
}

fn require_status(
    action: &'static str,
    current: ApplicationStatus,
    allowed: &[ApplicationStatus],
) -> Result<(), PortalError> {
    if allowed.contains(&current) {
        return Ok(());
    }
    let expected: Vec<&str> = allowed.iter().map(|status| status.label()).collect();
    Err(PortalError::invalid_state(
        action,
        format!(
            "application is {current}, expected {}",
            expected.join(" or ")
        ),
    ))
}

fn role_list(roles: &[Role]) -> String {
    let labels: Vec<&str> = roles.iter().map(|role| role.label()).collect();
    labels.join(" or ")
}

fn require_mentor_approval(
    action: &'static str,
    gate: MentorApprovalStatus,
) -> Result<(), PortalError> {
    match gate {
        MentorApprovalStatus::Approved => Ok(()),
        MentorApprovalStatus::Pending | MentorApprovalStatus::Rejected => Err(
            PortalError::invalid_state(action, format!("mentor approval is {gate}")),
        ),
    }
}

fn enter(next: &mut Application, status: ApplicationStatus, actor: &User, today: NaiveDate) {
    next.status = status;
    next.history.push(StatusChange {
        status,
        on: today,
        actor: actor.id.clone(),
    });
}

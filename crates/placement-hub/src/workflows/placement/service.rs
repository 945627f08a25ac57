use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::{Catalog, CatalogError};
use super::domain::{
    Application, ApplicationId, MentorApprovalStatus, MentorDecision, NewOpportunity,
    Opportunity, OpportunityId, Role, User, UserId,
};
use super::error::PortalError;
use super::lifecycle::{open_application, transition, LifecycleCommand};
use super::recommendation::{MatchPolicy, PreferenceFit, SkillMatch};
use crate::clock::{self, IdGenerator};
use mockable::Clock;

/// How many times a transition is recomputed when another writer got there first.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// Recommended opportunity as surfaced to a student dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub opportunity: Opportunity,
    pub skill_match: SkillMatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_fit: Option<PreferenceFit>,
    pub already_applied: bool,
}

/// Facade composing the catalog, clock and id source behind the portal operations.
pub struct PlacementPortal<C> {
    catalog: Arc<C>,
    clock: Arc<dyn Clock + Send + Sync>,
    ids: Arc<dyn IdGenerator>,
    policy: MatchPolicy,
}

impl<C> PlacementPortal<C>
where
    C: Catalog + 'static,
{
    pub fn new(
        catalog: Arc<C>,
        clock: Arc<dyn Clock + Send + Sync>,
        ids: Arc<dyn IdGenerator>,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            catalog,
            clock,
            ids,
            policy,
        }
    }

    /// Register a user. Ids are unique, so a role can never be reassigned. Skills and search
    /// preferences belong to students only.
    pub fn register_user(&self, mut user: User) -> Result<User, PortalError> {
        if user.id.0.trim().is_empty() {
            return Err(PortalError::InvalidInput("user id is required".to_string()));
        }
        if !user.is_student() && !user.skills.is_empty() {
            return Err(PortalError::InvalidInput(format!(
                "{} users do not carry skills",
                user.role
            )));
        }
        if let Some(preferences) = &user.preferences {
            if !user.is_student() {
                return Err(PortalError::InvalidInput(format!(
                    "{} users do not carry search preferences",
                    user.role
                )));
            }
            if preferences.min_stipend > preferences.max_stipend {
                return Err(PortalError::InvalidInput(format!(
                    "minimum stipend {} exceeds maximum stipend {}",
                    preferences.min_stipend, preferences.max_stipend
                )));
            }
        }
        user.skills = clean_skills(user.skills)?;

        let stored = self.catalog.insert_user(user).map_err(|err| match err {
            CatalogError::Conflict => {
                PortalError::InvalidInput("user is already registered".to_string())
            }
            other => PortalError::Catalog(other),
        })?;
        info!(user_id = %stored.id, role = %stored.role, "registered portal user");
        Ok(stored)
    }

    pub fn user(&self, user_id: &UserId) -> Result<User, PortalError> {
        self.catalog
            .user(user_id)?
            .ok_or_else(|| PortalError::not_found("user", user_id.0.clone()))
    }

    /// Append a skill to a student's profile.
    pub fn add_skill(&self, student_id: &UserId, skill: &str) -> Result<User, PortalError> {
        self.student(student_id, "add skill")?;
        let skill = skill.trim();
        if skill.is_empty() {
            return Err(PortalError::InvalidInput("skill must not be blank".to_string()));
        }

        Ok(self
            .catalog
            .edit_skills(student_id, &mut |skills| skills.push(skill.to_string()))?)
    }

    /// Drop every occurrence of `skill` from a student's profile. Unknown skills are ignored.
    pub fn remove_skill(&self, student_id: &UserId, skill: &str) -> Result<User, PortalError> {
        self.student(student_id, "remove skill")?;
        Ok(self
            .catalog
            .edit_skills(student_id, &mut |skills| skills.retain(|owned| owned != skill))?)
    }

    /// Publish a new listing on behalf of the placement cell.
    pub fn post_opportunity(
        &self,
        author_id: &UserId,
        draft: NewOpportunity,
    ) -> Result<Opportunity, PortalError> {
        let author = self.user(author_id)?;
        if author.role != Role::PlacementCell {
            return Err(PortalError::invalid_state(
                "post opportunity",
                format!("{} users are not permitted", author.role),
            ));
        }

        let title = draft.title.trim();
        let company = draft.company.trim();
        if title.is_empty() || company.is_empty() {
            return Err(PortalError::InvalidInput(
                "title and company are required".to_string(),
            ));
        }

        let opportunity = Opportunity {
            id: OpportunityId(self.ids.next_id("opp")),
            title: title.to_string(),
            company: company.to_string(),
            description: draft.description,
            required_skills: clean_skills(draft.required_skills)?,
            department: draft.department,
            stipend: draft.stipend,
            duration: draft.duration,
            location: draft.location,
            placement_conversion: draft.placement_conversion,
            application_deadline: draft.application_deadline,
            posted_by: author.id,
            created_at: self.today(),
        };

        let stored = self.catalog.insert_opportunity(opportunity)?;
        info!(
            opportunity_id = %stored.id,
            company = %stored.company,
            deadline = %stored.application_deadline,
            "opportunity posted"
        );
        Ok(stored)
    }

    pub fn opportunities(&self) -> Result<Vec<Opportunity>, PortalError> {
        Ok(self.catalog.opportunities()?)
    }

    pub fn opportunities_posted_by(
        &self,
        author_id: &UserId,
    ) -> Result<Vec<Opportunity>, PortalError> {
        Ok(self
            .catalog
            .opportunities()?
            .into_iter()
            .filter(|opportunity| &opportunity.posted_by == author_id)
            .collect())
    }

    /// Opportunities recommended to `student_id` under the configured policy.
    ///
    /// Non-student users receive an empty list rather than an error.
    pub fn recommendations(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Recommendation>, PortalError> {
        let student = self.user(student_id)?;
        let opportunities = self.catalog.opportunities()?;
        let applied: Vec<OpportunityId> = self
            .catalog
            .applications()?
            .into_iter()
            .filter(|application| &application.student_id == student_id)
            .map(|application| application.opportunity_id)
            .collect();

        let recommendations: Vec<Recommendation> = self
            .policy
            .select(&student, &opportunities)
            .into_iter()
            .map(|scored| Recommendation {
                preference_fit: student
                    .preferences
                    .as_ref()
                    .map(|preferences| PreferenceFit::evaluate(preferences, scored.opportunity)),
                already_applied: applied.contains(&scored.opportunity.id),
                opportunity: scored.opportunity.clone(),
                skill_match: scored.skill_match,
            })
            .collect();

        debug!(
            student_id = %student_id,
            catalog = opportunities.len(),
            recommended = recommendations.len(),
            "computed recommendations"
        );
        Ok(recommendations)
    }

    /// Create an `applied` record for the student on the opportunity.
    pub fn apply(
        &self,
        student_id: &UserId,
        opportunity_id: &OpportunityId,
    ) -> Result<Application, PortalError> {
        let student = self.user(student_id)?;
        let opportunity = self
            .catalog
            .opportunity(opportunity_id)?
            .ok_or_else(|| PortalError::not_found("opportunity", opportunity_id.0.clone()))?;

        let duplicate = || PortalError::DuplicateApplication {
            student_id: student_id.0.clone(),
            opportunity_id: opportunity_id.0.clone(),
        };

        if self.catalog.applications()?.iter().any(|existing| {
            &existing.student_id == student_id && &existing.opportunity_id == opportunity_id
        }) {
            warn!(
                student_id = %student_id,
                opportunity_id = %opportunity_id,
                "duplicate application refused"
            );
            return Err(duplicate());
        }

        let application = open_application(
            ApplicationId(self.ids.next_id("app")),
            &student,
            &opportunity,
            self.today(),
        )?;

        // The unique key also closes the window between the scan above and the insert.
        let stored = self
            .catalog
            .insert_application(application)
            .map_err(|err| match err {
                CatalogError::Conflict => duplicate(),
                other => PortalError::Catalog(other),
            })?;

        info!(
            application_id = %stored.id,
            student_id = %student_id,
            opportunity_id = %opportunity_id,
            "application submitted"
        );
        Ok(stored)
    }

    pub fn decide_mentor_approval(
        &self,
        application_id: &ApplicationId,
        mentor_id: &UserId,
        decision: MentorDecision,
        comments: impl Into<String>,
    ) -> Result<Application, PortalError> {
        self.run(
            application_id,
            mentor_id,
            LifecycleCommand::MentorDecision {
                decision,
                comments: comments.into(),
            },
        )
    }

    pub fn acknowledge(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
    ) -> Result<Application, PortalError> {
        self.run(application_id, actor_id, LifecycleCommand::Acknowledge)
    }

    pub fn schedule_interview(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
        date: NaiveDate,
    ) -> Result<Application, PortalError> {
        self.run(
            application_id,
            actor_id,
            LifecycleCommand::ScheduleInterview { date },
        )
    }

    pub fn extend_offer(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
    ) -> Result<Application, PortalError> {
        self.run(application_id, actor_id, LifecycleCommand::ExtendOffer)
    }

    pub fn reject(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
    ) -> Result<Application, PortalError> {
        self.run(application_id, actor_id, LifecycleCommand::Reject)
    }

    pub fn complete_with_feedback(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
        rating: i64,
        comments: impl Into<String>,
    ) -> Result<Application, PortalError> {
        self.run(
            application_id,
            actor_id,
            LifecycleCommand::Complete {
                rating,
                comments: comments.into(),
            },
        )
    }

    /// Fetch a single application.
    pub fn application(&self, application_id: &ApplicationId) -> Result<Application, PortalError> {
        self.catalog
            .application(application_id)?
            .ok_or_else(|| PortalError::not_found("application", application_id.0.clone()))
    }

    pub fn applications_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Application>, PortalError> {
        Ok(self
            .catalog
            .applications()?
            .into_iter()
            .filter(|application| &application.student_id == student_id)
            .collect())
    }

    pub fn application_count(&self, opportunity_id: &OpportunityId) -> Result<usize, PortalError> {
        Ok(self
            .catalog
            .applications()?
            .iter()
            .filter(|application| &application.opportunity_id == opportunity_id)
            .count())
    }

    /// Applications still waiting on a mentor decision.
    pub fn pending_mentor_approvals(&self) -> Result<Vec<Application>, PortalError> {
        Ok(self
            .catalog
            .applications()?
            .into_iter()
            .filter(|application| {
                application.mentor_approval.status == MentorApprovalStatus::Pending
                    && !application.status.is_terminal()
            })
            .collect())
    }

    /// Applications on which `mentor_id` has recorded a decision.
    pub fn mentor_history(&self, mentor_id: &UserId) -> Result<Vec<Application>, PortalError> {
        Ok(self
            .catalog
            .applications()?
            .into_iter()
            .filter(|application| {
                application.mentor_approval.decided_by.as_ref() == Some(mentor_id)
            })
            .collect())
    }

    fn today(&self) -> NaiveDate {
        clock::today(self.clock.as_ref())
    }

    fn student(&self, student_id: &UserId, action: &'static str) -> Result<User, PortalError> {
        let user = self.user(student_id)?;
        if !user.is_student() {
            return Err(PortalError::invalid_state(
                action,
                format!("{} users do not carry skills", user.role),
            ));
        }
        Ok(user)
    }

    /// Fetch, transition and compare-and-swap, recomputing when a concurrent write wins.
    fn run(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
        command: LifecycleCommand,
    ) -> Result<Application, PortalError> {
        let actor = self.user(actor_id)?;
        let action = command.action();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let current = self.application(application_id)?;
            let next = match transition(&current, command.clone(), &actor, self.today()) {
                Ok(next) => next,
                Err(err) => {
                    warn!(
                        application_id = %application_id,
                        actor_id = %actor_id,
                        status = %current.status,
                        error = %err,
                        "transition refused"
                    );
                    return Err(err);
                }
            };

            match self.catalog.update_application(next, current.revision) {
                Ok(stored) => {
                    info!(
                        application_id = %application_id,
                        actor_id = %actor_id,
                        from = %current.status,
                        to = %stored.status,
                        mentor_approval = %stored.mentor_approval.status,
                        "{action}"
                    );
                    return Ok(stored);
                }
                Err(CatalogError::Stale { expected, found })
                    if attempt < MAX_TRANSITION_ATTEMPTS =>
                {
                    debug!(
                        application_id = %application_id,
                        expected,
                        found,
                        attempt,
                        "application changed underneath transition; retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Trim skills and reject blanks; order and duplicates are kept for display.
fn clean_skills(skills: Vec<String>) -> Result<Vec<String>, PortalError> {
    skills
        .into_iter()
        .map(|skill| {
            let trimmed = skill.trim();
            if trimmed.is_empty() {
                Err(PortalError::InvalidInput("skills must not be blank".to_string()))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

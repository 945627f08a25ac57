use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for portal users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for posted opportunities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpportunityId(pub String);

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of portal roles. Assigned at registration and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Student,
    PlacementCell,
    FacultyMentor,
    Employer,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::PlacementCell => "placementCell",
            Role::FacultyMentor => "facultyMentor",
            Role::Employer => "employer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Search preferences a student records alongside their skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPreferences {
    pub location: String,
    pub min_stipend: u32,
    pub max_stipend: u32,
    pub placement_conversion: bool,
}

/// A portal account. Skills and preferences only carry meaning for students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub department: Option<String>,
    /// Display order and duplicates are preserved; matching is case-insensitive.
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub preferences: Option<SearchPreferences>,
}

impl User {
    pub fn is_student(&self) -> bool {
        matches!(self.role, Role::Student)
    }
}

/// Listing as posted by the placement cell. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub title: String,
    pub company: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub department: String,
    /// Monthly stipend in rupees.
    pub stipend: u32,
    pub duration: String,
    pub location: String,
    pub placement_conversion: bool,
    pub application_deadline: NaiveDate,
    pub posted_by: UserId,
    pub created_at: NaiveDate,
}

/// Posting form submitted by the placement cell; ids and dates are assigned on post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOpportunity {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub stipend: u32,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub placement_conversion: bool,
    pub application_deadline: NaiveDate,
}

/// Overall application status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationStatus {
    Applied,
    Approved,
    Rejected,
    InterviewScheduled,
    OfferExtended,
    Completed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::InterviewScheduled => "interviewScheduled",
            ApplicationStatus::OfferExtended => "offerExtended",
            ApplicationStatus::Completed => "completed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Completed | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mentor gate, tracked apart from the overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MentorApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl MentorApprovalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MentorApprovalStatus::Pending => "pending",
            MentorApprovalStatus::Approved => "approved",
            MentorApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MentorApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decision a faculty mentor can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MentorDecision {
    Approve,
    Reject,
}

impl MentorDecision {
    pub const fn outcome(self) -> MentorApprovalStatus {
        match self {
            MentorDecision::Approve => MentorApprovalStatus::Approved,
            MentorDecision::Reject => MentorApprovalStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorApproval {
    pub status: MentorApprovalStatus,
    pub comments: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_on: Option<NaiveDate>,
}

impl MentorApproval {
    pub fn pending() -> Self {
        Self {
            status: MentorApprovalStatus::Pending,
            comments: String::new(),
            decided_by: None,
            decided_on: None,
        }
    }
}

/// Completion rating on a 1 to 5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            u8::try_from(value).ok().map(Self)
        } else {
            None
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| {
            format!(
                "rating must be between {} and {} (found {value})",
                Rating::MIN,
                Rating::MAX
            )
        })
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: Rating,
    pub comments: String,
    pub date: NaiveDate,
}

/// Audit entry written for every status the application enters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub on: NaiveDate,
    pub actor: UserId,
}

/// A student's bid for one opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: UserId,
    pub opportunity_id: OpportunityId,
    pub status: ApplicationStatus,
    pub applied_date: NaiveDate,
    pub mentor_approval: MentorApproval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(default)]
    pub history: Vec<StatusChange>,
    /// Bumped on every stored transition; used for compare-and-swap writes.
    #[serde(default)]
    pub revision: u64,
}

impl Application {
    pub fn status_trail(&self) -> Vec<ApplicationStatus> {
        self.history.iter().map(|change| change.status).collect()
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            opportunity_id: self.opportunity_id.clone(),
            status: self.status.label(),
            mentor_approval: self.mentor_approval.status.label(),
            applied_date: self.applied_date,
            interview_date: self.interview_date,
            rating: self.feedback.as_ref().map(|feedback| feedback.rating.value()),
        }
    }
}

/// Flattened application summary for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub opportunity_id: OpportunityId,
    pub status: &'static str,
    pub mentor_approval: &'static str,
    pub applied_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

//! Campus placement portal: opportunity recommendations and the application lifecycle.

pub mod catalog;
pub mod domain;
mod error;
pub mod lifecycle;
pub mod recommendation;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, CatalogError, InMemoryCatalog};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationStatusView, Feedback,
    MentorApproval, MentorApprovalStatus, MentorDecision, NewOpportunity, Opportunity,
    OpportunityId, Rating, Role, SearchPreferences, StatusChange, User, UserId,
};
pub use error::PortalError;
pub use lifecycle::{open_application, transition, LifecycleCommand};
pub use recommendation::{
    recommend, skill_match, MatchPolicy, PreferenceFit, RecommendationOrder, ScoredOpportunity,
    SkillMatch,
};
pub use router::portal_router;
pub use service::{PlacementPortal, Recommendation};

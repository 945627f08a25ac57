use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::domain::{Application, ApplicationId, Opportunity, OpportunityId, User, UserId};

/// Storage contract the host provides for users, opportunities and applications.
///
/// Implementations must make `insert_application` atomic with respect to the
/// (student, opportunity) key and `update_application` atomic with respect to
/// the stored revision.
pub trait Catalog: Send + Sync {
    fn user(&self, id: &UserId) -> Result<Option<User>, CatalogError>;
    fn insert_user(&self, user: User) -> Result<User, CatalogError>;
    /// Apply `edit` to the user's skill list in place, atomically with respect to other edits.
    fn edit_skills(
        &self,
        id: &UserId,
        edit: &mut dyn FnMut(&mut Vec<String>),
    ) -> Result<User, CatalogError>;

    fn opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, CatalogError>;
    /// All opportunities in posting order.
    fn opportunities(&self) -> Result<Vec<Opportunity>, CatalogError>;
    fn insert_opportunity(&self, opportunity: Opportunity) -> Result<Opportunity, CatalogError>;

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, CatalogError>;
    /// All applications in submission order.
    fn applications(&self) -> Result<Vec<Application>, CatalogError>;
    fn insert_application(&self, application: Application) -> Result<Application, CatalogError>;
    /// Store `next` only if the stored copy is still at `expected_revision`.
    fn update_application(
        &self,
        next: Application,
        expected_revision: u64,
    ) -> Result<Application, CatalogError>;
}

/// Error enumeration for catalog failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read (expected revision {expected}, found {found})")]
    Stale { expected: u64, found: u64 },
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    opportunities: Vec<Opportunity>,
    opportunity_index: HashMap<OpportunityId, usize>,
    applications: Vec<Application>,
    application_index: HashMap<ApplicationId, usize>,
    application_keys: HashSet<(UserId, OpportunityId)>,
}

/// Mutex-guarded in-memory catalog for a single process.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    tables: Mutex<Tables>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, CatalogError> {
        self.tables
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))
    }
}

impl Catalog for InMemoryCatalog {
    fn user(&self, id: &UserId) -> Result<Option<User>, CatalogError> {
        Ok(self.tables()?.users.get(id).cloned())
    }

    fn insert_user(&self, user: User) -> Result<User, CatalogError> {
        let mut tables = self.tables()?;
        if tables.users.contains_key(&user.id) {
            return Err(CatalogError::Conflict);
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn edit_skills(
        &self,
        id: &UserId,
        edit: &mut dyn FnMut(&mut Vec<String>),
    ) -> Result<User, CatalogError> {
        let mut tables = self.tables()?;
        let user = tables.users.get_mut(id).ok_or(CatalogError::NotFound)?;
        edit(&mut user.skills);
        Ok(user.clone())
    }

    fn opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, CatalogError> {
        let tables = self.tables()?;
        Ok(tables
            .opportunity_index
            .get(id)
            .and_then(|&slot| tables.opportunities.get(slot))
            .cloned())
    }

    fn opportunities(&self) -> Result<Vec<Opportunity>, CatalogError> {
        Ok(self.tables()?.opportunities.clone())
    }

    fn insert_opportunity(&self, opportunity: Opportunity) -> Result<Opportunity, CatalogError> {
        let mut tables = self.tables()?;
        if tables.opportunity_index.contains_key(&opportunity.id) {
            return Err(CatalogError::Conflict);
        }
        let slot = tables.opportunities.len();
        tables.opportunity_index.insert(opportunity.id.clone(), slot);
        tables.opportunities.push(opportunity.clone());
        Ok(opportunity)
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, CatalogError> {
        let tables = self.tables()?;
        Ok(tables
            .application_index
            .get(id)
            .and_then(|&slot| tables.applications.get(slot))
            .cloned())
    }

    fn applications(&self) -> Result<Vec<Application>, CatalogError> {
        Ok(self.tables()?.applications.clone())
    }

    fn insert_application(&self, application: Application) -> Result<Application, CatalogError> {
        let mut tables = self.tables()?;
        let key = (
            application.student_id.clone(),
            application.opportunity_id.clone(),
        );
        if tables.application_index.contains_key(&application.id)
            || tables.application_keys.contains(&key)
        {
            return Err(CatalogError::Conflict);
        }
        let slot = tables.applications.len();
        tables.application_keys.insert(key);
        tables.application_index.insert(application.id.clone(), slot);
        tables.applications.push(application.clone());
        Ok(application)
    }

    fn update_application(
        &self,
        next: Application,
        expected_revision: u64,
    ) -> Result<Application, CatalogError> {
        let mut tables = self.tables()?;
        let slot = *tables
            .application_index
            .get(&next.id)
            .ok_or(CatalogError::NotFound)?;
        let stored = tables
            .applications
            .get_mut(slot)
            .ok_or(CatalogError::NotFound)?;
        if stored.revision != expected_revision {
            return Err(CatalogError::Stale {
                expected: expected_revision,
                found: stored.revision,
            });
        }
        *stored = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::placement::domain::{ApplicationStatus, MentorApproval, Role};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 11, day).expect("valid date")
    }

    fn application(id: &str, student: &str, opportunity: &str) -> Application {
        Application {
            id: ApplicationId(id.to_string()),
            student_id: UserId(student.to_string()),
            opportunity_id: OpportunityId(opportunity.to_string()),
            status: ApplicationStatus::Applied,
            applied_date: date(10),
            mentor_approval: MentorApproval::pending(),
            interview_date: None,
            feedback: None,
            history: Vec::new(),
            revision: 0,
        }
    }

    #[test]
    fn insert_application_enforces_student_opportunity_key() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_application(application("app-1", "user-1", "opp-1"))
            .expect("first insert");

        let err = catalog
            .insert_application(application("app-2", "user-1", "opp-1"))
            .expect_err("same pair rejected");
        assert_eq!(err, CatalogError::Conflict);

        catalog
            .insert_application(application("app-3", "user-1", "opp-2"))
            .expect("different opportunity accepted");
        assert_eq!(catalog.applications().expect("list").len(), 2);
    }

    #[test]
    fn update_application_rejects_stale_revision() {
        let catalog = InMemoryCatalog::new();
        let stored = catalog
            .insert_application(application("app-1", "user-1", "opp-1"))
            .expect("insert");

        let mut first = stored.clone();
        first.status = ApplicationStatus::Approved;
        first.revision = 1;
        catalog.update_application(first, 0).expect("first writer wins");

        let mut second = stored;
        second.status = ApplicationStatus::Rejected;
        second.revision = 1;
        let err = catalog
            .update_application(second, 0)
            .expect_err("second writer loses");
        assert_eq!(
            err,
            CatalogError::Stale {
                expected: 0,
                found: 1
            }
        );

        let current = catalog
            .application(&ApplicationId("app-1".to_string()))
            .expect("fetch")
            .expect("present");
        assert_eq!(current.status, ApplicationStatus::Approved);
    }

    #[test]
    fn users_cannot_be_registered_twice() {
        let catalog = InMemoryCatalog::new();
        let user = User {
            id: UserId("user-1".to_string()),
            name: "Rajesh Kumar".to_string(),
            email: "rajesh.kumar@example.com".to_string(),
            role: Role::Student,
            department: None,
            skills: Vec::new(),
            preferences: None,
        };
        catalog.insert_user(user.clone()).expect("first registration");

        let mut relabelled = user;
        relabelled.role = Role::PlacementCell;
        assert_eq!(
            catalog.insert_user(relabelled).expect_err("role cannot change"),
            CatalogError::Conflict
        );
    }

    #[test]
    fn skill_edits_run_against_the_stored_list() {
        let catalog = InMemoryCatalog::new();
        let mut user = User {
            id: UserId("user-1".to_string()),
            name: "Rajesh Kumar".to_string(),
            email: "rajesh.kumar@example.com".to_string(),
            role: Role::Student,
            department: None,
            skills: vec!["Python".to_string()],
            preferences: None,
        };
        catalog.insert_user(user.clone()).expect("registered");

        let updated = catalog
            .edit_skills(&user.id, &mut |skills| skills.push("SQL".to_string()))
            .expect("edited");
        assert_eq!(updated.skills, vec!["Python", "SQL"]);

        user.id = UserId("ghost".to_string());
        assert_eq!(
            catalog
                .edit_skills(&user.id, &mut |skills| skills.clear())
                .expect_err("unknown user"),
            CatalogError::NotFound
        );
    }
}

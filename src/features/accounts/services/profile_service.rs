use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::error::{AppError, Result};
use crate::features::accounts::dtos::StudentProfileResponseDto;
use crate::features::auth::model::AuthenticatedUser;
use crate::modules::store::CaseStore;
use crate::shared::validation::normalize_block;

/// Lookups of student profiles for the student themselves and for reviewers
pub struct ProfileService {
    store: Arc<dyn CaseStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self { store }
    }

    /// Profile of the calling student
    pub async fn own_profile(&self, user: &AuthenticatedUser) -> Result<StudentProfileResponseDto> {
        let account = self
            .store
            .find_account(user.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let profile = self.store.find_student_profile(user.user_id).await?;

        Ok(StudentProfileResponseDto::new(account, profile))
    }

    /// Profile of the student holding `student_identifier`.
    ///
    /// Block admins only see students of their own block; anything else is
    /// reported as not found.
    pub async fn profile_by_identifier(
        &self,
        actor: &AuthenticatedUser,
        student_identifier: &str,
    ) -> Result<StudentProfileResponseDto> {
        let not_found = || AppError::NotFound("Student not found".to_string());

        let profile = self
            .store
            .find_student_profile_by_identifier(student_identifier.trim())
            .await?
            .ok_or_else(not_found)?;

        let actor_account = self.store.find_account(actor.user_id).await?;
        let actor_block = normalize_block(actor_account.as_ref().and_then(|a| a.block.as_deref()));
        if !actor
            .role
            .can_review(actor_block.as_deref(), Some(profile.block.as_str()))
        {
            debug!(
                "{} looked up student outside their block",
                actor.timeline_label()
            );
            return Err(not_found());
        }

        let account = self
            .store
            .find_account(profile.user_id)
            .await?
            .ok_or_else(|| {
                warn!("Student profile {} has no account", profile.user_id);
                not_found()
            })?;

        Ok(StudentProfileResponseDto::new(account, Some(profile)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::Role;
    use crate::shared::test_helpers::{as_user, MemoryCaseStore};

    fn service(store: &MemoryCaseStore) -> ProfileService {
        ProfileService::new(Arc::new(store.clone()))
    }

    async fn identifier_of(store: &MemoryCaseStore, student: uuid::Uuid) -> String {
        store
            .find_student_profile(student)
            .await
            .unwrap()
            .unwrap()
            .student_identifier
    }

    #[tokio::test]
    async fn test_own_profile_merges_account_and_profile() {
        let store = MemoryCaseStore::new();
        let student = store.add_student("A").await;
        let identifier = identifier_of(&store, student.id).await;

        let profile = service(&store).own_profile(&as_user(&student)).await.unwrap();

        assert_eq!(profile.id, student.id);
        assert_eq!(profile.name, student.name);
        assert_eq!(profile.email, student.email);
        assert_eq!(profile.block.as_deref(), Some("A"));
        assert_eq!(profile.student_identifier, Some(identifier));
        assert!(profile.room_no.is_some());
    }

    #[tokio::test]
    async fn test_own_profile_without_student_record() {
        let store = MemoryCaseStore::new();
        let student = store.add_account(Role::Student, Some("B")).await;

        let profile = service(&store).own_profile(&as_user(&student)).await.unwrap();

        assert_eq!(profile.id, student.id);
        assert!(profile.student_identifier.is_none());
        assert!(profile.room_no.is_none());
    }

    #[tokio::test]
    async fn test_own_profile_unknown_account() {
        let store = MemoryCaseStore::new();
        let ghost = AuthenticatedUser::new(uuid::Uuid::new_v4(), Role::Student);

        let result = service(&store).own_profile(&ghost).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_identifier_is_block_scoped() {
        let store = MemoryCaseStore::new();
        let student = store.add_student("C").await;
        let identifier = identifier_of(&store, student.id).await;
        let admin_c = store.add_account(Role::Admin, Some("C")).await;
        let admin_d = store.add_account(Role::Admin, Some("D")).await;
        let chief = store.add_account(Role::ChiefAdmin, None).await;
        let service = service(&store);

        let seen = service
            .profile_by_identifier(&as_user(&admin_c), &identifier)
            .await
            .unwrap();
        assert_eq!(seen.id, student.id);
        assert_eq!(seen.name, student.name);

        let seen = service
            .profile_by_identifier(&as_user(&chief), &identifier)
            .await
            .unwrap();
        assert_eq!(seen.student_identifier.as_deref(), Some(identifier.as_str()));

        let hidden = service
            .profile_by_identifier(&as_user(&admin_d), &identifier)
            .await;
        assert!(matches!(hidden, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_unknown_identifier() {
        let store = MemoryCaseStore::new();
        let chief = store.add_account(Role::ChiefAdmin, None).await;

        let result = service(&store)
            .profile_by_identifier(&as_user(&chief), "NOPE-1")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

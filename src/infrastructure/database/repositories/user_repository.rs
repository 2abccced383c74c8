use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};

use crate::domain::{
    DomainError, DomainResult, PreparedAccount, StoredCredentials, UserAccount, UserRepository,
    UserRole,
};
use crate::infrastructure::database::entities::user;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model_by_email(&self, email: &str) -> DomainResult<Option<user::Model>> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::ComplianceOfficer => UserRole::ComplianceOfficer,
        user::UserRole::Analyst => UserRole::Analyst,
        user::UserRole::Auditor => UserRole::Auditor,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Admin => user::UserRole::Admin,
        UserRole::ComplianceOfficer => user::UserRole::ComplianceOfficer,
        UserRole::Analyst => user::UserRole::Analyst,
        UserRole::Auditor => user::UserRole::Auditor,
    }
}

/// Default read: the hash column is dropped here.
fn model_to_account(model: user::Model) -> UserAccount {
    model_to_credentials(model).account
}

fn model_to_credentials(model: user::Model) -> StoredCredentials {
    StoredCredentials {
        account: UserAccount {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            role: entity_role_to_domain(model.role),
            is_active: model.is_active,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        },
        password_hash: model.password_hash,
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

fn write_err(e: DbErr, email: &str) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            DomainError::Conflict(format!("Email {} already exists", email))
        }
        _ => db_err(e),
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn save(&self, account: PreparedAccount) -> DomainResult<UserAccount> {
        let now = Utc::now();
        let email = account.email.clone();

        let Some(id) = account.id else {
            let new_user = user::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                first_name: Set(account.first_name),
                last_name: Set(account.last_name),
                email: Set(account.email),
                password_hash: Set(account.password_hash),
                role: Set(domain_role_to_entity(account.role)),
                is_active: Set(account.is_active),
                last_login: Set(account.last_login),
                created_at: Set(account.created_at.unwrap_or(now)),
                updated_at: Set(now),
            };

            let model = new_user
                .insert(&self.db)
                .await
                .map_err(|e| write_err(e, &email))?;
            return Ok(model_to_account(model));
        };

        let existing = user::Entity::find_by_id(id.as_str())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::user_not_found(&id))?;

        let mut active: user::ActiveModel = existing.into();
        active.first_name = Set(account.first_name);
        active.last_name = Set(account.last_name);
        active.email = Set(account.email);
        active.password_hash = Set(account.password_hash);
        active.role = Set(domain_role_to_entity(account.role));
        active.is_active = Set(account.is_active);
        active.last_login = Set(account.last_login);
        active.updated_at = Set(now);

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| write_err(e, &email))?;
        Ok(model_to_account(model))
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<UserAccount>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(model_to_account))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserAccount>> {
        Ok(self.find_model_by_email(email).await?.map(model_to_account))
    }

    async fn find_credentials_by_id(&self, id: &str) -> DomainResult<Option<StoredCredentials>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(model_to_credentials))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> DomainResult<Option<StoredCredentials>> {
        Ok(self
            .find_model_by_email(email)
            .await?
            .map(model_to_credentials))
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;

    use crate::application::CredentialManager;
    use crate::domain::{AccountPreparer, PendingAccount};
    use crate::infrastructure::crypto::jwt::JwtConfig;
    use crate::infrastructure::database::migrator::Migrator;

    async fn repo() -> SeaOrmUserRepository {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SeaOrmUserRepository::new(db)
    }

    fn manager() -> CredentialManager {
        CredentialManager::new(JwtConfig::new("test-secret", 3600)).with_password_cost(4)
    }

    async fn prepared(email: &str, role: UserRole) -> PreparedAccount {
        let pending = PendingAccount::new("Ada", "Lovelace", email, "long-enough", role);
        manager().prepare_for_storage(pending).await.unwrap()
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let repo = repo().await;
        let account = repo
            .save(prepared("a@b.co", UserRole::ComplianceOfficer).await)
            .await
            .unwrap();

        let found = repo.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(found.email, "a@b.co");
        assert_eq!(found.role, UserRole::ComplianceOfficer);
        assert!(found.is_active);

        let creds = repo.find_credentials_by_email("a@b.co").await.unwrap().unwrap();
        assert!(creds.password_hash.starts_with("$2b$04$"));
        assert!(manager()
            .match_password(&creds, &"long-enough".into())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let repo = repo().await;
        repo.save(prepared("a@b.co", UserRole::Analyst).await).await.unwrap();

        let err = repo
            .save(prepared("a@b.co", UserRole::Auditor).await)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_keeps_created_at_and_hash() {
        let repo = repo().await;
        let account = repo.save(prepared("a@b.co", UserRole::Analyst).await).await.unwrap();
        let before = repo.find_credentials_by_id(&account.id).await.unwrap().unwrap();

        let mut pending = PendingAccount::from(before.clone());
        pending.role = UserRole::Admin;
        let updated = repo
            .save(manager().prepare_for_storage(pending).await.unwrap())
            .await
            .unwrap();

        assert_eq!(updated.id, account.id);
        assert_eq!(updated.role, UserRole::Admin);

        let after = repo.find_credentials_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(after.password_hash, before.password_hash);
        assert_eq!(after.account.created_at, before.account.created_at);
    }

    #[tokio::test]
    async fn missing_rows_are_none() {
        let repo = repo().await;
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
        assert!(repo.find_by_email("nobody@b.co").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}

use std::sync::Arc;

use crate::auth::{hash_password, verify_password, UNUSABLE_PASSWORD};
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, Store};

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Users must have an email address")]
    MissingEmail,
    #[error("A user with this email already exists")]
    DuplicateEmail,
    #[error("Unable to authenticate with provided credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for IdentityError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(_) => IdentityError::DuplicateEmail,
            other => IdentityError::Database(other),
        }
    }
}

/// Optional account fields beyond email and password.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Default for UserFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}

impl UserFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Already validated profile edits; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Lower-case the domain part of an email, leaving the local part untouched.
pub fn normalize_email(email: &str) -> String {
    let trimmed = email.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

// Argon2 is CPU bound; run it on the blocking pool
async fn hash(password: &str) -> Result<String, IdentityError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| IdentityError::Hash(e.to_string()))?
        .map_err(|e| IdentityError::Hash(e.to_string()))
}

async fn verify(password: &str, stored: &str) -> bool {
    let (password, stored) = (password.to_string(), stored.to_string());
    match tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await {
        Ok(verified) => verified,
        Err(e) => {
            tracing::error!("Password verification task failed: {}", e);
            false
        }
    }
}

/// Account creation, credential checks and profile updates.
pub struct IdentityService {
    store: Arc<dyn Store>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a regular user. Without a password the account gets an unusable hash.
    pub async fn create_user(
        &self,
        email: Option<&str>,
        password: Option<&str>,
        fields: UserFields,
    ) -> Result<User, IdentityError> {
        let email = match email.map(normalize_email) {
            Some(email) if !email.is_empty() => email,
            _ => return Err(IdentityError::MissingEmail),
        };

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail);
        }

        let password_hash = match password {
            Some(password) => hash(password).await?,
            None => UNUSABLE_PASSWORD.to_string(),
        };

        let user = self
            .store
            .insert_user(NewUser {
                email,
                name: fields.name,
                password_hash,
                is_active: fields.is_active,
                is_staff: fields.is_staff,
                is_superuser: fields.is_superuser,
            })
            .await?;

        tracing::info!("Created user {} (id {})", user, user.id);
        Ok(user)
    }

    /// Create a user with staff and superuser privileges
    pub async fn create_superuser(&self, email: &str, password: &str) -> Result<User, IdentityError> {
        let mut user = self
            .create_user(Some(email), Some(password), UserFields::default())
            .await?;
        user.is_staff = true;
        user.is_superuser = true;
        let user = self.store.update_user(&user).await?;

        tracing::info!("Promoted {} to superuser", user);
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, IdentityError> {
        let email = normalize_email(email);

        let user = self.store.find_user_by_email(&email).await?;
        let verified = match &user {
            Some(user) if user.is_active => verify(password, &user.password_hash).await,
            _ => false,
        };

        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::warn!("Failed authentication attempt for {}", email);
                return Err(IdentityError::InvalidCredentials);
            }
        };

        tracing::info!("User {} authenticated", user);
        Ok(user)
    }

    pub async fn update_profile(&self, mut user: User, changes: ProfileChanges) -> Result<User, IdentityError> {
        if let Some(email) = changes.email {
            let email = normalize_email(&email);
            if email.is_empty() {
                return Err(IdentityError::MissingEmail);
            }
            if email != user.email {
                if let Some(existing) = self.store.find_user_by_email(&email).await? {
                    if existing.id != user.id {
                        return Err(IdentityError::DuplicateEmail);
                    }
                }
            }
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password) = changes.password {
            user.password_hash = hash(&password).await?;
        }

        Ok(self.store.update_user(&user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service() -> IdentityService {
        IdentityService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn domain_is_lowercased_but_local_part_is_not() {
        assert_eq!(normalize_email("test1@EXAMPLE.com"), "test1@example.com");
        assert_eq!(normalize_email("Test2@Example.com"), "Test2@example.com");
        assert_eq!(normalize_email("TEST3@EXAMPLE.COM"), "TEST3@example.com");
        assert_eq!(normalize_email("test4@example.COM"), "test4@example.com");
    }

    #[tokio::test]
    async fn create_user_hashes_password_and_applies_defaults() {
        let identity = service();
        let user = identity
            .create_user(Some("test@example.com"), Some("testpass123"), UserFields::default())
            .await
            .unwrap();

        assert_eq!(user.email, "test@example.com");
        assert_ne!(user.password_hash, "testpass123");
        assert!(verify_password("testpass123", &user.password_hash));
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[tokio::test]
    async fn create_user_without_email_fails() {
        let identity = service();
        for email in [None, Some("")] {
            let err = identity
                .create_user(email, Some("test123"), UserFields::default())
                .await
                .unwrap_err();
            assert!(matches!(err, IdentityError::MissingEmail));
        }
    }

    #[tokio::test]
    async fn duplicate_normalized_email_is_rejected() {
        let identity = service();
        identity
            .create_user(Some("dup@example.com"), Some("pass123"), UserFields::default())
            .await
            .unwrap();
        let err = identity
            .create_user(Some("dup@EXAMPLE.com"), Some("pass123"), UserFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateEmail));
    }

    #[tokio::test]
    async fn superuser_gets_both_flags() {
        let identity = service();
        let user = identity.create_superuser("admin@example.com", "test123").await.unwrap();
        assert!(user.is_staff);
        assert!(user.is_superuser);
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_normalizes_email() {
        let identity = service();
        identity
            .create_user(Some("user@example.com"), Some("secret1"), UserFields::default())
            .await
            .unwrap();

        assert!(identity.authenticate("user@EXAMPLE.COM", "secret1").await.is_ok());
        assert!(matches!(
            identity.authenticate("user@example.com", "wrong").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            identity.authenticate("nobody@example.com", "secret1").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_logins_share_a_single_worker() {
        let identity = service();
        for email in ["one@example.com", "two@example.com"] {
            identity
                .create_user(Some(email), Some("secret1"), UserFields::default())
                .await
                .unwrap();
        }

        let (one, two, bad) = tokio::join!(
            identity.authenticate("one@example.com", "secret1"),
            identity.authenticate("two@example.com", "secret1"),
            identity.authenticate("one@example.com", "wrong"),
        );
        assert_eq!(one.unwrap().email, "one@example.com");
        assert_eq!(two.unwrap().email, "two@example.com");
        assert!(matches!(bad, Err(IdentityError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn user_without_password_cannot_log_in() {
        let identity = service();
        identity
            .create_user(Some("nopass@example.com"), None, UserFields::default())
            .await
            .unwrap();
        assert!(identity.authenticate("nopass@example.com", "").await.is_err());
    }

    #[tokio::test]
    async fn inactive_user_cannot_log_in() {
        let identity = service();
        let fields = UserFields {
            is_active: false,
            ..UserFields::default()
        };
        identity
            .create_user(Some("off@example.com"), Some("secret1"), fields)
            .await
            .unwrap();
        assert!(identity.authenticate("off@example.com", "secret1").await.is_err());
    }

    #[tokio::test]
    async fn update_profile_rehashes_new_password() {
        let identity = service();
        let user = identity
            .create_user(Some("me@example.com"), Some("oldpass"), UserFields::named("Old"))
            .await
            .unwrap();

        let updated = identity
            .update_profile(
                user,
                ProfileChanges {
                    name: Some("New".into()),
                    password: Some("newpass".into()),
                    ..ProfileChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "New");
        assert!(verify_password("newpass", &updated.password_hash));
        assert!(identity.authenticate("me@example.com", "oldpass").await.is_err());
    }

    #[tokio::test]
    async fn update_profile_refuses_someone_elses_email() {
        let identity = service();
        identity
            .create_user(Some("taken@example.com"), Some("pass123"), UserFields::default())
            .await
            .unwrap();
        let user = identity
            .create_user(Some("mine@example.com"), Some("pass123"), UserFields::default())
            .await
            .unwrap();

        let err = identity
            .update_profile(
                user,
                ProfileChanges {
                    email: Some("taken@Example.com".into()),
                    ..ProfileChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateEmail));
    }
}

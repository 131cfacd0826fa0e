use anyhow::Context;
use serde_json::json;

use crate::api::validation;
use crate::cli::{utils::{output_error, output_success}, OutputFormat};
use crate::config::AppConfig;
use crate::database::{models::User, open_store};
use crate::services::{IdentityService, UserFields};

async fn identity(config: &AppConfig) -> anyhow::Result<IdentityService> {
    let store = open_store(&config.database)
        .await
        .context("failed to open the configured store")?;
    Ok(IdentityService::new(store))
}

fn check_credentials(config: &AppConfig, email: &str, password: &str, output_format: OutputFormat) -> anyhow::Result<bool> {
    let problems = [
        validation::email(email).err().map(|e| format!("email: {}", e)),
        validation::password(password, config.security.min_password_length)
            .err()
            .map(|e| format!("password: {}", e)),
    ];

    let mut valid = true;
    for problem in problems.into_iter().flatten() {
        output_error(output_format, &problem)?;
        valid = false;
    }
    Ok(valid)
}

fn report(user: &User, message: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    output_success(
        output_format,
        &format!("{} {}", message, user.email),
        Some(json!({
            "user": {
                "id": user.id,
                "email": user.email,
                "name": user.name,
                "is_staff": user.is_staff,
                "is_superuser": user.is_superuser,
            }
        })),
    )
}

pub async fn create_superuser(
    config: &AppConfig,
    email: &str,
    password: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    if !check_credentials(config, email, password, output_format)? {
        anyhow::bail!("invalid superuser credentials");
    }

    let user = identity(config).await?.create_superuser(email, password).await?;
    report(&user, "Created superuser", output_format)
}

pub async fn create_user(
    config: &AppConfig,
    email: &str,
    password: &str,
    name: String,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    if !check_credentials(config, email, password, output_format)? {
        anyhow::bail!("invalid user credentials");
    }

    let user = identity(config)
        .await?
        .create_user(Some(email), Some(password), UserFields::named(name))
        .await?;
    report(&user, "Created user", output_format)
}

use auth::{NewAccount, Result, Role, SessionService};
use userdir_core::SeedConfig;

/// Make sure the configured bootstrap administrator exists.
///
/// An existing account with the same email is left untouched, whatever its role.
pub async fn seed_admin(sessions: &SessionService, seed: &SeedConfig) -> Result<()> {
    tracing::info!(email = %seed.admin_email, "checking bootstrap administrator");

    let account = NewAccount {
        name: seed.admin_name.clone(),
        email: seed.admin_email.clone(),
        role: Role::Admin,
        password: seed.admin_password.clone(),
    };

    match sessions.ensure_admin(account).await? {
        Some(user) => {
            tracing::info!(user_id = %user.id, email = %user.email, "created bootstrap administrator");
        }
        None => {
            tracing::info!(email = %seed.admin_email, "bootstrap account already present");
        }
    }

    Ok(())
}

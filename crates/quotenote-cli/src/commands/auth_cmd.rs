use std::path::Path;

use quotenote_core::auth::SignUpOutcome;

use crate::auth::{clear_stored_session, load_stored_session, SupabaseAuthService};
use crate::cli::AuthCommands;
use crate::commands::common::open_context;
use crate::commands::migrate::migrate_local_quotes;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_auth(
    command: AuthCommands,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let maybe_auth_service =
        SupabaseAuthService::new_for_config(&profile_name, &config.bootstrap_config(&profile_name))
            .map_err(|error| CliError::Auth(error.to_string()))?;

    match command {
        AuthCommands::Signup { email, password } => {
            let auth_service = require_service(maybe_auth_service, &profile_name)?;
            let outcome = auth_service
                .sign_up(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;

            match outcome {
                SignUpOutcome::SignedIn(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!("Signed up profile '{profile_name}' as {email_label}");

                    let ctx = open_context(db_path, Some(&profile_name)).await?;
                    if ctx.auth.is_authenticated() {
                        println!("{}", migrate_local_quotes(&ctx).await);
                    }
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!(
                        "Check {email} to confirm your account, then run `quotenote auth login` and `quotenote migrate`."
                    );
                }
            }
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let auth_service = require_service(maybe_auth_service, &profile_name)?;
            let session = auth_service
                .sign_in(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Status => {
            let session = if let Some(service) = maybe_auth_service {
                service
                    .restore_session()
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?
            } else {
                load_stored_session(&profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?
            };

            if let Some(session) = session {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Profile '{}' is signed in as {} (expires_at={}); quotes are stored in the cloud",
                    profile_name, email_label, session.expires_at
                );
            } else {
                println!("Profile '{profile_name}' is not signed in; quotes are stored on this device");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let stored_session = load_stored_session(&profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;

            if let (Some(service), Some(session)) = (maybe_auth_service, stored_session) {
                service
                    .sign_out(&session.access_token)
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            } else {
                clear_stored_session(&profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            }

            let ctx = open_context(db_path, Some(&profile_name)).await?;
            ctx.router.clear_local().await;

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
        AuthCommands::ResetPassword { email } => {
            let auth_service = require_service(maybe_auth_service, &profile_name)?;
            auth_service
                .reset_password(&email)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            println!("If an account exists for {}, a reset link is on its way.", email.trim());
            Ok(())
        }
    }
}

fn require_service(
    service: Option<SupabaseAuthService>,
    profile_name: &str,
) -> Result<SupabaseAuthService, CliError> {
    service.ok_or_else(|| {
        CliError::Config(format!(
            "Profile '{profile_name}' missing Supabase auth config. Run `quotenote config init --name {profile_name}` or set SUPABASE_URL and SUPABASE_ANON_KEY."
        ))
    })
}

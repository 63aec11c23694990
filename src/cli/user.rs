use crate::models::NewUser;
use crate::{services::auth, Config, Database};
use anyhow::Result;
use std::path::Path;

use super::UserCommand;

fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    let password_confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != password_confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

pub async fn run(config_path: &Path, command: UserCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::from_config(&config.database)?;
    db.migrate()?;

    match command {
        UserCommand::Add {
            email,
            first_name,
            last_name,
            staff,
            superuser,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_new_password()?,
            };

            let user = auth::create_user(
                &db,
                &NewUser {
                    email,
                    password,
                    first_name,
                    last_name,
                    is_staff: staff,
                    is_superuser: superuser,
                },
            )?;
            tracing::info!("User '{}' created", user.email);
        }
        UserCommand::List => {
            let users = auth::list_users(&db)?;

            println!("{:<6} {:<32} {:<24} {:<8} {:<10}", "ID", "EMAIL", "NAME", "ACTIVE", "ROLE");
            println!("{}", "-".repeat(84));
            for user in users {
                let name = format!("{} {}", user.first_name, user.last_name);
                let role = if user.is_superuser {
                    "superuser"
                } else if user.is_staff {
                    "staff"
                } else {
                    "user"
                };
                println!(
                    "{:<6} {:<32} {:<24} {:<8} {:<10}",
                    user.id,
                    user.email,
                    name.trim(),
                    if user.is_active { "yes" } else { "no" },
                    role
                );
            }
        }
        UserCommand::Deactivate { email } => {
            if auth::set_active(&db, &email, false)? {
                tracing::info!("User '{}' deactivated", email);
            } else {
                tracing::warn!("User '{}' not found", email);
            }
        }
        UserCommand::Remove { email } => {
            if auth::soft_delete_user(&db, &email)? {
                tracing::info!("User '{}' removed", email);
            } else {
                tracing::warn!("User '{}' not found", email);
            }
        }
        UserCommand::Passwd { email } => {
            if auth::find_by_email(&db, &email)?.is_none() {
                anyhow::bail!("User '{}' not found", email);
            }
            let password = prompt_new_password()?;
            auth::update_password(&db, &email, &password)?;
            tracing::info!("Password updated for '{}'", email);
        }
    }

    Ok(())
}

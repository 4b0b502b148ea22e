//! Session commands.

use shoplet_storefront::error::{AppError, Result};
use shoplet_storefront::forms::{FormErrors, FormField};
use shoplet_storefront::services::AuthError;
use shoplet_storefront::state::AppState;

/// Print field errors one per line, then hand the error back.
fn report<F: FormField>(error: AuthError<F>) -> AuthError<F> {
    if let Some(errors) = error.form_errors() {
        print_form_errors(errors);
    }
    error
}

fn print_form_errors<F: FormField>(errors: &FormErrors<F>) {
    for (field, message) in errors.iter() {
        println!("  {}: {message}", field.name());
    }
}

/// Create an account and sign in.
pub async fn register(
    state: &AppState,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    let user = state
        .auth_service()
        .register(email, password, confirm_password)
        .await
        .map_err(report)?;
    println!("Welcome, {}!", user.email);
    Ok(())
}

/// Sign in.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<()> {
    let user = state
        .auth_service()
        .login(email, password)
        .await
        .map_err(report)?;
    println!("Signed in as {}.", user.email);
    Ok(())
}

/// Sign out.
pub async fn logout(state: &AppState) -> Result<()> {
    if !state.auth().is_authenticated() {
        return Err(AppError::Unauthorized("not signed in".to_string()));
    }
    let message = state.auth_service().logout().await?;
    println!("{message}");
    Ok(())
}

/// Show the signed-in user.
pub fn whoami(state: &AppState) {
    let auth = state.auth().state();
    if !auth.is_authenticated {
        println!("Not signed in.");
        return;
    }
    match auth.profile {
        Some(user) => {
            println!("{}", user.name.as_deref().unwrap_or(&user.email));
            println!("  Email: {}", user.email);
            println!("  Avatar: {}", state.api().avatar_url(user.avatar.as_deref()));
        }
        None => println!("Signed in (no profile stored)."),
    }
}

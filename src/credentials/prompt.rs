use anyhow::{Context, Result};

/// Prompts the user for their Review Board password
pub fn prompt_for_password(username: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("Review Board password for {}: ", username))
        .context("Failed to read password from terminal")?;

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    Ok(password)
}

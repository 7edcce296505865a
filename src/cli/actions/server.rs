use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::legitimi::new;
use anyhow::Result;
use url::Url;

/// Handle the server action
///
/// # Errors
///
/// Returns an error if the DSN is not a valid URL or the server fails.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            // Fail early on a malformed DSN instead of inside the pool.
            let dsn = Url::parse(&dsn)?;

            new(port, dsn.to_string(), globals).await?;
        }
    }

    Ok(())
}

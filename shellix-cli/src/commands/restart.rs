use clap::Args;
use shellix::{ShellixError, UserId};

#[derive(Args, Debug)]
pub struct RestartArgs {
    /// User id(s) whose container to restart
    #[arg(required = true, num_args = 1..)]
    pub users: Vec<String>,
}

pub async fn execute(args: RestartArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;

    let mut errors = Vec::new();
    let mut success_count = 0;

    for user in args.users {
        let user = UserId::new(user);
        match runtime.lifecycle().restart_for(&user).await {
            Ok(_) => {
                println!("{}", runtime.registry().container_name(&user));
                success_count += 1;
            }
            Err(ShellixError::NotFound(name)) => {
                eprintln!("Error: No container for user {}: {}", user, name);
                errors.push(format!("{}: not found", user));
            }
            Err(e) => {
                // A failed restart leaves the container in place.
                eprintln!("Error restarting container for '{}': {}", user, e);
                errors.push(format!("{}: {}", user, e));
            }
        }
    }

    if !errors.is_empty() {
        let error_summary = if success_count > 0 {
            format!(
                "Failed to restart {} of {} container(s)",
                errors.len(),
                errors.len() + success_count
            )
        } else {
            format!("Failed to restart all {} container(s)", errors.len())
        };

        anyhow::bail!("{}\nErrors:\n  {}", error_summary, errors.join("\n  "));
    }
    Ok(())
}

use std::io::Write;

use clap::Args;
use shellix::UserId;
use shellix::executor::RunOutcome;

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// User id owning the container
    pub user: String,

    /// Command line to run through the shell
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Runs the line like the bot would, but prints raw output and mirrors the
/// command's failure in the exit status.
pub async fn execute(args: ExecArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;
    let user = UserId::new(args.user);
    let line = args.command.join(" ");

    match runtime.executor().run(&user, &line).await? {
        RunOutcome::NoContainer => {
            anyhow::bail!(
                "No container for user {}. Run `shellix create {}` first.",
                user,
                user
            )
        }
        RunOutcome::Completed { result, .. } => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&result.raw_output)?;
            stdout.flush()?;
            if result.timed_out {
                anyhow::bail!("command timed out");
            }
            if result.exit_failed {
                anyhow::bail!("command exited with a non-zero status");
            }
            Ok(())
        }
    }
}

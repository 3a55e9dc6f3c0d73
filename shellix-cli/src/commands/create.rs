use clap::Args;
use shellix::UserId;
use shellix::lifecycle::LifecycleOutcome;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// User id owning the container
    pub user: String,

    /// Distribution label (defaults to the first catalog entry)
    pub distribution: Option<String>,
}

pub async fn execute(args: CreateArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;
    let label = match args.distribution {
        Some(label) => label,
        None => runtime
            .catalog()
            .labels()
            .next()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("distribution catalog is empty"))?,
    };

    let user = UserId::new(args.user);
    let name = runtime.registry().container_name(&user);
    match runtime.lifecycle().create_for(&user, &label).await {
        Ok(LifecycleOutcome::Created(distribution)) => {
            println!("{}", name);
            eprintln!("Created from {} ({})", distribution.label, distribution.image);
            Ok(())
        }
        Ok(_) => {
            println!("{}", name);
            eprintln!("Container already exists");
            Ok(())
        }
        Err(shellix::ShellixError::Validation(msg)) => {
            let known: Vec<_> = runtime.catalog().labels().collect();
            anyhow::bail!("{} (known: {})", msg, known.join(", "))
        }
        Err(e) => anyhow::bail!("Error creating container for '{}': {}", user, e),
    }
}

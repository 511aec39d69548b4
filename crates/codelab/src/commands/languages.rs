//! Languages command - lists the runtimes the server can execute.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the languages command.
#[derive(Args, Debug)]
pub struct LanguagesArgs {
    /// Only show languages whose name or alias contains this text
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Run the languages command.
pub async fn run(args: LanguagesArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client(None)?;
    let mut runtimes = client.code().languages().await?;

    if let Some(filter) = &args.filter {
        let needle = filter.to_lowercase();
        runtimes.retain(|r| {
            r.language.to_lowercase().contains(&needle)
                || r.aliases.iter().any(|a| a.to_lowercase().contains(&needle))
        });
    }

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&runtimes)?);
        return Ok(());
    }

    if runtimes.is_empty() {
        println!("No languages available");
        return Ok(());
    }

    let dim = Style::new().dim();
    let bold = Style::new().bold();
    let width = runtimes.iter().map(|r| r.language.len()).max().unwrap_or(0);

    for runtime in &runtimes {
        let aliases = if runtime.aliases.is_empty() {
            String::new()
        } else {
            format!("({})", runtime.aliases.join(", "))
        };
        println!(
            "  {:<width$}  {:<10}  {}",
            bold.apply_to(&runtime.language),
            runtime.version,
            dim.apply_to(aliases),
            width = width
        );
    }

    if ctx.verbose {
        println!();
        println!("{}", dim.apply_to(format!("{} runtimes", runtimes.len())));
    }

    Ok(())
}

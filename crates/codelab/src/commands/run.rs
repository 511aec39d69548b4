//! Run command - executes local source files through the server.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::Args;
use codelab_client::{ExecuteRequest, SourceFile};
use console::Style;

use super::Context;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Source files; the first is the entry point
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Language (inferred from the first file's extension if omitted)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Runtime version
    #[arg(long, default_value = "*")]
    pub version: String,

    /// Text passed to the program's standard input
    #[arg(long, default_value = "")]
    pub stdin: String,

    /// API token (or set CODELAB_API_TOKEN env var)
    #[arg(long, env = "CODELAB_API_TOKEN")]
    pub token: Option<String>,
}

/// Run the run command.
///
/// Exits non-zero when the program fails, not only when the request does.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let language = match &args.language {
        Some(language) => language.clone(),
        None => infer_language(&args.files[0]).with_context(|| {
            format!(
                "cannot infer language from {}; pass --language",
                args.files[0].display()
            )
        })?,
    };

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(SourceFile::new(name, content));
    }

    let request = ExecuteRequest {
        language,
        version: args.version,
        files,
        stdin: args.stdin,
    };

    let dim = Style::new().dim();
    if ctx.verbose {
        eprintln!(
            "{}",
            dim.apply_to(format!(
                "Running {} file(s) as {} on {}",
                request.files.len(),
                request.language,
                ctx.server_url
            ))
        );
    }

    let client = ctx.client(args.token.as_deref())?;
    let outcome = match client.code().execute(&request).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_rate_limited() => match e.retry_after() {
            Some(secs) => bail!("rate limited, retry in {}s", secs),
            None => bail!("rate limited"),
        },
        Err(e) if e.is_timeout() => bail!("execution timed out: {}", e),
        Err(e) => return Err(e.into()),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", outcome.output);
        if !outcome.output.is_empty() && !outcome.output.ends_with('\n') {
            println!();
        }
    }

    if !outcome.success {
        let label = outcome.error.unwrap_or_else(|| "Execution failed".to_string());
        if !ctx.json_output {
            let red = Style::new().red();
            eprintln!("{}", red.apply_to(&label));
        }
        bail!(label);
    }

    Ok(())
}

/// Language name for a source file's extension.
fn infer_language(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let language = match ext.as_str() {
        "py" => "python",
        "js" | "mjs" => "javascript",
        "ts" => "typescript",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "kt" => "kotlin",
        "swift" => "swift",
        "sh" => "bash",
        _ => return None,
    };
    Some(language.to_string())
}

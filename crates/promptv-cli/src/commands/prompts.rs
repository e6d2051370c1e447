use std::io::{IsTerminal, Read};

use promptv_core::Variables;

use crate::app::AppContext;
use crate::cli::{Cli, CommitArgs, GetArgs, ListArgs, RemoveArgs};
use crate::output::{
    print_prompt_list, print_version_list, prompt_list_json, version_info_json, version_json,
    OutputMode,
};

/// Prompt text from `--content`, `--file`, or piped stdin.
fn read_content(args: &CommitArgs) -> anyhow::Result<String> {
    if let Some(content) = args.content.as_ref() {
        return Ok(content.clone());
    }
    if let Some(path) = args.file.as_ref() {
        return std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e));
    }
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(anyhow::anyhow!(
            "No prompt text given. Use --content, --file, or pipe text on stdin."
        ));
    }
    let mut content = String::new();
    stdin
        .read_to_string(&mut content)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(content)
}

pub fn handle_commit(cli: &Cli, ctx: &AppContext, args: &CommitArgs) -> anyhow::Result<()> {
    let content = read_content(args)?;
    let version = ctx
        .client
        .commit(&cli.project, &args.name, &content, args.message.as_deref())?;

    if OutputMode::detect(cli.json).is_json() {
        println!("{}", version_json(&cli.project, &args.name, &version));
    } else if !cli.quiet {
        println!(
            "Committed {}/{} version {}",
            cli.project, args.name, version.version
        );
    }
    Ok(())
}

pub fn handle_get(cli: &Cli, ctx: &AppContext, args: &GetArgs) -> anyhow::Result<()> {
    if OutputMode::detect(cli.json).is_json() {
        let version = ctx.store().get(&cli.project, &args.name, &args.reference)?;
        println!("{}", version_json(&cli.project, &args.name, &version));
        return Ok(());
    }

    let content =
        ctx.client
            .get_prompt(&cli.project, &args.name, &args.reference, &Variables::new())?;
    print!("{}", content);
    if std::io::stdout().is_terminal() && !content.is_empty() && !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub fn handle_list(cli: &Cli, ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let mode = OutputMode::detect(cli.json);
    let store = ctx.store();

    match args.name.as_ref() {
        Some(name) => {
            let versions = store.list(&cli.project, name)?;
            if mode.is_json() {
                let rows: Vec<serde_json::Value> = versions.iter().map(version_info_json).collect();
                println!("{}", serde_json::Value::Array(rows));
            } else {
                print_version_list(mode, &versions);
            }
        }
        None => {
            let mut prompts = Vec::new();
            for name in store.list_prompts(&cli.project)? {
                let latest = store.latest_version(&cli.project, &name)?;
                prompts.push((name, latest));
            }
            if mode.is_json() {
                println!("{}", prompt_list_json(&cli.project, &prompts));
            } else if prompts.is_empty() {
                if !cli.quiet {
                    println!("No prompts in project '{}'", cli.project);
                }
            } else {
                print_prompt_list(mode, &prompts);
            }
        }
    }
    Ok(())
}

pub fn handle_remove(cli: &Cli, ctx: &AppContext, args: &RemoveArgs) -> anyhow::Result<()> {
    ctx.client.remove(&cli.project, &args.name)?;

    if OutputMode::detect(cli.json).is_json() {
        println!(
            "{}",
            serde_json::json!({ "project": cli.project, "prompt": args.name, "removed": true })
        );
    } else if !cli.quiet {
        println!("Removed prompt {}/{}", cli.project, args.name);
    }
    Ok(())
}

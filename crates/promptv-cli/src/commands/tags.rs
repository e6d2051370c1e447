use crate::app::AppContext;
use crate::cli::{Cli, TagCommands};
use crate::output::{print_tag, print_tag_list, tag_json, OutputMode};

pub fn handle_tag(cli: &Cli, ctx: &AppContext, command: &TagCommands) -> anyhow::Result<()> {
    let mode = OutputMode::detect(cli.json);
    let project = cli.project.as_str();

    match command {
        TagCommands::Create {
            name,
            tag,
            reference,
            description,
        } => {
            let version = ctx.store().resolve(project, name, reference)?;
            let created =
                ctx.client
                    .create_tag(project, name, tag, version, description.as_deref())?;
            if mode.is_json() {
                println!("{}", tag_json(&created));
            } else if !cli.quiet {
                println!(
                    "Tagged {}/{} version {} as '{}'",
                    project, name, created.version, created.name
                );
            }
        }
        TagCommands::Get { name, tag } => {
            let found = ctx.store().tags().get(project, name, tag)?;
            if mode.is_json() {
                println!("{}", tag_json(&found));
            } else {
                print_tag(&found);
            }
        }
        TagCommands::List { name } => {
            let tags = ctx.store().tags().list(project, name)?;
            if mode.is_json() {
                let rows: Vec<serde_json::Value> = tags.iter().map(tag_json).collect();
                println!("{}", serde_json::Value::Array(rows));
            } else if tags.is_empty() {
                if !cli.quiet {
                    println!("No tags for {}/{}", project, name);
                }
            } else {
                print_tag_list(mode, &tags);
            }
        }
        TagCommands::Delete { name, tag } => {
            let removed = ctx.client.delete_tag(project, name, tag)?;
            if mode.is_json() {
                println!("{}", tag_json(&removed));
            } else if !cli.quiet {
                println!(
                    "Deleted tag '{}' (was version {})",
                    removed.name, removed.version
                );
            }
        }
    }
    Ok(())
}

use promptv_core::{DiffFormat, RenderOptions};

use crate::app::AppContext;
use crate::cli::{Cli, DiffArgs};
use crate::output::{print_diff, OutputMode};

pub fn handle_diff(cli: &Cli, ctx: &AppContext, args: &DiffArgs) -> anyhow::Result<()> {
    let mode = OutputMode::detect(cli.json);
    let format = match args.format.as_deref() {
        Some(value) => value.parse::<DiffFormat>()?,
        None if mode.is_json() => DiffFormat::Json,
        None => DiffFormat::SideBySide,
    };

    let store = ctx.store();
    let version_a = store.resolve(&cli.project, &args.name, &args.a)?;
    let version_b = store.resolve(&cli.project, &args.name, &args.b)?;
    let script = ctx.client.diff(
        &cli.project,
        &args.name,
        &version_a.to_string(),
        &version_b.to_string(),
    )?;

    let column_width = args.width.unwrap_or(ctx.config.diff.column_width);
    let options = RenderOptions::default()
        .with_labels(
            format!("{}@v{}", args.name, version_a),
            format!("{}@v{}", args.name, version_b),
        )
        .with_context_lines(args.context.unwrap_or(ctx.config.diff.context_lines))
        .with_column_width(column_width);
    let rendered = script.render(format, &options)?;

    if script.is_identity() && format == DiffFormat::Unified {
        if !cli.quiet {
            eprintln!("No differences between v{} and v{}", version_a, version_b);
        }
        return Ok(());
    }
    print_diff(mode, format, column_width, &rendered);
    Ok(())
}

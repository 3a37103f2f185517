use anyhow::{Context, Result};
use deploy_pipeline::assembly::{AssemblyStore, DirectoryAssemblyStore};
use deploy_pipeline::cli::commands::{
    InitCommand, ListCommand, PlanCommand, ShowCommand, SynthCommand, ValidateCommand,
};
use deploy_pipeline::cli::output::*;
use deploy_pipeline::cli::{Cli, Command};
use deploy_pipeline::core::config::PipelineConfig;
use deploy_pipeline::demo::SERVICE_PIPELINE_YAML;
use deploy_pipeline::synth::{self, synthesize};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Init(cmd) => init_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Plan(cmd) => plan_pipeline(cmd)?,
        Command::Synth(cmd) => synth_pipeline(cmd).await?,
        Command::List(cmd) => list_assemblies(cmd).await?,
        Command::Show(cmd) => show_assembly(cmd).await?,
    }

    Ok(())
}

async fn init_pipeline(cmd: &InitCommand) -> Result<()> {
    if !cmd.force && tokio::fs::try_exists(&cmd.output).await? {
        println!(
            "{} {} already exists (use --force to overwrite)",
            WARN,
            style(&cmd.output).bold()
        );
        std::process::exit(1);
    }

    tokio::fs::write(&cmd.output, SERVICE_PIPELINE_YAML)
        .await
        .with_context(|| format!("Failed to write {}", cmd.output))?;
    println!("{} Wrote pipeline definition to {}", CHECK, style(&cmd.output).bold());
    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::from_file(&cmd.file, &cmd.variable) {
        Ok(config) => {
            let spec = &config.spec;
            println!("{} Pipeline definition is valid!", CHECK);
            println!("  Name: {}", style(&spec.name).bold());
            println!("  Stages: {}", style(spec.stages.len()).cyan());
            println!("  Variables: {}", style(config.variables.len()).cyan());
            for stage in &spec.stages {
                println!("  {} ({})", style(&stage.name).bold(), style(&stage.env).dim());
                for gate in stage.all_gates() {
                    println!("    {}", format_gate(gate));
                }
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(spec)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn plan_pipeline(cmd: &PlanCommand) -> Result<()> {
    let spec = PipelineConfig::from_file(&cmd.file, &cmd.variable)
        .context("Failed to load pipeline definition")?
        .into_spec();
    println!("{} {}", INFO, format_spec_overview(&spec));

    let manifest = synthesize(&spec)?;
    println!("{}", format_plan(&manifest));
    Ok(())
}

async fn synth_pipeline(cmd: &SynthCommand) -> Result<()> {
    let spec = PipelineConfig::from_file(&cmd.file, &cmd.variable)
        .context("Failed to load pipeline definition")?
        .into_spec();

    let manifest = match synthesize(&spec) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("Synthesis failed: {}", e);
            println!("{} {}", CROSS, style(e).red());
            std::process::exit(1);
        }
    };

    if cmd.print {
        println!("{}", synth::render(&manifest, cmd.format.into())?);
    }

    if !cmd.no_save {
        let store = DirectoryAssemblyStore::new(&cmd.out).await?;
        store.save(&manifest).await?;
        info!("Saved manifest {}", manifest.synthesis_id);
        println!(
            "{} Synthesized {} to {}",
            CHECK,
            style(&manifest.pipeline_name).bold(),
            style(store.manifest_path(&manifest.pipeline_name).display()).dim()
        );
    }

    Ok(())
}

async fn list_assemblies(cmd: &ListCommand) -> Result<()> {
    let store = DirectoryAssemblyStore::open(&cmd.out);
    let summaries = store.list().await?;

    if cmd.json {
        let data = serde_json::json!({ "assemblies": summaries });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("{} No synthesized pipelines in {}", INFO, cmd.out);
        return Ok(());
    }

    println!("{} Synthesized pipelines:", INFO);
    for summary in &summaries {
        println!("  {}", format_assembly_summary(summary));
    }

    Ok(())
}

async fn show_assembly(cmd: &ShowCommand) -> Result<()> {
    let store = DirectoryAssemblyStore::open(&cmd.out);

    match store.load(&cmd.name).await? {
        Some(manifest) => match cmd.format {
            Some(format) => println!("{}", synth::render(&manifest, format.into())?),
            None => println!("{}", format_plan(&manifest)),
        },
        None => {
            println!("{} No manifest for pipeline {}", WARN, style(&cmd.name).bold());
        }
    }

    Ok(())
}

/* src/main.rs */

mod bundle;
mod manifest;
mod next_config;
mod overrides;
mod shell;
mod ui;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use manifest::AdapterMetadata;

const ADAPTER_PACKAGE_NAME: &str = "@apphosting/adapter-nextjs";
const DEFAULT_BUILD_COMMAND: &str = "npx next build";

#[derive(Parser)]
#[command(name = "fah-nextjs", about = "Firebase App Hosting build adapter for Next.js")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run the full post-build pipeline: config override, framework build,
  /// route manifest overrides, output bundle
  Build {
    /// Application root directory (defaults to cwd)
    #[arg(long)]
    app_path: Option<PathBuf>,
    /// Build output directory, relative to the app root
    #[arg(long, default_value = ".next")]
    dist_dir: String,
    /// Framework build command
    #[arg(long, default_value = DEFAULT_BUILD_COMMAND)]
    build_command: String,
    /// Adapter version reported in the x-fah-adapter header
    #[arg(long)]
    adapter_version: Option<String>,
  },
  /// Apply App Hosting overrides to the generated route manifest
  Overrides {
    /// Application root directory (defaults to cwd)
    #[arg(long)]
    app_path: Option<PathBuf>,
    /// Build output directory, relative to the app root
    #[arg(long, default_value = ".next")]
    dist_dir: String,
    /// Adapter version reported in the x-fah-adapter header
    #[arg(long)]
    adapter_version: Option<String>,
  },
  /// Replace next.config.* with a wrapper that disables image optimization
  OverrideConfig {
    /// Project root directory (defaults to cwd)
    #[arg(long)]
    project_root: Option<PathBuf>,
    /// Config file name (auto-detected if omitted)
    #[arg(long)]
    config: Option<String>,
  },
  /// Move build artifacts into the output bundle and write bundle.yaml
  Bundle {
    /// Repository root directory (defaults to cwd)
    #[arg(long)]
    root_dir: Option<PathBuf>,
    /// Application directory (defaults to the root directory)
    #[arg(long)]
    app_dir: Option<PathBuf>,
    /// Build output directory, relative to the app directory
    #[arg(long, default_value = ".next")]
    dist_dir: String,
    /// Adapter version recorded in bundle.yaml
    #[arg(long)]
    adapter_version: Option<String>,
  },
}

fn adapter_metadata(version: Option<String>) -> AdapterMetadata {
  AdapterMetadata {
    adapter_package_name: ADAPTER_PACKAGE_NAME.to_string(),
    adapter_version: version.unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
  }
}

fn resolve_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
  match explicit {
    Some(p) => Ok(p),
    None => std::env::current_dir().context("failed to get cwd"),
  }
}

async fn run_build(
  app_path: &Path,
  dist_dir: &str,
  build_command: &str,
  metadata: &AdapterMetadata,
) -> Result<()> {
  let started = Instant::now();
  let total: u32 = 4;

  ui::banner("build");

  ui::step(1, total, "Overriding next.config");
  let config_name = next_config::find_next_config(app_path)?;
  next_config::override_next_config(app_path, &config_name)?;
  ui::blank();

  ui::step(2, total, "Building Next.js app");
  shell::run_command(app_path, build_command, "framework build")?;
  ui::blank();

  ui::step(3, total, "Applying route manifest overrides");
  overrides::add_app_hosting_overrides(app_path, dist_dir, metadata)?;
  ui::detail_ok(manifest::ROUTES_MANIFEST);
  ui::blank();

  ui::step(4, total, "Packaging output bundle");
  let next_build_dir = app_path.join(dist_dir);
  let opts = bundle::populate_output_bundle_options(app_path, app_path, &next_build_dir);
  bundle::generate_build_output(app_path, app_path, &opts, &next_build_dir, metadata).await?;
  bundle::validate_output_directory(&opts, &next_build_dir)?;
  ui::detail_ok(&format!("{}", opts.bundle_yaml_path.display()));
  ui::blank();

  ui::ok(&format!("done in {:.1}s", started.elapsed().as_secs_f64()));
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  match cli.command {
    Command::Build { app_path, dist_dir, build_command, adapter_version } => {
      let app_path = resolve_dir(app_path)?;
      let metadata = adapter_metadata(adapter_version);
      run_build(&app_path, &dist_dir, &build_command, &metadata).await?;
    }
    Command::Overrides { app_path, dist_dir, adapter_version } => {
      let app_path = resolve_dir(app_path)?;
      let metadata = adapter_metadata(adapter_version);
      overrides::add_app_hosting_overrides(&app_path, &dist_dir, &metadata)?;
      ui::ok(&format!("{} updated", manifest::ROUTES_MANIFEST));
    }
    Command::OverrideConfig { project_root, config } => {
      let root = resolve_dir(project_root)?;
      let name = match config {
        Some(name) => name,
        None => next_config::find_next_config(&root)?,
      };
      next_config::override_next_config(&root, &name)?;
      ui::ok(&format!("{name} overridden"));
    }
    Command::Bundle { root_dir, app_dir, dist_dir, adapter_version } => {
      let root = resolve_dir(root_dir)?;
      let app = app_dir.unwrap_or_else(|| root.clone());
      let metadata = adapter_metadata(adapter_version);
      let next_build_dir = app.join(&dist_dir);
      let opts = bundle::populate_output_bundle_options(&root, &app, &next_build_dir);
      bundle::generate_build_output(&root, &app, &opts, &next_build_dir, &metadata).await?;
      bundle::validate_output_directory(&opts, &next_build_dir)?;
      ui::ok(&format!("{}", opts.bundle_yaml_path.display()));
    }
  }

  Ok(())
}

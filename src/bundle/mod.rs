/* src/bundle/mod.rs */

// Packages the standalone build output into the App Hosting output bundle:
// relocated static assets, relocated public assets, and the bundle.yaml
// descriptor the hosting runtime consumes.


use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::manifest::{AdapterMetadata, FRAMEWORK};

const OUTPUT_BUNDLE_DIR: &str = ".apphosting";
const BUNDLE_YAML: &str = "bundle.yaml";
const BUNDLE_VERSION: &str = "v1alpha";

/// Destination paths for built artifacts in the output bundle.
#[derive(Debug, Clone)]
pub struct OutputBundleOptions {
  pub bundle_yaml_path: PathBuf,
  pub output_directory_base_path: PathBuf,
  #[allow(dead_code)]
  pub output_directory_app_path: PathBuf,
  pub server_file_path: PathBuf,
  pub output_public_directory_path: PathBuf,
  pub output_static_directory_path: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleYaml {
  output_bundle: OutputBundle,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputBundle {
  version: String,
  server_config: ServerConfig,
  metadata: BundleMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerConfig {
  run_command: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleMetadata {
  adapter_npm_package_name: String,
  framework: String,
}

/// Compute output-bundle paths. In monorepo builds (MONOREPO_COMMAND set) the
/// standalone directory mirrors the repo layout, so server.js lives under the
/// app's path relative to the repo root.
pub fn populate_output_bundle_options(
  root_dir: &Path,
  app_dir: &Path,
  next_build_directory: &Path,
) -> OutputBundleOptions {
  let output_bundle_dir = root_dir.join(OUTPUT_BUNDLE_DIR);
  let standalone_directory = next_build_directory.join("standalone");
  let standalone_app_path = match std::env::var_os("MONOREPO_COMMAND") {
    Some(_) => {
      standalone_directory.join(app_dir.strip_prefix(root_dir).unwrap_or_else(|_| Path::new("")))
    }
    None => standalone_directory,
  };

  OutputBundleOptions {
    bundle_yaml_path: output_bundle_dir.join(BUNDLE_YAML),
    output_directory_base_path: output_bundle_dir,
    server_file_path: standalone_app_path.join("server.js"),
    output_public_directory_path: standalone_app_path.join("public"),
    output_static_directory_path: standalone_app_path.join(".next").join("static"),
    output_directory_app_path: standalone_app_path,
  }
}

/// Move static assets, move the public directory, and write bundle.yaml.
/// The three tasks target disjoint destinations, so they run concurrently.
pub async fn generate_build_output(
  root_dir: &Path,
  app_dir: &Path,
  opts: &OutputBundleOptions,
  next_build_directory: &Path,
  metadata: &AdapterMetadata,
) -> Result<()> {
  let static_directory = next_build_directory.join("static");
  let public_directory = app_dir.join("public");
  tokio::try_join!(
    move_directory(&static_directory, &opts.output_static_directory_path),
    move_public_directory(&public_directory, &opts.output_public_directory_path),
    generate_bundle_yaml(opts, root_dir, metadata),
  )?;
  Ok(())
}

/// Move `src` over `dst`, replacing anything already there. Rename first, with
/// a copy + remove fallback when the destination is on another filesystem.
async fn move_directory(src: &Path, dst: &Path) -> Result<()> {
  if tokio::fs::metadata(dst).await.is_ok() {
    tokio::fs::remove_dir_all(dst)
      .await
      .with_context(|| format!("failed to remove {}", dst.display()))?;
  }
  if let Some(parent) = dst.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  if tokio::fs::rename(src, dst).await.is_ok() {
    return Ok(());
  }
  copy_directory(src, dst)?;
  tokio::fs::remove_dir_all(src)
    .await
    .with_context(|| format!("failed to remove {}", src.display()))
}

fn copy_directory(src: &Path, dst: &Path) -> Result<()> {
  std::fs::create_dir_all(dst).with_context(|| format!("failed to create {}", dst.display()))?;
  for entry in
    std::fs::read_dir(src).with_context(|| format!("failed to read {}", src.display()))?
  {
    let entry = entry.with_context(|| format!("failed to read {}", src.display()))?;
    let from = entry.path();
    let to = dst.join(entry.file_name());
    if entry.file_type().with_context(|| format!("failed to stat {}", from.display()))?.is_dir() {
      copy_directory(&from, &to)?;
    } else {
      std::fs::copy(&from, &to)
        .with_context(|| format!("failed to copy {} -> {}", from.display(), to.display()))?;
    }
  }
  Ok(())
}

/// The public directory is optional; a missing one is skipped, not an error.
async fn move_public_directory(public_directory: &Path, dst: &Path) -> Result<()> {
  if tokio::fs::metadata(public_directory).await.is_err() {
    return Ok(());
  }
  move_directory(public_directory, dst).await
}

async fn generate_bundle_yaml(
  opts: &OutputBundleOptions,
  cwd: &Path,
  metadata: &AdapterMetadata,
) -> Result<()> {
  tokio::fs::create_dir_all(&opts.output_directory_base_path).await.with_context(|| {
    format!("failed to create {}", opts.output_directory_base_path.display())
  })?;

  let server_file = opts.server_file_path.strip_prefix(cwd).unwrap_or(&opts.server_file_path);
  let bundle = BundleYaml {
    output_bundle: OutputBundle {
      version: BUNDLE_VERSION.to_string(),
      server_config: ServerConfig {
        run_command: vec!["node".to_string(), server_file.to_string_lossy().into_owned()],
      },
      metadata: BundleMetadata {
        adapter_npm_package_name: metadata.adapter_package_name.clone(),
        framework: FRAMEWORK.to_string(),
      },
    },
  };

  let yaml = serde_yaml::to_string(&bundle).context("failed to serialize bundle.yaml")?;
  tokio::fs::write(&opts.bundle_yaml_path, yaml)
    .await
    .with_context(|| format!("failed to write {}", opts.bundle_yaml_path.display()))
}

/// The hosting runtime expects the build directory, the standalone output and
/// bundle.yaml to all exist. Anything else is a structural failure, reported
/// distinctly from plain I/O errors.
pub fn validate_output_directory(
  opts: &OutputBundleOptions,
  next_build_directory: &Path,
) -> Result<()> {
  let standalone_directory = next_build_directory.join("standalone");
  if !next_build_directory.is_dir()
    || !standalone_directory.is_dir()
    || !opts.bundle_yaml_path.is_file()
  {
    bail!("output directory is not of expected structure");
  }
  Ok(())
}

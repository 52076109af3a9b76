/* src/manifest.rs */

// Serde types for the two Next.js build manifests this tool touches, plus
// their load/write helpers. Only the fields we mutate are typed; everything
// else rides along in a flattened `extra` map so a load -> mutate -> write
// cycle preserves fields (and, via serde_json's preserve_order, their order).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ROUTES_MANIFEST: &str = "routes-manifest.json";
pub const MIDDLEWARE_MANIFEST: &str = "middleware-manifest.json";

/// Framework identifier reported in headers and bundle metadata.
pub const FRAMEWORK: &str = "nextjs";

/// Identity of this adapter build. Supplied by the caller (CLI flags or the
/// crate version), never derived from the app's files.
#[derive(Debug, Clone)]
pub struct AdapterMetadata {
  pub adapter_package_name: String,
  pub adapter_version: String,
}

/// routes-manifest.json. Header rules are matched in sequence order, so this
/// tool only ever appends to `headers`; redirects and route descriptors pass
/// through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutesManifest {
  pub version: u32,
  #[serde(default)]
  pub headers: Vec<HeaderRule>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rewrites: Option<Rewrites>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRule {
  pub source: String,
  /// Derived matcher for `source`, pre-compiled by the framework's router.
  pub regex: String,
  pub headers: Vec<HeaderValue>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderValue {
  pub key: String,
  pub value: String,
}

/// The rewrites field comes in two shapes depending on how the app configured
/// them: a flat ordered list, or the staged object. The shape present in the
/// input must survive to the output, never silently flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rewrites {
  Flat(Vec<Rewrite>),
  Staged(StagedRewrites),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedRewrites {
  #[serde(default)]
  pub before_files: Vec<Rewrite>,
  #[serde(default)]
  pub after_files: Vec<Rewrite>,
  #[serde(default)]
  pub fallback: Vec<Rewrite>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rewrite {
  pub source: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub has: Option<Vec<RouteHas>>,
  pub destination: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base_path: Option<bool>,
  pub regex: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Match condition on a query parameter, header, cookie or host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHas {
  #[serde(rename = "type")]
  pub has_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<String>,
}

/// server/middleware-manifest.json. Read-only input: any key under
/// `middleware` means middleware is active for the whole app.
#[derive(Debug, Clone, Deserialize)]
pub struct MiddlewareManifest {
  #[allow(dead_code)]
  pub version: u32,
  #[serde(default)]
  pub middleware: Map<String, Value>,
}

impl MiddlewareManifest {
  pub fn middleware_exists(&self) -> bool {
    !self.middleware.is_empty()
  }
}

fn routes_manifest_path(app_path: &Path, dist_dir: &str) -> PathBuf {
  app_path.join(dist_dir).join(ROUTES_MANIFEST)
}

fn middleware_manifest_path(app_path: &Path, dist_dir: &str) -> PathBuf {
  app_path.join(dist_dir).join("server").join(MIDDLEWARE_MANIFEST)
}

pub fn load_route_manifest(app_path: &Path, dist_dir: &str) -> Result<RoutesManifest> {
  let path = routes_manifest_path(app_path, dist_dir);
  let content =
    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn write_route_manifest(
  app_path: &Path,
  dist_dir: &str,
  manifest: &RoutesManifest,
) -> Result<()> {
  let path = routes_manifest_path(app_path, dist_dir);
  let json = serde_json::to_string(manifest)
    .with_context(|| format!("failed to serialize {ROUTES_MANIFEST}"))?;
  std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub fn load_middleware_manifest(app_path: &Path, dist_dir: &str) -> Result<MiddlewareManifest> {
  let path = middleware_manifest_path(app_path, dist_dir);
  let content =
    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

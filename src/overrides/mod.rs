/* src/overrides/mod.rs */

// App Hosting overrides applied to the route manifest after `next build`:
// diagnostic headers on every route, and proxy rewrites that send image
// optimization requests back to the original remote host.


use std::path::Path;

use anyhow::Result;
use serde_json::Map;

use crate::manifest::{
  self, AdapterMetadata, HeaderRule, HeaderValue, Rewrite, Rewrites, RouteHas, RoutesManifest,
  StagedRewrites, FRAMEWORK,
};
use crate::ui;

const ADAPTER_HEADER: &str = "x-fah-adapter";
const MIDDLEWARE_HEADER: &str = "x-fah-middleware";
const IMAGE_OPTIMIZATION_SOURCE: &str = "/_next/image";

const CATCH_ALL_SOURCE: &str = "/:path*";

/// Matcher the framework's pattern compiler derives for `CATCH_ALL_SOURCE`.
/// The framework compiles header sources to regexes at build time; rather than
/// replicate that compiler for the one pattern we emit, this literal was taken
/// from the routes-manifest.json of a sample app built with this source. An
/// upstream change to the pattern compiler invalidates it.
const CATCH_ALL_REGEX: &str = "^(?:/((?:[^/]+?)(?:/(?:[^/]+?))*))?(?:/)?$";

/// Load both manifests, append header and rewrite overrides to the route
/// manifest, and write it back. Any read/write error aborts the operation.
pub fn add_app_hosting_overrides(
  app_path: &Path,
  dist_dir: &str,
  metadata: &AdapterMetadata,
) -> Result<()> {
  let middleware_manifest = manifest::load_middleware_manifest(app_path, dist_dir)?;
  let mut route_manifest = manifest::load_route_manifest(app_path, dist_dir)?;

  add_custom_headers(&mut route_manifest, metadata, middleware_manifest.middleware_exists());
  add_image_optimization_rewrites(&mut route_manifest);

  manifest::write_route_manifest(app_path, dist_dir, &route_manifest)
}

/// Append one catch-all header rule carrying the adapter version, plus the
/// middleware marker when middleware is active. Appending keeps every existing
/// rule ahead of ours, so nothing the app configured is shadowed.
pub fn add_custom_headers(
  manifest: &mut RoutesManifest,
  metadata: &AdapterMetadata,
  middleware_active: bool,
) {
  let mut headers = vec![HeaderValue {
    key: ADAPTER_HEADER.to_string(),
    value: format!("{FRAMEWORK}-{}", metadata.adapter_version),
  }];
  if middleware_active {
    headers.push(HeaderValue { key: MIDDLEWARE_HEADER.to_string(), value: "true".to_string() });
  }

  manifest.headers.push(HeaderRule {
    source: CATCH_ALL_SOURCE.to_string(),
    regex: CATCH_ALL_REGEX.to_string(),
    headers,
    extra: Map::new(),
  });
}

/// The two proxy rules for the image optimization endpoint, one per scheme.
/// The original host and path are recovered from the `url` query parameter via
/// named capture groups.
fn image_optimization_rewrites() -> Vec<Rewrite> {
  ["http", "https"]
    .into_iter()
    .map(|scheme| Rewrite {
      source: IMAGE_OPTIMIZATION_SOURCE.to_string(),
      has: Some(vec![RouteHas {
        has_type: "query".to_string(),
        key: Some("url".to_string()),
        value: Some(format!("{scheme}://(?<host>.+)/(?<path>.+)")),
      }]),
      destination: format!("{scheme}://:host/:path"),
      base_path: Some(false),
      regex: format!("^{IMAGE_OPTIMIZATION_SOURCE}(?:/)?$"),
      extra: Map::new(),
    })
    .collect()
}

/// Ensure the image optimization proxy rewrites exist. An absent rewrites
/// field is initialized to the staged shape with empty lists; a flat list
/// stays flat and a staged object stays staged, with insertions going to
/// `beforeFiles` so the proxy runs ahead of the app's own rewrites. If a rule
/// for the endpoint is already present the manifest is left untouched.
pub fn add_image_optimization_rewrites(manifest: &mut RoutesManifest) {
  let rewrites =
    manifest.rewrites.get_or_insert_with(|| Rewrites::Staged(StagedRewrites::default()));

  let target = match rewrites {
    Rewrites::Flat(rules) => rules,
    Rewrites::Staged(staged) => &mut staged.before_files,
  };

  if target.iter().any(|r| r.source.starts_with(IMAGE_OPTIMIZATION_SOURCE)) {
    ui::warn(&format!("rewrite already exists for {IMAGE_OPTIMIZATION_SOURCE} -- skipping"));
    return;
  }

  target.extend(image_optimization_rewrites());
}

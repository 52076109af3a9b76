/* src/next_config/mod.rs */

// Replaces the user's next.config.* with a generated wrapper that forces
// images.unoptimized at config-evaluation time. The original module is moved
// aside verbatim and re-exported through the wrapper; whether its export is a
// factory function or a plain object is decided by the generated code at
// require/import time (a `typeof` branch), so the module is never parsed here.

#[cfg(test)]
mod tests;

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::ui;

/// Recognized config file names, probed in this order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["next.config.js", "next.config.mjs", "next.config.ts"];

const ORIGINAL_LOCAL_NAME: &str = "originalConfig";
const GENERATED_MARKER: &str = "// @generated by the Firebase App Hosting adapter -- do not edit.";

/// Module convention, decided purely by the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleStyle {
  CommonJs,
  EsModule,
}

impl ModuleStyle {
  fn from_extension(ext: &str) -> Option<Self> {
    match ext {
      "js" => Some(Self::CommonJs),
      "mjs" | "ts" => Some(Self::EsModule),
      _ => None,
    }
  }
}

/// Probe for a config module under `project_root`. Apps must have one for the
/// override step; a missing config is fatal for the whole build.
pub fn find_next_config(project_root: &Path) -> Result<String> {
  for name in CONFIG_FILE_NAMES {
    if project_root.join(name).is_file() {
      return Ok(name.to_string());
    }
  }
  bail!(
    "no Next.js config found in {} (looked for {})",
    project_root.display(),
    CONFIG_FILE_NAMES.join(", ")
  );
}

/// Split `next.config.js` into ("next.config", "js").
fn split_config_name(file_name: &str) -> Result<(&str, &str)> {
  match file_name.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Ok((stem, ext)),
    _ => bail!("config file name has no extension: {file_name}"),
  }
}

/// Move the original config aside (`next.config.js` -> `next.config.original.js`)
/// and write the wrapper in its place.
pub fn override_next_config(project_root: &Path, config_file_name: &str) -> Result<()> {
  let (stem, ext) = split_config_name(config_file_name)?;
  let Some(style) = ModuleStyle::from_extension(ext) else {
    bail!("unsupported config extension .{ext} (expected one of {})", CONFIG_FILE_NAMES.join(", "));
  };

  let config_path = project_root.join(config_file_name);
  if !config_path.is_file() {
    bail!("config file not found: {}", config_path.display());
  }

  let original_name = format!("{stem}.original.{ext}");
  let original_path = project_root.join(&original_name);
  std::fs::rename(&config_path, &original_path).with_context(|| {
    format!("failed to move {} to {}", config_path.display(), original_path.display())
  })?;

  let code = render_config_wrapper(style, stem, ext);
  std::fs::write(&config_path, code)
    .with_context(|| format!("failed to write {}", config_path.display()))?;

  ui::detail_ok(&format!("{config_file_name} -> {original_name}"));
  Ok(())
}

/// Emit the wrapper module text for the given convention. Both branches of the
/// function-vs-value decision are present in the output; the language's own
/// runtime type check picks one when the framework loads the config.
fn render_config_wrapper(style: ModuleStyle, stem: &str, ext: &str) -> String {
  // TypeScript resolves sibling modules without an extension; CJS and ESM get
  // the real file name.
  let specifier = match ext {
    "ts" => format!("{stem}.original"),
    _ => format!("{stem}.original.{ext}"),
  };

  let mut out = String::new();
  out.push_str(GENERATED_MARKER);
  out.push('\n');
  out.push_str(&format!(
    "// The original configuration was moved to ./{stem}.original.{ext} and is\n"
  ));
  out.push_str("// re-exported below with image optimization disabled.\n");

  match style {
    ModuleStyle::CommonJs => {
      out.push_str(&format!("const {ORIGINAL_LOCAL_NAME} = require(\"./{specifier}\");\n\n"));
    }
    ModuleStyle::EsModule => {
      out.push_str(&format!("import {ORIGINAL_LOCAL_NAME} from \"./{specifier}\";\n\n"));
    }
  }

  out.push_str(&format!("const config =\n  typeof {ORIGINAL_LOCAL_NAME} === \"function\"\n"));
  out.push_str("    ? async (phase, context) => {\n");
  out.push_str(&format!(
    "        const resolved = await {ORIGINAL_LOCAL_NAME}(phase, context);\n"
  ));
  out.push_str("        return {\n");
  out.push_str("          ...resolved,\n");
  out.push_str("          images: { ...resolved.images, unoptimized: true },\n");
  out.push_str("        };\n");
  out.push_str("      }\n");
  out.push_str("    : {\n");
  out.push_str(&format!("        ...{ORIGINAL_LOCAL_NAME},\n"));
  out.push_str(&format!(
    "        images: {{ ...{ORIGINAL_LOCAL_NAME}.images, unoptimized: true }},\n"
  ));
  out.push_str("      };\n\n");

  match style {
    ModuleStyle::CommonJs => out.push_str("module.exports = config;\n"),
    ModuleStyle::EsModule => out.push_str("export default config;\n"),
  }

  out
}

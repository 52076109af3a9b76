/* src/next_config/tests.rs */

use tempfile::TempDir;

use super::*;

const ORIGINAL_JS: &str = "module.exports = { reactStrictMode: true };\n";
const ORIGINAL_MJS: &str = "export default { reactStrictMode: true };\n";
const ORIGINAL_TS: &str =
  "import type { NextConfig } from \"next\";\n\nconst config: NextConfig = {};\n\nexport default config;\n";

fn read(dir: &TempDir, name: &str) -> String {
  std::fs::read_to_string(dir.path().join(name)).unwrap()
}

#[test]
fn find_prefers_js_over_mjs() {
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("next.config.js"), ORIGINAL_JS).unwrap();
  std::fs::write(dir.path().join("next.config.mjs"), ORIGINAL_MJS).unwrap();

  assert_eq!(find_next_config(dir.path()).unwrap(), "next.config.js");
}

#[test]
fn find_falls_back_to_ts() {
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("next.config.ts"), ORIGINAL_TS).unwrap();

  assert_eq!(find_next_config(dir.path()).unwrap(), "next.config.ts");
}

#[test]
fn find_fails_when_no_config_exists() {
  let dir = TempDir::new().unwrap();

  let err = find_next_config(dir.path()).unwrap_err();
  assert!(err.to_string().contains("no Next.js config found"));
}

#[test]
fn override_js_relocates_original_verbatim() {
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("next.config.js"), ORIGINAL_JS).unwrap();

  override_next_config(dir.path(), "next.config.js").unwrap();

  assert_eq!(read(&dir, "next.config.original.js"), ORIGINAL_JS);
}

#[test]
fn override_js_emits_commonjs_wrapper() {
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("next.config.js"), ORIGINAL_JS).unwrap();

  override_next_config(dir.path(), "next.config.js").unwrap();

  let wrapper = read(&dir, "next.config.js");
  assert!(wrapper.starts_with("// @generated"));
  assert!(wrapper.contains("const originalConfig = require(\"./next.config.original.js\");"));
  assert!(wrapper.contains("typeof originalConfig === \"function\""));
  assert!(wrapper.contains("module.exports = config;"));
  assert!(!wrapper.contains("export default"));
}

#[test]
fn override_mjs_emits_es_module_wrapper() {
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("next.config.mjs"), ORIGINAL_MJS).unwrap();

  override_next_config(dir.path(), "next.config.mjs").unwrap();

  let wrapper = read(&dir, "next.config.mjs");
  assert!(wrapper.contains("import originalConfig from \"./next.config.original.mjs\";"));
  assert!(wrapper.contains("export default config;"));
  assert!(!wrapper.contains("require("));
  assert!(!wrapper.contains("module.exports"));
}

#[test]
fn override_ts_imports_without_extension() {
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("next.config.ts"), ORIGINAL_TS).unwrap();

  override_next_config(dir.path(), "next.config.ts").unwrap();

  assert_eq!(read(&dir, "next.config.original.ts"), ORIGINAL_TS);
  let wrapper = read(&dir, "next.config.ts");
  assert!(wrapper.contains("import originalConfig from \"./next.config.original\";"));
  assert!(!wrapper.contains("\"./next.config.original.ts\""));
  assert!(wrapper.contains("export default config;"));
}

#[test]
fn wrapper_covers_both_export_forms() {
  // The function-vs-value decision is a runtime branch in the generated code,
  // so a single wrapper must carry both merge paths.
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("next.config.js"), ORIGINAL_JS).unwrap();

  override_next_config(dir.path(), "next.config.js").unwrap();

  let wrapper = read(&dir, "next.config.js");
  assert!(wrapper.contains("await originalConfig(phase, context)"));
  assert!(wrapper.contains("images: { ...resolved.images, unoptimized: true }"));
  assert!(wrapper.contains("...originalConfig,"));
  assert!(wrapper.contains("images: { ...originalConfig.images, unoptimized: true }"));
}

#[test]
fn override_fails_when_file_missing() {
  let dir = TempDir::new().unwrap();

  let err = override_next_config(dir.path(), "next.config.js").unwrap_err();
  assert!(err.to_string().contains("config file not found"));
}

#[test]
fn override_rejects_unsupported_extension() {
  let dir = TempDir::new().unwrap();
  std::fs::write(dir.path().join("next.config.cjs"), ORIGINAL_JS).unwrap();

  let err = override_next_config(dir.path(), "next.config.cjs").unwrap_err();
  assert!(err.to_string().contains("unsupported config extension"));
}

#[test]
fn override_rejects_name_without_extension() {
  let dir = TempDir::new().unwrap();

  let err = override_next_config(dir.path(), "noext").unwrap_err();
  assert!(err.to_string().contains("no extension"));
}

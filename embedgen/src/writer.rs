use std::fs;
use std::path::{Path, PathBuf};

use embedfs::{BundleKey, Bundles};
use log::{debug, info};

use crate::error::Result;

/// File name of the JSON payload for `key`: `NAME.json` for the default bundle,
/// `NAME_<os>_<arch>.json` otherwise.
pub fn bundle_file_name(name: &str, key: &BundleKey) -> String {
    if key.is_default() {
        format!("{}.json", name)
    } else {
        format!("{}{}.json", name, key)
    }
}

/// Writes every bundle as JSON plus `NAME.rs`, which picks the payload for the target
/// platform. Returns the paths written, module last.
pub fn write_bundles(bundles: &Bundles, output_dir: &Path, name: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    for (key, bundle) in bundles {
        let path = output_dir.join(bundle_file_name(name, key));
        fs::write(&path, bundle.to_json()?)?;
        debug!("writer: {} -> {}", key, path.display());
        written.push(path);
    }

    let module = output_dir.join(format!("{}.rs", name));
    fs::write(&module, render_module(bundles, name))?;
    info!(
        "writer: {} bundles and {} written to {}",
        bundles.len(),
        module.display(),
        output_dir.display()
    );
    written.push(module);
    Ok(written)
}

/// Source of the selecting module. Each constrained bundle gets a predicate that excludes every
/// more specific overlapping bundle, the default bundle covers whatever is left.
pub fn render_module(bundles: &Bundles, name: &str) -> String {
    let mut out = String::from(
        "// Generated by embedgen. Do not edit.\n\
         //\n\
         // Load with `embedfs::FileSystem::load(BUNDLE)`.\n",
    );

    let keys: Vec<BundleKey> = bundles.keys().copied().collect();
    for (key, predicate) in exclusive_predicates(&keys) {
        out.push_str(&format!(
            "\n#[cfg({})]\npub static BUNDLE: &str = include_str!(\"{}\");\n",
            predicate,
            bundle_file_name(name, &key)
        ));
    }

    let constrained: Vec<String> = keys
        .iter()
        .filter(|key| !key.is_default())
        .map(BundleKey::cfg_predicate)
        .collect();
    if bundles.contains_key(&BundleKey::default()) {
        out.push_str(&format!(
            "\n#[cfg(not(any({})))]\npub static BUNDLE: &str = include_str!(\"{}\");\n",
            constrained.join(", "),
            bundle_file_name(name, &BundleKey::default())
        ));
    }
    out
}

fn specificity(key: &BundleKey) -> u8 {
    match (key.os, key.arch) {
        (Some(_), Some(_)) => 0,
        (Some(_), None) => 1,
        (None, Some(_)) => 2,
        (None, None) => 3,
    }
}

fn overlaps(a: &BundleKey, b: &BundleKey) -> bool {
    let compatible = |x: Option<&str>, y: Option<&str>| x.is_none() || y.is_none() || x == y;
    compatible(a.os, b.os) && compatible(a.arch, b.arch)
}

/// Predicates for the constrained keys, pairwise disjoint.
fn exclusive_predicates(keys: &[BundleKey]) -> Vec<(BundleKey, String)> {
    let mut ordered: Vec<BundleKey> = keys.iter().filter(|k| !k.is_default()).copied().collect();
    ordered.sort_by_key(|key| (specificity(key), *key));

    ordered
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let shadowing: Vec<String> = ordered[..i]
                .iter()
                .filter(|earlier| specificity(earlier) < specificity(key) && overlaps(earlier, key))
                .map(BundleKey::cfg_predicate)
                .collect();
            let predicate = if shadowing.is_empty() {
                key.cfg_predicate()
            } else {
                format!(
                    "all({}, not(any({})))",
                    key.cfg_predicate(),
                    shadowing.join(", ")
                )
            };
            (*key, predicate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedfs::FileSystem;

    fn bundles(declaring: &[&str]) -> Bundles {
        let mut bundles = Bundles::new();
        bundles.insert(BundleKey::default(), FileSystem::new());
        for file in declaring {
            bundles.insert(BundleKey::from_declaring_file(file), FileSystem::new());
        }
        bundles
    }

    #[test]
    fn test_file_names() {
        assert_eq!(bundle_file_name("web", &BundleKey::default()), "web.json");
        assert_eq!(
            bundle_file_name("web", &BundleKey::from_declaring_file("x_linux_arm64.rs")),
            "web_linux_arm64.json"
        );
    }

    #[test]
    fn test_default_only() {
        let module = render_module(&bundles(&[]), "assets");
        assert!(module.contains(
            "#[cfg(not(any()))]\npub static BUNDLE: &str = include_str!(\"assets.json\");"
        ));
        assert_eq!(module.matches("pub static BUNDLE").count(), 1);
    }

    #[test]
    fn test_specific_bundles_shadow_general_ones() {
        let module = render_module(
            &bundles(&["a_linux.rs", "a_linux_amd64.rs", "a_amd64.rs", "a_windows.rs"]),
            "assets",
        );
        assert!(module.contains(
            "#[cfg(all(target_os = \"linux\", target_arch = \"x86_64\"))]\n\
             pub static BUNDLE: &str = include_str!(\"assets_linux_amd64.json\");"
        ));
        assert!(module.contains(
            "#[cfg(all(target_os = \"linux\", not(any(all(target_os = \"linux\", target_arch = \"x86_64\")))))]"
        ));
        assert!(module.contains("#[cfg(target_os = \"windows\")]"));
        // arch-only yields to both linux bundles and to windows
        assert!(module.contains(
            "#[cfg(all(target_arch = \"x86_64\", not(any(all(target_os = \"linux\", target_arch = \"x86_64\"), target_os = \"linux\", target_os = \"windows\"))))]"
        ));
        assert!(module.contains("include_str!(\"assets.json\")"));
        assert_eq!(module.matches("pub static BUNDLE").count(), 5);
    }

    #[test]
    fn test_write_bundles() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("generated");
        let written = write_bundles(&bundles(&["x_darwin.rs"]), &out, "site").unwrap();
        assert_eq!(
            written,
            vec![out.join("site.json"), out.join("site_darwin.json"), out.join("site.rs")]
        );
        let json = fs::read_to_string(out.join("site_darwin.json")).unwrap();
        let loaded = FileSystem::from_json(&json).unwrap();
        assert!(loaded.is_empty());
    }
}

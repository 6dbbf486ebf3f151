// build.rs

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

const FALLBACK_LANG: &str = "en";

fn main() {
    // --- 1. Pick the message catalog ---
    // A `lang_*` feature wins over the ATRAP_BATCH_LANG variable.
    let mut feature_langs: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(str::to_lowercase)
        })
        .collect();
    feature_langs.sort();

    let lang = match feature_langs.first() {
        Some(first) => {
            if feature_langs.len() > 1 {
                println!(
                    "cargo:warning=Several language features enabled ({:?}); using '{}'.",
                    feature_langs, first
                );
            }
            first.clone()
        }
        None => env::var("ATRAP_BATCH_LANG").unwrap_or_else(|_| FALLBACK_LANG.to_string()),
    };

    println!("cargo:rustc-env=ATRAP_BATCH_LANG_EFFECTIVE={}", lang);
    println!("cargo:rerun-if-env-changed=ATRAP_BATCH_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    // --- 2. Load English first, then overlay the selected catalog ---
    let mut messages = read_catalog(&format!("locales/{}.toml", FALLBACK_LANG))
        .expect("locales/en.toml must exist and be valid TOML");

    if lang != FALLBACK_LANG {
        let path = format!("locales/{}.toml", lang);
        match read_catalog(&path) {
            Some(overlay) => messages.extend(overlay),
            None => println!(
                "cargo:warning=Catalog '{}' missing or invalid. Falling back to '{}'.",
                path, FALLBACK_LANG
            ),
        }
    }

    // --- 3. Emit the `t!` macro ---
    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in &messages {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, escaped));
    }
    // Unknown keys fail at compile time.
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    code.push('}');

    let out_dir = env::var("OUT_DIR").expect("cargo always sets OUT_DIR");
    fs::write(Path::new(&out_dir).join("translations.rs"), code)
        .expect("failed to write translations.rs");
}

fn read_catalog(path: &str) -> Option<BTreeMap<String, String>> {
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

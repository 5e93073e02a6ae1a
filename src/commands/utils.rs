use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fitting::{FittingError, FittingResult, FittingRoom, ImageSource, LoaderSettings, Product, RenderSettings};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::GlobalOptions;

/// Build a FittingRoom from the global options.
pub fn build_room(global: &GlobalOptions) -> FittingRoom {
    let loader = LoaderSettings::default()
        .with_attempt_timeout(Duration::from_secs(global.timeout_secs.max(1)))
        .with_relay_endpoint(global.cors_relay.clone());
    let render = RenderSettings {
        garment_filter: global.garment_filter.into(),
        strict_photo_validation: global.strict_photo,
        ..RenderSettings::default()
    };
    FittingRoom::new()
        .with_loader_settings(loader)
        .with_render_settings(render)
}

fn usage_error(msg: impl Into<String>) -> FittingError {
    std::io::Error::other(msg.into()).into()
}

/// Read and parse a product JSON file.
pub fn load_product(path: &Path) -> FittingResult<Product> {
    let json = fs::read_to_string(path)?;
    Product::from_json(&json)
}

/// Narrow `product` to the variant whose label, color, name, or id matches `selector`.
pub fn select_variant(product: &Product, selector: &str) -> FittingResult<Product> {
    let wanted = selector.trim();
    let hit = |value: Option<&str>| value.is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted));
    let variant = product
        .variants
        .iter()
        .find(|v| {
            hit(Some(v.label().as_str()))
                || hit(v.color.as_deref())
                || hit(v.name.as_deref())
                || hit(Some(v.id.as_str()))
        })
        .ok_or_else(|| {
            let known: Vec<String> = product.variants.iter().map(|v| v.label()).collect();
            usage_error(format!(
                "no variant `{wanted}` in product {} (available: {})",
                product.id,
                if known.is_empty() { "none".to_string() } else { known.join(", ") }
            ))
        })?;

    let mut narrowed = product.clone();
    narrowed.variants = vec![variant.clone()];
    Ok(narrowed)
}

/// Lowercase file-name fragment for a result label.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() { "result".to_string() } else { slug.to_string() }
}

/// File stem and default output directory for a photo source.
pub fn photo_stem_and_dir(photo: &ImageSource) -> (String, PathBuf) {
    match photo {
        ImageSource::Path(path) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "photo".to_string());
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (stem, dir)
        }
        _ => ("try-on".to_string(), PathBuf::from(".")),
    }
}

/// Percent bar for one try-on run at a time.
pub fn stage_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitting::Variant;

    fn product() -> Product {
        Product {
            id: "tee".into(),
            name: "Tee".into(),
            category: "shirts".into(),
            variants: vec![
                Variant {
                    id: "v-navy".into(),
                    color: Some("Navy".into()),
                    ..Variant::default()
                },
                Variant {
                    id: "v-red".into(),
                    name: Some("Crimson".into()),
                    ..Variant::default()
                },
            ],
            ..Product::default()
        }
    }

    #[test]
    fn select_variant_matches_color_name_or_id() {
        assert_eq!(select_variant(&product(), "navy").unwrap().variants[0].id, "v-navy");
        assert_eq!(select_variant(&product(), "Crimson").unwrap().variants[0].id, "v-red");
        assert_eq!(select_variant(&product(), "v-red").unwrap().variants.len(), 1);
    }

    #[test]
    fn select_variant_lists_known_labels_on_miss() {
        let err = select_variant(&product(), "green").unwrap_err();
        assert!(err.to_string().contains("Navy, Crimson"));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Navy Blue"), "navy-blue");
        assert_eq!(slugify("  Off/White!! "), "off-white");
        assert_eq!(slugify("***"), "result");
    }

    #[test]
    fn photo_stem_uses_file_name_for_paths() {
        let (stem, dir) = photo_stem_and_dir(&ImageSource::parse("shots/me.jpg"));
        assert_eq!(stem, "me");
        assert_eq!(dir, PathBuf::from("shots"));
        let (stem, dir) = photo_stem_and_dir(&ImageSource::parse("me.jpg"));
        assert_eq!(stem, "me");
        assert_eq!(dir, PathBuf::from("."));
        let (stem, _) = photo_stem_and_dir(&ImageSource::parse("https://x.test/me.jpg"));
        assert_eq!(stem, "try-on");
    }
}

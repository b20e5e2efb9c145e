mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./pixpress.toml",
        "~/.config/pixpress/config.toml",
        "/etc/pixpress/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    for path in &config.directories {
        if !path.exists() {
            tracing::warn!("Watch directory does not exist: {:?}", path);
        }
    }

    let webp = &config.conversion.webp;
    if webp.quality > 100 {
        anyhow::bail!("webp.quality must be 0-100, got {}", webp.quality);
    }
    if webp.method > 6 {
        anyhow::bail!("webp.method must be 0-6, got {}", webp.method);
    }

    let avif = &config.conversion.avif;
    if avif.min_quality > 63 || avif.max_quality > 63 {
        anyhow::bail!(
            "avif quantizers must be 0-63, got min {} max {}",
            avif.min_quality,
            avif.max_quality
        );
    }
    if avif.min_quality > avif.max_quality {
        anyhow::bail!(
            "avif.min_quality ({}) cannot exceed avif.max_quality ({})",
            avif.min_quality,
            avif.max_quality
        );
    }
    if avif.speed > 10 {
        anyhow::bail!("avif.speed must be 0-10, got {}", avif.speed);
    }
    if !matches!(avif.depth, 8 | 10 | 12) {
        anyhow::bail!("avif.depth must be 8, 10, or 12, got {}", avif.depth);
    }
    if avif.threads == 0 {
        anyhow::bail!("avif.threads must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_when_fields_omitted() {
        let file = write_config("directories = []\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.conversion.webp.quality, 80);
        assert_eq!(config.conversion.webp.method, 6);
        assert!(!config.conversion.webp.threads);
        assert_eq!(config.conversion.avif.min_quality, 20);
        assert_eq!(config.conversion.avif.max_quality, 35);
        assert_eq!(config.conversion.avif.depth, 8);
        assert!(config.tools.cwebp_path.is_none());
    }

    #[test]
    fn full_config_parses() {
        let file = write_config(
            r#"
directories = ["/srv/photos", "/srv/uploads"]

[conversion.webp]
quality = 90
method = 4
threads = true

[conversion.avif]
min_quality = 10
max_quality = 25
speed = 8
depth = 10
threads = 2

[tools]
cwebp_path = "/opt/libwebp/bin/cwebp"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.directories.len(), 2);
        assert_eq!(config.conversion.webp.quality, 90);
        assert!(config.conversion.webp.threads);
        assert_eq!(config.conversion.avif.speed, 8);
        assert_eq!(config.conversion.avif.depth, 10);
        assert_eq!(
            config.tools.cwebp_path.as_deref(),
            Some(std::path::Path::new("/opt/libwebp/bin/cwebp"))
        );
    }

    #[test]
    fn rejects_malformed_toml() {
        let file = write_config("directories = [not valid");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let file = write_config("[conversion.webp]\nquality = 101\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_inverted_avif_quantizers() {
        let file = write_config("[conversion.avif]\nmin_quality = 40\nmax_quality = 20\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_zero_avif_threads() {
        let file = write_config("[conversion.avif]\nthreads = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_bad_avif_depth() {
        let file = write_config("[conversion.avif]\ndepth = 9\n");
        assert!(load_config(file.path()).is_err());
    }
}

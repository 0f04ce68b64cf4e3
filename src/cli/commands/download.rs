//! Model download command.
//!
//! Fetches the concept database (and optionally a CUI filter) for the model
//! named by `MODEL_NAME` into `<models-dir>/<MODEL_NAME>/`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Environment variables read by the download command.
const MODEL_VARS: &[ModelVar] = &[
    ModelVar {
        name: "MODEL_NAME",
        description: "directory name for the downloaded model",
        required: true,
    },
    ModelVar {
        name: "MODEL_CDB_URL",
        description: "URL of the concept database JSON",
        required: true,
    },
    ModelVar {
        name: "MODEL_CUI_FILTER_URL",
        description: "URL of a CUI filter list (one CUI per line)",
        required: false,
    },
];

struct ModelVar {
    name: &'static str,
    description: &'static str,
    required: bool,
}

/// A file to fetch for a model.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModelArtifact {
    url: String,
    filename: &'static str,
}

/// Model download request resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModelSpec {
    name: String,
    artifacts: Vec<ModelArtifact>,
}

impl ModelSpec {
    /// Resolve from a variable lookup. Returns the missing required variable
    /// names on failure.
    fn from_lookup<F>(lookup: F) -> Result<Self, Vec<&'static str>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<_> = MODEL_VARS
            .iter()
            .filter(|var| var.required && get(var.name).is_none())
            .map(|var| var.name)
            .collect();

        let (Some(name), Some(cdb_url)) = (get("MODEL_NAME"), get("MODEL_CDB_URL")) else {
            return Err(missing);
        };

        let mut artifacts = vec![ModelArtifact {
            url: cdb_url,
            filename: "cdb.json",
        }];
        if let Some(url) = get("MODEL_CUI_FILTER_URL") {
            artifacts.push(ModelArtifact {
                url,
                filename: "cui_filter.txt",
            });
        }

        Ok(Self { name, artifacts })
    }
}

/// Default directory for downloaded models.
fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("concept-annotator")
        .join("models")
}

/// Download the model described by the MODEL_* environment variables.
pub async fn cmd_download_model(models_dir: Option<&Path>) -> anyhow::Result<()> {
    let spec = match ModelSpec::from_lookup(|key| std::env::var(key).ok()) {
        Ok(spec) => spec,
        Err(missing) => {
            eprintln!(
                "{} Missing required environment variables: {}",
                style("✗").red(),
                missing.join(", ")
            );
            eprintln!();
            for var in MODEL_VARS {
                let marker = if var.required { "required" } else { "optional" };
                eprintln!("  {:<22} {} ({})", var.name, var.description, marker);
            }
            anyhow::bail!("model download is not configured");
        }
    };

    let target_dir = models_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(default_models_dir)
        .join(&spec.name);
    tokio::fs::create_dir_all(&target_dir)
        .await
        .with_context(|| format!("Failed to create {}", target_dir.display()))?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("concept-annotator/", env!("CARGO_PKG_VERSION")))
        .build()?;

    for artifact in &spec.artifacts {
        let dest = target_dir.join(artifact.filename);
        if dest.exists() {
            println!(
                "  {} {} already present, skipping",
                style("✓").green(),
                dest.display()
            );
            continue;
        }

        println!("{} Downloading {}", style("→").cyan(), artifact.url);
        download_file(&client, &artifact.url, &dest).await?;
        println!("  {} Saved {}", style("✓").green(), dest.display());
    }

    println!(
        "\nSet {}={} to serve this model.",
        style("APP_MODEL_CDB_PATH").bold(),
        target_dir.join("cdb.json").display()
    );
    Ok(())
}

/// Stream `url` into `dest`, writing through a temp file in the same
/// directory so a failed download never leaves a partial file behind.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?
        .error_for_status()?;

    let pb = match response.content_length() {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")?
                    .progress_chars("#>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {bytes} ({bytes_per_sec})")?);
            pb
        }
    };

    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir)?;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    file.persist(dest)
        .with_context(|| format!("Failed to save {}", dest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_spec_requires_name_and_cdb_url() {
        let missing = ModelSpec::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(missing, vec!["MODEL_NAME", "MODEL_CDB_URL"]);

        let missing = ModelSpec::from_lookup(lookup(&[("MODEL_NAME", "snomed")])).unwrap_err();
        assert_eq!(missing, vec!["MODEL_CDB_URL"]);
    }

    #[test]
    fn test_spec_with_optional_filter() {
        let spec = ModelSpec::from_lookup(lookup(&[
            ("MODEL_NAME", "snomed"),
            ("MODEL_CDB_URL", "https://models.example/cdb.json"),
        ]))
        .unwrap();
        assert_eq!(spec.name, "snomed");
        assert_eq!(spec.artifacts.len(), 1);

        let spec = ModelSpec::from_lookup(lookup(&[
            ("MODEL_NAME", "snomed"),
            ("MODEL_CDB_URL", "https://models.example/cdb.json"),
            ("MODEL_CUI_FILTER_URL", "https://models.example/filter.txt"),
        ]))
        .unwrap();
        assert_eq!(spec.artifacts[1].filename, "cui_filter.txt");
    }

    #[test]
    fn test_default_models_dir() {
        assert!(default_models_dir().ends_with("concept-annotator/models"));
    }
}

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;

use stratus_core::config::{OwnerTag, ProviderSettings};
use stratus_core::descriptor::{ResourceDescriptor, ResourceKind};
use stratus_core::fanout::{Fanout, FanoutConfig, TaskStatus};
use stratus_core::locator::{Locate, Locator};
use stratus_core::reconciler::Reconciler;
use stratus_provider_aws::AwsProvider;

mod report;
use report::ResultArtifact;

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Idempotent cloud resource provisioning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure a resource exists, creating it if absent
    Ensure {
        /// Resource kind (instance, network, subnet, security-group,
        /// bucket, role, route-table, endpoint)
        kind: String,

        /// Resource name, unique within the provider scope
        name: String,

        /// AWS region
        #[arg(long, default_value = "us-east-1")]
        region: String,

        /// Tag to attach, as key=value (repeatable)
        #[arg(long = "tag", value_name = "KEY=VALUE")]
        tags: Vec<String>,

        /// Provider-specific creation parameter, as key=value where the
        /// value may be JSON (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Ownership tag pair stamped on the resource, as key=value
        #[arg(long, default_value = "managed-by=stratus")]
        owner_tag: String,

        /// Write a JSON result artifact to this path
        #[arg(long)]
        result_file: Option<PathBuf>,
    },
    /// Look a resource up without creating anything
    Lookup {
        /// Resource kind
        kind: String,

        /// Resource name
        name: String,

        /// AWS region
        #[arg(long, default_value = "us-east-1")]
        region: String,

        /// Write a JSON result artifact to this path
        #[arg(long)]
        result_file: Option<PathBuf>,
    },
    /// Reconcile every descriptor in a JSON manifest
    Batch {
        /// Path to a JSON array of resource descriptors
        manifest: PathBuf,

        /// AWS region
        #[arg(long, default_value = "us-east-1")]
        region: String,

        /// Maximum reconciliations in flight at once
        #[arg(long, default_value_t = 8)]
        max_in_flight: usize,

        /// Keep going after a failed resource
        #[arg(long)]
        continue_on_error: bool,

        /// Ownership tag pair stamped on every resource, as key=value
        #[arg(long, default_value = "managed-by=stratus")]
        owner_tag: String,

        /// Write a JSON array of result artifacts to this path
        #[arg(long)]
        result_file: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ensure {
            kind,
            name,
            region,
            tags,
            params,
            owner_tag,
            result_file,
        } => run_ensure(&kind, &name, region, &tags, &params, &owner_tag, result_file).await,
        Commands::Lookup {
            kind,
            name,
            region,
            result_file,
        } => run_lookup(&kind, &name, region, result_file).await,
        Commands::Batch {
            manifest,
            region,
            max_in_flight,
            continue_on_error,
            owner_tag,
            result_file,
        } => {
            run_batch(
                &manifest,
                region,
                max_in_flight,
                continue_on_error,
                &owner_tag,
                result_file,
            )
            .await
        }
        Commands::Completions { shell } => run_completions(shell),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_ensure(
    kind: &str,
    name: &str,
    region: String,
    tags: &[String],
    params: &[String],
    owner_tag: &str,
    result_file: Option<PathBuf>,
) -> Result<(), String> {
    let descriptor = build_descriptor(kind, name, tags, params, owner_tag)?;
    let provider = AwsProvider::new(&ProviderSettings::new(region)).await;
    let reconciler = Reconciler::for_client(provider.clone());

    match reconciler.reconcile(&descriptor).await {
        Ok(handle) => {
            let label = format!("{}.{}", descriptor.kind, descriptor.name);
            if handle.existed {
                println!(
                    "{} {} already exists in {} ({})",
                    "=".yellow(),
                    label,
                    provider.region(),
                    handle.id
                );
            } else {
                println!(
                    "{} {} created in {} ({})",
                    "+".green(),
                    label,
                    provider.region(),
                    handle.id
                );
            }
            if let Some(path) = result_file {
                report::write_artifact(&path, &ResultArtifact::success(&handle))?;
            }
            Ok(())
        }
        Err(e) => {
            if let Some(path) = result_file {
                report::write_artifact(&path, &ResultArtifact::failure(e.to_string()))?;
            }
            Err(e.to_string())
        }
    }
}

async fn run_lookup(
    kind: &str,
    name: &str,
    region: String,
    result_file: Option<PathBuf>,
) -> Result<(), String> {
    let descriptor = build_descriptor(kind, name, &[], &[], "managed-by=stratus")?;
    let provider = AwsProvider::new(&ProviderSettings::new(region)).await;
    let locator = Locator::new(provider.clone());

    match locator.find(&descriptor).await {
        Ok(Some(handle)) => {
            println!(
                "{} {}.{} exists in {} ({})",
                "=".yellow(),
                descriptor.kind,
                descriptor.name,
                provider.region(),
                handle.id
            );
            if let Some(path) = result_file {
                report::write_artifact(&path, &ResultArtifact::success(&handle))?;
            }
            Ok(())
        }
        Ok(None) => {
            println!(
                "{} {}.{} not found in {}",
                "?".dimmed(),
                descriptor.kind,
                descriptor.name,
                provider.region()
            );
            if let Some(path) = result_file {
                report::write_artifact(&path, &ResultArtifact::absent())?;
            }
            Ok(())
        }
        Err(e) => {
            if let Some(path) = result_file {
                report::write_artifact(&path, &ResultArtifact::failure(e.to_string()))?;
            }
            Err(e.to_string())
        }
    }
}

async fn run_batch(
    manifest: &PathBuf,
    region: String,
    max_in_flight: usize,
    continue_on_error: bool,
    owner_tag: &str,
    result_file: Option<PathBuf>,
) -> Result<(), String> {
    let content = fs::read_to_string(manifest)
        .map_err(|e| format!("failed to read {}: {}", manifest.display(), e))?;
    let descriptors: Vec<ResourceDescriptor> = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse {}: {}", manifest.display(), e))?;

    let owner = parse_owner_tag(owner_tag)?;
    let descriptors: Vec<ResourceDescriptor> = descriptors
        .into_iter()
        .map(|d| d.owned_by(&owner))
        .collect();
    let total = descriptors.len();

    let provider = AwsProvider::new(&ProviderSettings::new(region)).await;
    let reconciler = Reconciler::for_client(provider);
    let config = FanoutConfig {
        max_in_flight,
        continue_on_error,
    };

    let batch = Fanout::new(&reconciler)
        .with_config(config)
        .run(descriptors)
        .await;

    let mut artifacts = Vec::new();
    for outcome in &batch.outcomes {
        let label = format!("{}.{}", outcome.descriptor.kind, outcome.descriptor.name);
        match &outcome.status {
            TaskStatus::Completed(handle) if handle.existed => {
                println!("{} {} already exists ({})", "=".yellow(), label, handle.id);
                artifacts.push(ResultArtifact::success(handle));
            }
            TaskStatus::Completed(handle) => {
                println!("{} {} created ({})", "+".green(), label, handle.id);
                artifacts.push(ResultArtifact::success(handle));
            }
            TaskStatus::Failed(e) => {
                println!("{} {} failed: {}", "x".red(), label, e);
                artifacts.push(ResultArtifact::failure(e.to_string()));
            }
            TaskStatus::Skipped => {
                println!("{} {} skipped", "-".dimmed(), label);
                artifacts.push(ResultArtifact::failure("skipped: earlier resource failed"));
            }
        }
    }

    println!();
    println!(
        "Batch: {} succeeded, {} failed, {} skipped (of {})",
        batch.success_count, batch.failure_count, batch.skipped_count, total
    );

    if let Some(path) = result_file {
        report::write_artifacts(&path, &artifacts)?;
    }

    if batch.is_success() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} resources failed",
            batch.failure_count, total
        ))
    }
}

fn run_completions(shell: Shell) -> Result<(), String> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "stratus", &mut std::io::stdout());
    Ok(())
}

fn build_descriptor(
    kind: &str,
    name: &str,
    tags: &[String],
    params: &[String],
    owner_tag: &str,
) -> Result<ResourceDescriptor, String> {
    let kind: ResourceKind = kind.parse()?;
    let owner = parse_owner_tag(owner_tag)?;

    let mut descriptor = ResourceDescriptor::new(kind, name).owned_by(&owner);
    for raw in tags {
        let (key, value) = parse_kv(raw)?;
        descriptor = descriptor.with_tag(key, value);
    }
    for raw in params {
        let (key, value) = parse_kv(raw)?;
        descriptor = descriptor.with_parameter(key, parse_param_value(&value));
    }
    Ok(descriptor)
}

fn parse_owner_tag(raw: &str) -> Result<OwnerTag, String> {
    let (key, value) = parse_kv(raw)?;
    Ok(OwnerTag::new(key, value))
}

fn parse_kv(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

/// Accept JSON for structured parameter values, else treat as a plain string
fn parse_param_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kv_splits_on_first_equals() {
        assert_eq!(
            parse_kv("team=data=platform").unwrap(),
            ("team".to_string(), "data=platform".to_string())
        );
        assert!(parse_kv("no-separator").is_err());
        assert!(parse_kv("=empty-key").is_err());
    }

    #[test]
    fn parse_param_value_accepts_json_and_strings() {
        assert_eq!(parse_param_value("3"), serde_json::json!(3));
        assert_eq!(parse_param_value("true"), serde_json::json!(true));
        assert_eq!(
            parse_param_value(r#"{"Status": "Enabled"}"#),
            serde_json::json!({"Status": "Enabled"})
        );
        assert_eq!(
            parse_param_value("10.0.0.0/16"),
            serde_json::json!("10.0.0.0/16")
        );
    }

    #[test]
    fn build_descriptor_stamps_owner_tag() {
        let descriptor = build_descriptor(
            "network",
            "main",
            &["team=data".to_string()],
            &["CidrBlock=10.0.0.0/16".to_string()],
            "managed-by=stratus",
        )
        .unwrap();

        assert_eq!(descriptor.kind, ResourceKind::Network);
        assert_eq!(
            descriptor.tags.get("managed-by"),
            Some(&"stratus".to_string())
        );
        assert_eq!(
            descriptor.parameters.get("CidrBlock"),
            Some(&serde_json::json!("10.0.0.0/16"))
        );
    }

    #[test]
    fn build_descriptor_rejects_unknown_kind() {
        let err = build_descriptor("volume", "v", &[], &[], "managed-by=stratus").unwrap_err();
        assert!(err.contains("unknown resource kind"));
    }
}

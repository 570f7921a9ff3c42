use crate::generator::DocumentGenerator;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Generate an OpenAPI 3 document from annotated Rust handlers
#[derive(Parser, Debug)]
#[command(name = "openapi-from-annotations")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// API title, overriding any `@Title` in the sources
    #[arg(long = "title")]
    pub title: Option<String>,

    /// API version, overriding any `@Version` in the sources
    #[arg(long = "api-version", value_name = "VERSION")]
    pub api_version: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let generator = DocumentGenerator::new(args.project_path.clone())
        .with_info(args.title.clone(), args.api_version.clone());

    if generator.packages().is_empty() {
        anyhow::bail!("No Rust files found in the project directory");
    }

    let document = generator.build().with_context(|| {
        format!(
            "Failed to generate OpenAPI document for {}",
            args.project_path.display()
        )
    })?;
    info!("OpenAPI document built successfully");

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    let operations: usize = document
        .paths
        .values()
        .map(|item| {
            [&item.get, &item.post, &item.put, &item.delete, &item.patch, &item.options, &item.head]
                .iter()
                .filter(|op| op.is_some())
                .count()
        })
        .sum();
    let schemas = document
        .components
        .as_ref()
        .and_then(|c| c.schemas.as_ref())
        .map_or(0, |s| s.len());

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Paths: {}", document.paths.len());
    info!("  - Operations: {}", operations);
    info!("  - Component schemas: {}", schemas);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_defaults() {
        let args = CliArgs::try_parse_from(["openapi-from-annotations", "./project"]).unwrap();

        assert_eq!(args.project_path, PathBuf::from("./project"));
        assert!(matches!(args.output_format, OutputFormat::Yaml));
        assert!(args.output_path.is_none());
        assert!(args.title.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_cli_all_options() {
        let args = CliArgs::try_parse_from([
            "openapi-from-annotations",
            "./project",
            "-f",
            "json",
            "-o",
            "out/openapi.json",
            "--title",
            "Pets",
            "--api-version",
            "2.0.0",
            "-v",
        ])
        .unwrap();

        assert!(matches!(args.output_format, OutputFormat::Json));
        assert_eq!(args.output_path, Some(PathBuf::from("out/openapi.json")));
        assert_eq!(args.title.as_deref(), Some("Pets"));
        assert_eq!(args.api_version.as_deref(), Some("2.0.0"));
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let result = CliArgs::try_parse_from(["openapi-from-annotations", "./project", "-f", "toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_missing_and_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.rs");
        fs::write(&file, "").unwrap();

        let missing = CliArgs::try_parse_from([
            "openapi-from-annotations",
            temp_dir.path().join("missing").to_str().unwrap(),
        ])
        .unwrap();
        let err = parse_args_from_parsed(missing).unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        let not_dir =
            CliArgs::try_parse_from(["openapi-from-annotations", file.to_str().unwrap()]).unwrap();
        let err = parse_args_from_parsed(not_dir).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_run_writes_json_document() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            src.join("lib.rs"),
            "/// @Summary Ping\n/// @Success 200 {string} \"pong\"\n/// @Router /ping [get]\npub fn ping() {}\n",
        )
        .unwrap();
        let output = temp_dir.path().join("out").join("openapi.json");

        let args = CliArgs::try_parse_from([
            "openapi-from-annotations",
            temp_dir.path().to_str().unwrap(),
            "-f",
            "json",
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run(args).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(parsed["paths"]["/ping"]["get"]["summary"], "Ping");
    }

    #[test]
    fn test_run_reports_annotation_errors() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("lib.rs"), "/// @Router /ping\npub fn ping() {}\n").unwrap();

        let args =
            CliArgs::try_parse_from(["openapi-from-annotations", temp_dir.path().to_str().unwrap()])
                .unwrap();
        let err = run(args).unwrap_err();

        assert!(err.to_string().contains("Failed to generate OpenAPI document"));
        assert!(format!("{:#}", err).contains("MalformedRouterComment"));
    }

    #[test]
    fn test_run_empty_project() {
        let temp_dir = TempDir::new().unwrap();
        let args =
            CliArgs::try_parse_from(["openapi-from-annotations", temp_dir.path().to_str().unwrap()])
                .unwrap();

        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("No Rust files"));
    }
}

//! # Mapping Configuration Validator
//!
//! A command-line utility for checking identity-provider mapping configuration
//! files against the same integrity rules the library applies before storing them.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin mapping-validator mappings/google.json
//! cargo run --bin mapping-validator --transformer transformers.Lowercase ./mappings/
//! ```
//!
//! Every `--transformer NAME` declares a transformer name that resolves to an
//! attribute transformer. Any other transformer name referenced by a mapping item
//! is reported as invalid.
//!
//! ## Output Examples
//!
//! ```text
//! Validating mapping file: mappings/google.json
//! ✓ Mapping is valid!
//!
//! Mapping Summary:
//!   Key: google
//!   Items: 3
//!   Connector object key: username -> email
//! ```
//!
//! ```text
//! Validating mapping file: mappings/broken.json
//! ❌ Mapping validation failed:
//!   - InvalidMapping;Single ConnObjectKey mapping is required (connObjectKey.size)
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: All mappings are valid
//! - `1`: One or more mappings are invalid or could not be read

use idm_core::mapping::{MappingConfiguration, MappingValidator, StaticResolver, ValidationOutcome};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("mapping-validator");

    let (transformers, target) = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!();
            print_usage(program);
            process::exit(1);
        }
    };

    let validator = MappingValidator::new(StaticResolver::new().with_capable(transformers));
    let path = Path::new(&target);

    let all_valid = if path.is_file() {
        validate_single_file(&validator, path)
    } else if path.is_dir() {
        validate_directory(&validator, path)
    } else {
        eprintln!("Error: '{}' is not a valid file or directory", path.display());
        false
    };

    if !all_valid {
        process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} [--transformer NAME]... <mapping-file-or-directory>",
        program
    );
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} mappings/google.json", program);
    eprintln!("  {} --transformer transformers.Lowercase ./mappings/", program);
}

fn parse_args(args: &[String]) -> Result<(Vec<String>, String), String> {
    let mut transformers = Vec::new();
    let mut target = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--transformer" | "-t" => {
                let name = iter
                    .next()
                    .ok_or_else(|| format!("{} requires a transformer name", arg))?;
                transformers.push(name.clone());
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option '{}'", other));
            }
            other => {
                if target.replace(other.to_string()).is_some() {
                    return Err("only one file or directory can be validated".to_string());
                }
            }
        }
    }

    let target = target.ok_or_else(|| "missing mapping file or directory".to_string())?;
    Ok((transformers, target))
}

fn validate_single_file(validator: &MappingValidator<StaticResolver>, file_path: &Path) -> bool {
    println!("Validating mapping file: {}", file_path.display());

    match load_mapping(file_path) {
        Ok(config) => match validator.validate(&config) {
            ValidationOutcome::Valid => {
                println!("✓ Mapping is valid!");
                print_mapping_summary(&config);
                true
            }
            ValidationOutcome::Invalid(violations) => {
                eprintln!("❌ Mapping validation failed:");
                for violation in violations {
                    eprintln!("  - {}", violation);
                }
                false
            }
        },
        Err(e) => {
            eprintln!("❌ Could not read mapping: {}", e);
            false
        }
    }
}

fn validate_directory(validator: &MappingValidator<StaticResolver>, dir_path: &Path) -> bool {
    println!("Validating mappings in directory: {}", dir_path.display());

    let mut files: Vec<PathBuf> = match fs::read_dir(dir_path) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect(),
        Err(e) => {
            eprintln!("Error reading directory: {}", e);
            return false;
        }
    };
    files.sort();

    let mut valid_count = 0;
    let mut error_count = 0;

    for path in &files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("\nValidating: {}", file_name);

        match load_mapping(path) {
            Ok(config) => match validator.validate(&config) {
                ValidationOutcome::Valid => {
                    println!("  ✓ Valid - {} ({} items)", config.key, config.items.len());
                    valid_count += 1;
                }
                ValidationOutcome::Invalid(violations) => {
                    eprintln!("  ❌ Invalid - {}", config.key);
                    for violation in violations {
                        eprintln!("      {}", violation);
                    }
                    error_count += 1;
                }
            },
            Err(e) => {
                eprintln!("  ❌ Unreadable - {}", e);
                error_count += 1;
            }
        }
    }

    println!("\nValidation Summary:");
    println!("  Valid mappings: {}", valid_count);
    println!("  Invalid mappings: {}", error_count);

    error_count == 0
}

fn load_mapping(file_path: &Path) -> Result<MappingConfiguration, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let config: MappingConfiguration = serde_json::from_str(&content)?;
    Ok(config)
}

fn print_mapping_summary(config: &MappingConfiguration) {
    println!("\nMapping Summary:");
    println!("  Key: {}", config.key);
    if !config.name.is_empty() {
        println!("  Name: {}", config.name);
    }
    println!("  Items: {}", config.items.len());
    if let Some(item) = config.conn_object_key_item() {
        println!(
            "  Connector object key: {} -> {}",
            item.int_attr_name, item.ext_attr_name
        );
    }

    let transformers: Vec<&str> = config
        .items
        .iter()
        .flat_map(|item| item.transformer_class_names.iter().map(String::as_str))
        .collect();
    if !transformers.is_empty() {
        println!("  Transformers: {}", transformers.join(", "));
    }
}

//! recordkit command line tool
//!
//! Loads a schema document and checks it, or builds, derives and diffs
//! instances of its models from JSON.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use recordkit_model::{BuilderConfig, InstanceDelta, ModelInstance, ModelType, Presence, Value};
use recordkit_schema::{codec, ModelRegistry};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    let schema = Arg::new("schema")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Schema document (.toml, .json, .yaml or .yml)");
    let model = Arg::new("model")
        .long("model")
        .short('m')
        .required(true)
        .help("Model name");
    let values = Arg::new("values")
        .long("values")
        .default_value("{}")
        .help("Field values as a JSON object");

    Command::new("recordkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Check schema documents and build immutable model instances")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Builder settings (TOML)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity"),
        )
        .subcommand(
            Command::new("check")
                .about("Load a schema document and list its models")
                .arg(schema.clone()),
        )
        .subcommand(
            Command::new("create")
                .about("Create an instance and print it as JSON")
                .arg(schema.clone())
                .arg(model.clone())
                .arg(values.clone()),
        )
        .subcommand(
            Command::new("derive")
                .about("Create an instance, replace fields and print the result")
                .arg(schema.clone())
                .arg(model.clone())
                .arg(values)
                .arg(
                    Arg::new("set")
                        .long("set")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Replacement as field=JSON (bare text is taken as a string)"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Print the field changes between two instances")
                .arg(schema)
                .arg(model)
                .arg(Arg::new("from").long("from").required(true).help("Base instance as JSON"))
                .arg(Arg::new("to").long("to").required(true).help("Target instance as JSON")),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let Some((command, args)) = matches.subcommand() else {
        bail!("no subcommand given");
    };
    init_tracing(args.get_count("verbose"));

    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => load_config(path)?,
        None => BuilderConfig::default(),
    };

    match command {
        "check" => {
            let (registry, names) = load_registry(args, config)?;
            check(&registry, &names)
        }
        "create" => {
            let (registry, model) = load_model(args, config)?;
            let instance = decode_arg(&model, &registry, args, "values")?;
            print_instance(&instance)
        }
        "derive" => {
            let (registry, model) = load_model(args, config)?;
            let instance = decode_arg(&model, &registry, args, "values")?;
            let changes = args
                .get_many::<String>("set")
                .into_iter()
                .flatten()
                .map(|set| parse_set(&model, &registry, set))
                .collect::<Result<Vec<_>>>()?;
            let derived = instance
                .with_fields(changes)
                .with_context(|| format!("cannot derive {}", model.name()))?;
            print_instance(&derived)
        }
        "diff" => {
            let (registry, model) = load_model(args, config)?;
            let from = decode_arg(&model, &registry, args, "from")?;
            let to = decode_arg(&model, &registry, args, "to")?;
            let delta = InstanceDelta::between(&from, &to)?;
            if delta.is_empty() {
                println!("no changes");
            } else {
                for change in delta.changes() {
                    println!("{change}");
                }
            }
            Ok(())
        }
        other => bail!("unknown subcommand '{other}'"),
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: &Path) -> Result<BuilderConfig> {
    tracing::debug!(path = %path.display(), "loading builder config");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    BuilderConfig::from_toml_str(&content)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn load_registry(args: &ArgMatches, config: BuilderConfig) -> Result<(ModelRegistry, Vec<String>)> {
    let path = args
        .get_one::<PathBuf>("schema")
        .context("missing schema path")?;
    let registry = ModelRegistry::with_config(config);
    let names = registry
        .load_file(path)
        .with_context(|| format!("cannot load schema {}", path.display()))?;
    tracing::debug!(path = %path.display(), models = names.len(), "schema loaded");
    Ok((registry, names))
}

fn load_model(args: &ArgMatches, config: BuilderConfig) -> Result<(ModelRegistry, ModelType)> {
    let (registry, _) = load_registry(args, config)?;
    let name = args.get_one::<String>("model").context("missing model name")?;
    let Some(model) = registry.get(name) else {
        bail!(
            "unknown model '{name}' (available: {})",
            registry.names().join(", ")
        );
    };
    Ok((registry, model))
}

fn decode_arg(
    model: &ModelType,
    registry: &ModelRegistry,
    args: &ArgMatches,
    id: &str,
) -> Result<ModelInstance> {
    let input = args.get_one::<String>(id).map_or("{}", String::as_str);
    codec::decode_str(model, registry, input)
        .with_context(|| format!("invalid --{id} for {}", model.name()))
}

/// Parse `field=JSON`; text that is not JSON is taken as a string
fn parse_set(model: &ModelType, registry: &ModelRegistry, set: &str) -> Result<(String, Value)> {
    let Some((field, raw)) = set.split_once('=') else {
        bail!("invalid --set '{set}': expected field=value");
    };
    let json = serde_json::from_str(raw).unwrap_or_else(|_| {
        tracing::trace!(field, "--set value is not JSON, using it as a string");
        serde_json::Value::String(raw.to_string())
    });
    let value = codec::decode_field(model, registry, field, &json)
        .with_context(|| format!("invalid value for '{field}'"))?;
    Ok((field.to_string(), value))
}

fn check(registry: &ModelRegistry, names: &[String]) -> Result<()> {
    for name in names {
        let model = registry.get(name).context("model vanished from registry")?;
        println!("{name}");
        for field in model.fields() {
            match field.presence() {
                Presence::Required => println!("  {}: {} (required)", field.name(), field.kind()),
                Presence::Optional(default) => match default.as_literal() {
                    Some(value) => println!("  {}: {} = {value}", field.name(), field.kind()),
                    None => println!("  {}: {} = <factory>", field.name(), field.kind()),
                },
            }
        }
    }
    println!("{} model(s) ok", names.len());
    Ok(())
}

fn print_instance(instance: &ModelInstance) -> Result<()> {
    println!("{}", codec::encode_string(instance)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordkit_model::FieldKind;

    fn dog() -> ModelType {
        ModelType::builder("Dog")
            .required_kind("name", FieldKind::String)
            .optional_kind("age", FieldKind::Int, 0)
            .build()
            .unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn parse_set_reads_json() {
        let (field, value) = parse_set(&dog(), &ModelRegistry::new(), "age=4").unwrap();
        assert_eq!(field, "age");
        assert_eq!(value, Value::Int(4));
    }

    #[test]
    fn parse_set_falls_back_to_string() {
        let (_, value) = parse_set(&dog(), &ModelRegistry::new(), "name=Rex").unwrap();
        assert_eq!(value, Value::from("Rex"));
        let (_, value) = parse_set(&dog(), &ModelRegistry::new(), "name=\"4\"").unwrap();
        assert_eq!(value, Value::from("4"));
    }

    #[test]
    fn parse_set_requires_equals() {
        assert!(parse_set(&dog(), &ModelRegistry::new(), "name").is_err());
    }
}

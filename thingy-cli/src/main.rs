//! Command-line interface for thingy
//! Inspect, reformat, query and convert ConfigThingy configuration files, and move them
//! through the XML bridge.
//!
//! Usage:
//!   thingy tokens `<path>` [--json]                         - Raw token stream, includes expanded
//!   thingy tree `<path>` [--format treeviz|json]            - Parsed tree
//!   thingy format `<path>` [--quote single|double] [--compact] [--escape-all]
//!   thingy query `<path>` `<name>` [--max-level N] [--parents]
//!   thingy convert `<path>` --to `<format>` [--from `<format>`]
//!   thingy to-xml `<path>`                                  - One <file> per source
//!   thingy from-xml `<xml>` [--flatten | --write]           - Regenerate the conf files
//!   thingy formats                                          - List available formats
//!
//! Global options: --config `<toml>` layers settings over the built-in defaults,
//! --log-level sets the tracing filter (RUST_LOG wins when set).

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fs;
use thingy_babel::dom::Element;
use thingy_babel::formats::{ConfFormat, TreevizFormat, XmlFormat};
use thingy_babel::{ConfGenerator, FormatRegistry, XmlGenerator};
use thingy_config::{Loader, ThingyConfig};
use thingy_parser::thingy::formats::{to_conf_string, Layout};
use thingy_parser::thingy::{ConfLoader, Quote};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Path to the configuration file")
        .required(true)
        .index(1)
}

fn build_cli() -> Command {
    Command::new("thingy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting and converting ConfigThingy configuration files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML settings file layered over the defaults"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Tracing filter, e.g. 'debug' or 'thingy_parser=trace'"),
        )
        .subcommand(
            Command::new("tokens")
                .about("Print the token stream, includes expanded")
                .arg(path_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Print the parsed tree")
                .arg(path_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["treeviz", "json"])
                        .default_value("treeviz"),
                ),
        )
        .subcommand(
            Command::new("format")
                .about("Rewrite a configuration in canonical layout, includes expanded")
                .arg(path_arg())
                .arg(
                    Arg::new("quote")
                        .long("quote")
                        .short('q')
                        .value_parser(["single", "double"])
                        .help("Delimiter for string literals"),
                )
                .arg(
                    Arg::new("compact")
                        .long("compact")
                        .help("Put everything on one line")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("escape-all")
                        .long("escape-all")
                        .help("Escape every character that is not a letter or digit")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("query")
                .about("Print every node with the given name")
                .arg(path_arg())
                .arg(Arg::new("name").required(true).index(2))
                .arg(
                    Arg::new("max-level")
                        .long("max-level")
                        .value_parser(clap::value_parser!(usize))
                        .help("Only search this many levels deep"),
                )
                .arg(
                    Arg::new("parents")
                        .long("parents")
                        .help("Print the parents of the matches instead")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between registered formats (conf input resolves its includes)")
                .arg(path_arg())
                .arg(Arg::new("from").long("from").default_value("conf"))
                .arg(Arg::new("to").long("to").required(true)),
        )
        .subcommand(
            Command::new("to-xml")
                .about("Generate the XML view of a configuration and its includes")
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("from-xml")
                .about("Regenerate conf files from an XML view")
                .arg(
                    Arg::new("path")
                        .help("Path to the XML document")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("flatten")
                        .long("flatten")
                        .help("Print the first file with all includes inlined")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .help("Write every file back to its location")
                        .conflicts_with("flatten")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("formats").about("List available formats"))
}

fn main() {
    let matches = build_cli().get_matches();
    init_logging(&matches);
    if let Err(e) = run(&matches) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(matches: &ArgMatches) {
    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<ThingyConfig> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        debug!(path = %path, "layering settings file");
        loader = loader.with_file(path);
    }
    loader.build().context("Failed to load settings")
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    match matches.subcommand() {
        Some(("tokens", sub)) => handle_tokens_command(sub, &config),
        Some(("tree", sub)) => handle_tree_command(sub, &config),
        Some(("format", sub)) => handle_format_command(sub, &config),
        Some(("query", sub)) => handle_query_command(sub, &config),
        Some(("convert", sub)) => handle_convert_command(sub, &config),
        Some(("to-xml", sub)) => handle_to_xml_command(sub, &config),
        Some(("from-xml", sub)) => handle_from_xml_command(sub),
        Some(("formats", _)) => {
            handle_formats_command(&config);
            Ok(())
        }
        Some((other, _)) => anyhow::bail!("Unknown command '{other}'"),
        None => anyhow::bail!("No command given"),
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or_default()
}

fn conf_loader(matches: &ArgMatches, config: &ThingyConfig) -> Result<ConfLoader> {
    let path = required(matches, "path");
    let loader = ConfLoader::from_path(path).with_context(|| format!("Cannot open {path}"))?;
    Ok(loader
        .with_max_include_depth(config.scanner.max_include_depth)
        .with_max_nesting(config.scanner.max_nesting))
}

fn registry(config: &ThingyConfig) -> FormatRegistry {
    let mut registry = FormatRegistry::new();
    registry.register(ConfFormat::with_options(config.serializer.options()));
    registry.register(XmlFormat::with_indent(config.xml.indent));
    registry.register(TreevizFormat);
    registry
}

fn handle_tokens_command(matches: &ArgMatches, config: &ThingyConfig) -> Result<()> {
    let tokens = conf_loader(matches, config)?
        .tokenize()
        .context("Scanning failed")?;
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for (token, position) in tokens {
            println!("{position}\t{token}");
        }
    }
    Ok(())
}

fn handle_tree_command(matches: &ArgMatches, config: &ThingyConfig) -> Result<()> {
    let root = conf_loader(matches, config)?.parse()?;
    match required(matches, "format") {
        "json" => println!("{}", serde_json::to_string_pretty(&root)?),
        _ => print!("{}", registry(config).serialize(&root, "treeviz")?),
    }
    Ok(())
}

fn handle_format_command(matches: &ArgMatches, config: &ThingyConfig) -> Result<()> {
    let root = conf_loader(matches, config)?.parse()?;
    let mut options = config.serializer.options();
    match matches.get_one::<String>("quote").map(String::as_str) {
        Some("single") => options.quote = Quote::Single,
        Some("double") => options.quote = Quote::Double,
        _ => {}
    }
    if matches.get_flag("compact") {
        options.layout = Layout::Compact;
    }
    if matches.get_flag("escape-all") {
        options.escape_all = true;
    }
    print!("{}", to_conf_string(&root, &options));
    Ok(())
}

fn handle_query_command(matches: &ArgMatches, config: &ThingyConfig) -> Result<()> {
    let root = conf_loader(matches, config)?.parse()?;
    let name = required(matches, "name");
    let results = if matches.get_flag("parents") {
        root.query_by_child(name)
    } else {
        match matches.get_one::<usize>("max-level") {
            Some(&max_level) => root.query_within(name, max_level),
            None => root.query(name),
        }
    };
    debug!(name, matches = results.count(), "query");
    print!("{}", to_conf_string(&results, &config.serializer.options()));
    Ok(())
}

fn handle_convert_command(matches: &ArgMatches, config: &ThingyConfig) -> Result<()> {
    let from = required(matches, "from");
    let to = required(matches, "to");
    let registry = registry(config);
    let output = if from == "conf" {
        // read from the file so relative includes resolve against it
        let root = conf_loader(matches, config)?.parse()?;
        registry.serialize(&root, to)?
    } else {
        let path = required(matches, "path");
        let source = fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
        registry.convert(&source, from, to)?
    };
    print!("{output}");
    Ok(())
}

fn handle_to_xml_command(matches: &ArgMatches, config: &ThingyConfig) -> Result<()> {
    let loader = conf_loader(matches, config)?;
    let document = XmlGenerator::new(loader.scanner()).generate()?;
    print!("{}", document.to_xml_string(config.xml.indent)?);
    Ok(())
}

fn handle_from_xml_command(matches: &ArgMatches) -> Result<()> {
    let path = required(matches, "path");
    let xml = fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    let document = Element::parse(&xml).with_context(|| format!("Cannot parse {path}"))?;
    let generator = ConfGenerator::new(&document)?;
    if matches.get_flag("write") {
        for written in generator.write_files()? {
            println!("wrote {}", written.display());
        }
    } else if matches.get_flag("flatten") {
        print!("{}", generator.generate_conf()?);
    } else {
        for (src, text) in generator.generate_conf_map()? {
            println!("==> {src} <==");
            print!("{text}");
        }
    }
    Ok(())
}

fn handle_formats_command(config: &ThingyConfig) {
    let registry = registry(config);
    println!("Available formats:\n");
    for name in registry.list_formats() {
        if let Ok(format) = registry.get(&name) {
            let modes = match (format.supports_parsing(), format.supports_serialization()) {
                (true, true) => "parse, serialize",
                (true, false) => "parse",
                _ => "serialize",
            };
            println!("  {name} ({modes})");
            println!("    {}", format.description());
        }
    }
}

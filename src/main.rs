//! Command-line interface for xsdpile

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use xsdpile::{CatalogResolver, NamespaceKinds, PileOptions, PrefixMap, SchemaPileBuilder};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsdpile")]
#[command(author, version, about = "Schema pile and XML catalog resolution tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a schema pile and list its namespaces
    Resolve {
        /// Schema files, catalog files and namespace URIs
        #[arg(value_name = "ARG", required = true)]
        args: Vec<String>,

        /// Also load declared namespaces the catalog maps locally
        #[arg(long)]
        follow_declarations: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Look up URIs in a catalog chain
    Lookup {
        /// Catalog file
        #[arg(short, long, value_name = "CATALOG")]
        catalog: Vec<String>,

        /// URIs to resolve
        #[arg(value_name = "URI", required = true)]
        uris: Vec<String>,

        /// Resolve as system identifiers instead of namespace URIs
        #[arg(short, long)]
        system: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            args,
            follow_declarations,
            json,
        } => cmd_resolve(args, follow_declarations, json),
        Commands::Lookup { catalog, uris, system } => cmd_lookup(catalog, uris, system),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_resolve(args: Vec<String>, follow_declarations: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let options = PileOptions {
        follow_namespace_declarations: follow_declarations,
        ..PileOptions::default()
    };
    let pile = SchemaPileBuilder::new().options(options).build(&args)?;

    let mut kinds = NamespaceKinds::new();
    pile.classify(&mut kinds);

    if json {
        let report = pile.to_report(&kinds);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut prefixes = PrefixMap::new();
    let assigned = pile.assign_prefixes(&mut prefixes);

    println!("xsdpile v{}", xsdpile::VERSION);
    println!();
    println!("Pile root: {}", pile.pile_root().unwrap_or("-"));
    println!("Catalogs: {}", pile.resolver().all_catalogs().len());
    println!("Namespaces: {}", assigned.len());
    println!();
    for (ns, prefix) in &assigned {
        let doc = pile.schema_document(ns).map(|d| d.uri()).unwrap_or("-");
        println!("  {:<12} {:<10} {}", prefix, kinds.kind(ns).to_string(), ns);
        println!("  {:<12} {:<10} {}", "", "", doc);
    }

    if !pile.messages().is_empty() {
        println!();
        println!("Diagnostics:");
        for msg in pile.messages() {
            println!("  - {}", msg);
        }
    }
    if !pile.validator_messages().is_empty() {
        println!();
        println!("Validation:");
        for msg in pile.validator_messages() {
            println!("  - {}", msg);
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_lookup(catalogs: Vec<String>, uris: Vec<String>, system: bool) -> Result<(), Box<dyn std::error::Error>> {
    if catalogs.is_empty() {
        return Err("at least one --catalog is required".into());
    }
    let resolver = CatalogResolver::new(&catalogs);
    for msg in resolver.all_messages() {
        eprintln!("warning: {}", msg);
    }
    for uri in &uris {
        let outcome = if system {
            resolver.resolve_system(uri)
        } else {
            resolver.resolve_uri(uri)
        };
        println!("{} -> {}", uri, outcome);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}

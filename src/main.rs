use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lineage_types::{Monarch, Person};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lineage::config::Settings;
use lineage::resolve::NameResolver;
use lineage::store::{JsonStore, LineageStore};
use lineage::{generation, migrate, reign, search, stats, tree, validate};

#[derive(Parser)]
#[command(
    name = "lineage",
    about = "Family lineage and reign reconciliation"
)]
struct Cli {
    /// Snapshot directory (monarchs.json + persons.json or persons/)
    #[arg(long, global = true, env = "LINEAGE_DATA")]
    data: Option<PathBuf>,
    /// Config file; defaults to ./lineage.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Evaluate living persons as of this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the family tree
    Tree {
        /// Emit the tree as JSON instead of box drawing
        #[arg(long)]
        json: bool,
        /// Only show the branch below this external id
        #[arg(long)]
        from: Option<String>,
    },
    /// Per-generation statistics
    Generations,
    /// Monarchs who reigned during a person's life
    Reigns { external_id: String },
    /// Monarchs plausible for a lifespan, e.g. `plausible --born 1545 --died 1625`
    Plausible {
        #[arg(long)]
        born: i32,
        #[arg(long)]
        died: Option<i32>,
    },
    /// Compare stored monarch ids with the reigns overlapping each life
    Audit,
    /// Convert legacy monarch names to ids (dry run unless --apply)
    Migrate {
        #[arg(long)]
        apply: bool,
    },
    /// Check monarch id references and biographical consistency
    Validate,
    /// Resolve legacy monarch names against the registry
    Resolve { names: Vec<String> },
    /// Search persons by name
    Search {
        query: Vec<String>,
        /// Only persons linked to this monarch id
        #[arg(long)]
        monarch: Option<String>,
    },
    /// Direct children of a person
    Children { external_id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lineage=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        settings.data_dir = data;
    }
    if cli.as_of.is_some() {
        settings.as_of = cli.as_of;
    }

    let mut store = JsonStore::open(&settings.data_dir)
        .with_context(|| format!("loading snapshot from {}", settings.data_dir.display()))?;
    let today = settings.evaluation_date();

    match cli.command {
        Command::Tree { json, from } => run_tree(&store.persons()?, json, from.as_deref()),
        Command::Generations => print_json(&stats::stats_by_generation(&store.persons()?)),
        Command::Reigns { external_id } => {
            run_reigns(&store.persons()?, &store.monarchs()?, &external_id, today)
        }
        Command::Plausible { born, died } => {
            let monarchs = store.monarchs()?;
            let picked = reign::plausible_monarchs(Some(born), died, &monarchs, today);
            print_json(&picked)
        }
        Command::Audit => print_json(&reign::audit_monarch_ids(
            &store.persons()?,
            &store.monarchs()?,
            today,
        )),
        Command::Migrate { apply } => {
            let run = migrate::run_migration(&mut store, !apply, today)?;
            print_json(&run)
        }
        Command::Validate => run_validate(&store, settings.age_tolerance),
        Command::Resolve { names } => run_resolve(&store.monarchs()?, &names),
        Command::Search { query, monarch } => {
            let people = store.persons()?;
            let mut hits = if query.is_empty() {
                people.iter().collect()
            } else {
                search::search_by_name(&people, &query.join(" "))
            };
            if let Some(monarch) = monarch {
                let under = search::people_under_monarch(&people, &monarch);
                hits.retain(|p| under.iter().any(|u| u.external_id == p.external_id));
            }
            print_json(&hits)
        }
        Command::Children { external_id } => {
            let people = store.persons()?;
            print_json(&search::children_of(&people, &external_id))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  OUTPUT HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn print_json<T: serde::Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data).context("JSON serialization failed")?;
    println!("{json}");
    Ok(())
}

fn years(p: &Person) -> String {
    let born = p.born.map_or("?".to_string(), |b| b.to_string());
    let died = if p.is_living() {
        String::new()
    } else {
        p.died.map_or("?".to_string(), |d| d.to_string())
    };
    format!("{born}–{died}")
}

// ═══════════════════════════════════════════════════════════════════════
//  TREE MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_tree(people: &[Person], json: bool, from: Option<&str>) -> anyhow::Result<()> {
    let Some(family) = tree::build_tree(people) else {
        bail!("no family tree: the snapshot has no root record");
    };

    let root = match from {
        Some(id) => match family.root.find(id) {
            Some(node) => node,
            None => bail!("{id} is not part of the family tree"),
        },
        None => &family.root,
    };

    if json {
        return match from {
            Some(_) => print_json(root),
            None => print_json(&family),
        };
    }

    println!("{} [{}] ({})", root.person.name, root.person.external_id, years(&root.person));
    render_children(&root.children, "");

    if !family.orphans.is_empty() {
        println!("\nDetached records (father not found):");
        for p in &family.orphans {
            println!("  {} [{}] father={:?}", p.name, p.external_id, p.father);
        }
    }
    info!(
        nodes = root.node_count(),
        generations = root.depth(),
        orphans = family.orphans.len(),
        "tree built"
    );
    Ok(())
}

/// Recursively render children with box-drawing connectors.
///
/// `prefix` is the accumulated line-drawing prefix for the current depth.
fn render_children(children: &[tree::TreeNode], prefix: &str) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let connector = if is_last { "└─ " } else { "├─ " };
        let continuation = if is_last { "   " } else { "│  " };

        let marker = if child.person.notable { " ★" } else { "" };
        println!(
            "{}{}{} [{}] ({}){}",
            prefix,
            connector,
            child.person.name,
            child.person.external_id,
            years(&child.person),
            marker
        );

        let sub_prefix = format!("{prefix}{continuation}");
        render_children(&child.children, &sub_prefix);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  REIGNS MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_reigns(
    people: &[Person],
    monarchs: &[Monarch],
    external_id: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let Some(person) = search::find_by_external_id(people, external_id) else {
        bail!("no person with external id {external_id}");
    };
    if person.born.is_none() {
        warn!(external_id, "birth year unknown, no reigns can be matched");
    }

    #[derive(serde::Serialize)]
    struct ReignsResult<'a> {
        person: &'a Person,
        generation: u32,
        monarchs: Vec<&'a Monarch>,
    }

    print_json(&ReignsResult {
        person,
        generation: generation::generation_of(&person.external_id),
        monarchs: reign::monarchs_for_person(person, monarchs, today),
    })
}

// ═══════════════════════════════════════════════════════════════════════
//  RESOLVE MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_resolve(monarchs: &[Monarch], names: &[String]) -> anyhow::Result<()> {
    let resolver = NameResolver::new(monarchs);

    #[derive(serde::Serialize)]
    struct Resolved<'a> {
        name: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        resolution: Option<lineage::resolve::Resolution>,
    }

    let results: Vec<Resolved> = names
        .iter()
        .map(|name| Resolved {
            name,
            resolution: resolver.resolve(name),
        })
        .collect();
    print_json(&results)
}

// ═══════════════════════════════════════════════════════════════════════
//  VALIDATE MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_validate(store: &JsonStore, age_tolerance: i32) -> anyhow::Result<()> {
    let people = store.persons()?;
    let monarchs = store.monarchs()?;

    let references = migrate::validate_monarch_id_references(&people, &monarchs);
    let biography = validate::check_biography(&people, age_tolerance);

    #[derive(serde::Serialize)]
    struct ValidateResult {
        references: migrate::ReferenceReport,
        biography: validate::BiographyReport,
    }

    let clean = references.is_clean() && biography.issues.is_empty();
    print_json(&ValidateResult {
        references,
        biography,
    })?;
    if !clean {
        std::process::exit(1);
    }
    Ok(())
}

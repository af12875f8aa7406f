//! ISC CLI
//!
//! Operator commands over a JSON site dump: rebuild the indexes, list
//! relations, find images without attribution, check index consistency.
//!
//! ```text
//! isc --site site.json reindex
//! isc --site site.json relations --direction images --json
//! isc --site site.json --config isc.toml missing
//! ```

pub mod report;
pub mod site;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use isc_core::{ImageSourceControl, IscOptions, MemorySite, ReindexSummary};
use isc_meta::{ContentId, MemoryMetaStore};
use report::{ImageRelation, PostRelation, Report};
use site::SiteDump;
use std::io::Write;
use std::path::{Path, PathBuf};

type Control = ImageSourceControl<MemorySite, MemoryMetaStore>;

/// Command-line definition
#[must_use]
pub fn build_cli() -> Command {
    Command::new("isc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Image Source Control - image attribution and post/image indexes")
        .subcommand_required(true)
        .arg(
            Arg::new("site")
                .long("site")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON site dump to operate on"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML options file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log output format"),
        )
        .subcommand(
            Command::new("reindex")
                .about("Run the save hook for every post and write the dump back")
                .arg(
                    Arg::new("post")
                        .long("post")
                        .value_parser(value_parser!(ContentId))
                        .help("Only reindex this post"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Do not write the dump back"),
                ),
        )
        .subcommand(Command::new("missing").about("List images without a source"))
        .subcommand(
            Command::new("relations")
                .about("List indexed relations")
                .arg(
                    Arg::new("direction")
                        .long("direction")
                        .default_value("posts")
                        .value_parser(["posts", "images"])
                        .help("posts: images per post; images: posts per image"),
                ),
        )
        .subcommand(Command::new("clear-index").about("Delete both indexes"))
        .subcommand(Command::new("verify").about("Find relations recorded in only one index"))
        .subcommand(
            Command::new("init-fields").about("Initialize empty attribution fields on every image"),
        )
}

/// Run the parsed command, printing its report to `out`
///
/// Returns the report so callers can derive an exit status.
///
/// # Errors
/// Returns error if the dump or options cannot be loaded, the command
/// fails, or the dump cannot be written back
pub fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<Report> {
    let site_path = matches
        .get_one::<PathBuf>("site")
        .context("--site <file> is required")?;
    let options = match matches.get_one::<PathBuf>("config") {
        Some(path) => IscOptions::load(path)
            .with_context(|| format!("failed to load options from {}", path.display()))?,
        None => IscOptions::default(),
    };
    let dump = SiteDump::load(site_path)?;
    let isc = ImageSourceControl::new(dump.site, dump.meta, options);

    let (report, write_back) = match matches.subcommand() {
        Some(("reindex", args)) => {
            let summary = match args.get_one::<ContentId>("post") {
                Some(content) => {
                    let mut summary = ReindexSummary::default();
                    summary.record(*content, &isc.reindex(*content)?);
                    summary
                }
                None => isc.reindex_all(),
            };
            (Report::Reindex(summary), !args.get_flag("dry-run"))
        }
        Some(("missing", _)) => (
            Report::Missing {
                missing: isc.missing_sources(),
                unused: isc.unused_assets(),
            },
            false,
        ),
        Some(("relations", args)) => {
            let direction = args.get_one::<String>("direction").map_or("posts", String::as_str);
            (relations(&isc, direction)?, false)
        }
        Some(("clear-index", _)) => (
            Report::Cleared {
                removed: isc.clear_index()?,
            },
            true,
        ),
        Some(("verify", _)) => (Report::Verify(isc.verify_index()?), false),
        Some(("init-fields", _)) => (
            Report::InitFields {
                assets: isc.add_meta_values_to_attachments()?,
            },
            true,
        ),
        Some((other, _)) => anyhow::bail!("unknown command {other}"),
        None => anyhow::bail!("no command given"),
    };

    if write_back {
        save(isc, site_path)?;
    }
    report.write_to(out, matches.get_flag("json"))?;
    Ok(report)
}

fn relations(isc: &Control, direction: &str) -> Result<Report> {
    Ok(if direction == "images" {
        Report::ImageRelations(
            isc.image_post_relations()?
                .into_iter()
                .map(|(image, contents)| ImageRelation { image, contents })
                .collect(),
        )
    } else {
        Report::PostRelations(
            isc.post_image_relations()?
                .into_iter()
                .map(|(content, images)| PostRelation { content, images })
                .collect(),
        )
    })
}

fn save(isc: Control, path: &Path) -> Result<()> {
    let (site, meta) = isc.into_parts();
    SiteDump { site, meta }.save(path)?;
    tracing::info!("Wrote site dump {}", path.display());
    Ok(())
}

//! connlex CLI
//!
//! - `list`: the lexicon directory listing, converting stale lexicons when the
//!   deployment auto-converts
//! - `convert`: one XML lexicon to its JSON artifact
//! - `get`: the raw bytes of a served artifact
//! - `search`: faceted filtering over normalized lexicons

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use connlex_filter::{CancelToken, FilterModes, FilterScan, Selection, DEFAULT_BATCH};
use connlex_lexicon::Entry;
use connlex_store::{
    convert_to_artifact, read_served_file, ConversionOrchestrator, LexiconCatalog, Settings, StoreError,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "connlex")]
#[command(author, version, about = "Connective lexicon conversion and search")]
struct Cli {
    /// Deployment settings file
    #[arg(long, global = true, default_value = "settings.json")]
    settings: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the lexicon listing (and conversion results) as JSON.
    List {
        /// Reconvert every lexicon; honored only with `allowForceReparse`.
        #[arg(long)]
        force: bool,
    },

    /// Convert one XML lexicon into markup-safe JSON.
    Convert {
        /// Input XML file
        input: PathBuf,
        /// Output JSON file (defaults to the input with a `.json` extension)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },

    /// Write a served `.json` / `.meta` file to stdout.
    Get {
        /// File name; `.json` is appended unless it ends in `.json` or `.meta`
        name: String,
    },

    /// Filter normalized lexicon entries.
    Search(SearchArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Lexicon ids to search (all listed lexicons when omitted)
    #[arg(long = "lexicon")]
    lexicons: Vec<String>,
    /// Filter text (case-sensitive substring)
    #[arg(long)]
    text: Option<String>,
    /// Text modes: `word`, `synonym`, `example` or a `_`-joined combination
    #[arg(long, default_value = "word")]
    mode: FilterModes,
    /// Canonical POS facets, e.g. `cco`
    #[arg(long)]
    pos: Vec<String>,
    /// Sense facets, e.g. `contingency:cause:reason` or `temporal:all`
    #[arg(long)]
    sense: Vec<String>,
    /// Entries evaluated per batch
    #[arg(long, default_value_t = DEFAULT_BATCH)]
    batch: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit<'a> {
    lex_id: &'a str,
    lex_name: &'a str,
    color: &'a str,
    word: &'a str,
}

impl<'a> From<&'a Entry> for SearchHit<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            lex_id: &entry.lex_id,
            lex_name: &entry.lex_name,
            color: &entry.color,
            word: &entry.word,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::List { force } => cmd_list(&cli.settings, force),
        Commands::Convert { input, out, pretty } => cmd_convert(&input, out, pretty),
        Commands::Get { name } => cmd_get(&cli.settings, &name),
        Commands::Search(args) => cmd_search(&cli.settings, args),
    };
    if let Err(err) = &result {
        eprintln!("{} {err:#}", "error:".red().bold());
    }
    result
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load(path).with_context(|| format!("loading settings from {}", path.display()))
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn cmd_list(settings_path: &Path, force: bool) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let pretty = settings.pretty_print_json;
    let orchestrator = ConversionOrchestrator::new(settings);
    let results = orchestrator.list(force)?;

    let failed = results.iter().filter(|r| r.success == Some(false)).count();
    if failed > 0 {
        eprintln!("{} {failed} lexicon(s) failed to convert", "warning:".yellow().bold());
    }
    println!("{}", to_json(&results, pretty)?);
    Ok(())
}

fn cmd_convert(input: &Path, out: Option<PathBuf>, pretty: bool) -> Result<()> {
    let out = out.unwrap_or_else(|| input.with_extension("json"));
    match convert_to_artifact(input, &out, pretty) {
        Ok(()) => {
            eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
            Ok(())
        }
        Err(err @ StoreError::Convert(_)) => {
            for diagnostic in err.diagnostics() {
                eprintln!("{}:{}", input.display(), diagnostic);
            }
            bail!("{} was not converted: {err}", input.display())
        }
        Err(err) => Err(err).with_context(|| format!("converting {}", input.display())),
    }
}

fn cmd_get(settings_path: &Path, name: &str) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let bytes = read_served_file(&settings.xml_directory, name)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}

/// `contingency:cause:reason` → `sense.contingency.cause.reason`.
fn sense_toggle_path(sense: &str) -> String {
    format!("sense.{}", sense.to_lowercase().replace('-', "_").replace(':', "."))
}

fn build_selection(args: &SearchArgs) -> Result<Selection> {
    let mut selection = Selection::default().with_text(args.text.clone().unwrap_or_default(), args.mode);
    for pos in &args.pos {
        selection.toggle(&format!("pos.{pos}"), true)?;
    }
    for sense in &args.sense {
        selection.toggle(&sense_toggle_path(sense), true)?;
    }
    Ok(selection)
}

fn cmd_search(settings_path: &Path, args: SearchArgs) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let selection = build_selection(&args)?;

    let orchestrator = ConversionOrchestrator::new(settings);
    let files: Vec<_> = orchestrator
        .list(false)?
        .into_iter()
        .map(|result| result.file)
        .collect();
    let requested: Vec<String> = if args.lexicons.is_empty() {
        files
            .iter()
            .filter(|file| file.has_json)
            .map(|file| file.lex_id.clone())
            .collect()
    } else {
        args.lexicons.clone()
    };

    let mut catalog = LexiconCatalog::open(orchestrator.settings(), files)?;
    for lex_id in &requested {
        catalog
            .load(lex_id)
            .with_context(|| format!("loading lexicon `{lex_id}`"))?;
    }

    let lexicons = catalog.loaded();
    let scan = FilterScan::new(&lexicons, &selection, CancelToken::new());
    debug!(entries = scan.total(), "scanning");
    let Some(results) = scan.run(args.batch.max(1)) else {
        bail!("search was cancelled");
    };

    let mut stdout = io::stdout().lock();
    for entry in &results.hits {
        writeln!(stdout, "{}", serde_json::to_string(&SearchHit::from(*entry))?)?;
    }
    for (lex_name, count) in &results.counts {
        eprintln!("{} {count}", format!("{lex_name}:").bold());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sense_arguments_become_toggle_paths() {
        assert_eq!(
            sense_toggle_path("Contingency:Negative-condition:Arg1-as-negcond"),
            "sense.contingency.negative_condition.arg1_as_negcond"
        );
        assert_eq!(sense_toggle_path("temporal:all"), "sense.temporal.all");
    }

    #[test]
    fn search_arguments_build_a_selection() {
        let cli = Cli::parse_from([
            "connlex", "search", "--text", "wohl", "--mode", "word_example", "--pos", "cco", "--sense",
            "contingency:cause:reason",
        ]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        let selection = build_selection(&args).unwrap();
        assert_eq!(selection.text.text, "wohl");
        assert!(selection.text.modes.example);
        assert_eq!(selection.pos.leaf("cco"), Some(true));
        assert!(!selection.pos.all);
        assert!(!selection.sense.all);

        assert!(Cli::try_parse_from(["connlex", "search", "--mode", "title"]).is_err());
    }
}

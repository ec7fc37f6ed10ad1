use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use recipedb_core::config::{Config, PrepSettings};
use recipedb_core::DataPreparation;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: recipedb [--config FILE] <prepare|stats|show> [DIR] [args...]\n  prepare [DIR] [--out FILE]  load, enrich and split recipes; optionally write sections as JSONL\n  stats [DIR]                 category and difficulty distribution\n  show [DIR] <DISH>           print the sections of one dish in order";

struct Args {
    cmd: String,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    positional: Vec<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut config = None;
    let mut out = None;
    let mut rest = Vec::new();
    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" | "-c" => config = Some(PathBuf::from(it.next().context("--config requires a path")?)),
            "--out" | "-o" => out = Some(PathBuf::from(it.next().context("--out requires a path")?)),
            "--help" | "-h" => { println!("{USAGE}"); std::process::exit(0); }
            _ if arg.starts_with('-') => bail!("unknown flag {arg}\n{USAGE}"),
            _ => rest.push(arg),
        }
    }
    if rest.is_empty() { bail!("{USAGE}"); }
    let cmd = rest.remove(0);
    Ok(Args { cmd, config, out, positional: rest })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<PrepSettings> {
    let config = match path {
        Some(p) => Config::from_file(p)?,
        None => Config::load()?,
    };
    Ok(config.prep_settings()?)
}

fn prepare(settings: &PrepSettings, dir: Option<&String>) -> anyhow::Result<DataPreparation> {
    let cwd = env::current_dir()?;
    let data_dir = match dir {
        Some(d) => recipedb_core::config::resolve_with_base(&cwd, d),
        None => settings.data_dir(&cwd),
    };
    let mut prep = DataPreparation::new(settings);
    let report = prep.load_documents(&data_dir).with_context(|| format!("loading recipes from {}", data_dir.display()))?;
    for skipped in &report.skipped {
        eprintln!("⚠️  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    if report.loaded == 0 {
        bail!("no recipe files found under {}", data_dir.display());
    }
    prep.chunk_documents()?;
    Ok(prep)
}

fn write_sections(prep: &DataPreparation, out: &Path) -> anyhow::Result<()> {
    let file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    for section in prep.sections() {
        serde_json::to_writer(&mut writer, section)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = parse_args()?;
    let settings = load_settings(args.config.as_deref())?;

    match args.cmd.as_str() {
        "prepare" => {
            let prep = prepare(&settings, args.positional.first())?;
            let stats = prep.statistics();
            println!("✅ Prepared {} documents into {} sections (avg {:.0} chars)", stats.documents, stats.sections, stats.avg_section_size);
            if let Some(out) = &args.out {
                write_sections(&prep, out)?;
                println!("📄 Wrote sections to {}", out.display());
            }
        }
        "stats" => {
            let prep = prepare(&settings, args.positional.first())?;
            let stats = prep.statistics();
            println!("📊 {} documents, {} sections", stats.documents, stats.sections);
            println!("\nCategories:");
            for (category, count) in &stats.categories { println!("  {:<12} {}", category, count); }
            println!("\nDifficulty:");
            for (difficulty, count) in &stats.difficulties { println!("  {:<12} {}", difficulty, count); }
        }
        "show" => {
            let (dir, dish) = match args.positional.as_slice() {
                [dish] => (None, dish),
                [dir, dish] => (Some(dir), dish),
                _ => bail!("{USAGE}"),
            };
            let prep = prepare(&settings, dir)?;
            let Some(doc) = prep.documents().iter().find(|d| d.metadata.dish_name.as_deref() == Some(dish.as_str())) else {
                bail!("no recipe named {dish}");
            };
            let category = doc.metadata.category.as_deref().unwrap_or_default();
            let difficulty = doc.metadata.difficulty.map(|d| d.label()).unwrap_or_default();
            println!("{} [{}] {} ({})", dish, category, difficulty, doc.metadata.source.display());
            for section in prep.sections_of(&doc.id) {
                println!("\n--- section {} ({} chars) ---\n{}", section.position, section.size, section.content);
            }
        }
        other => bail!("unknown command: {other}\n{USAGE}"),
    }
    Ok(())
}

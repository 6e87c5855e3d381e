use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use refl_core::{binary, load_json, merge, save_json, Database, PrimitiveKind};

#[derive(Parser)]
#[command(name = "refl", about = "Reflection metadata database: merge and inspect")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(ValueEnum, Clone, Copy)]
enum CliKind {
    Namespace,
    Type,
    Class,
    Enum,
    EnumConstant,
    Field,
    Function,
    Method,
    Template,
    TemplateType,
}

impl From<CliKind> for PrimitiveKind {
    fn from(k: CliKind) -> Self {
        match k {
            CliKind::Namespace => PrimitiveKind::Namespace,
            CliKind::Type => PrimitiveKind::Type,
            CliKind::Class => PrimitiveKind::Class,
            CliKind::Enum => PrimitiveKind::Enum,
            CliKind::EnumConstant => PrimitiveKind::EnumConstant,
            CliKind::Field => PrimitiveKind::Field,
            CliKind::Function => PrimitiveKind::Function,
            CliKind::Method => PrimitiveKind::Method,
            CliKind::Template => PrimitiveKind::Template,
            CliKind::TemplateType => PrimitiveKind::TemplateType,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Write an empty database seeded with the scalar base types.
    Init {
        #[arg(long)]
        out: PathBuf,
        /// Label of the scanned unit
        #[arg(long)]
        source: Option<String>,
    },

    /// Merge per-unit databases into one.
    Merge {
        #[arg(long)]
        out: PathBuf,
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Write the result even when definitions conflict
        #[arg(long, default_value_t = false)]
        allow_conflicts: bool,
    },

    Info {
        #[arg(long)]
        db: PathBuf,
    },

    Lookup {
        #[arg(long)]
        db: PathBuf,
        #[arg(long, value_enum)]
        kind: CliKind,
        #[arg(long)]
        name: String,
    },

    /// Print the serializer snapshot as JSON.
    Dump {
        #[arg(long)]
        db: PathBuf,
    },

    /// Check framing and checksum of a binary database.
    Verify {
        #[arg(long)]
        db: PathBuf,
    },
}

fn is_json(p: &Path) -> bool {
    p.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn load(p: &Path) -> Result<Database> {
    let db = if is_json(p) { load_json(p) } else { binary::read_file(p) };
    db.with_context(|| format!("loading {}", p.display()))
}

fn save(db: &Database, p: &Path) -> Result<()> {
    let r = if is_json(p) { save_json(db, p) } else { binary::write_file(db, p) };
    r.with_context(|| format!("writing {}", p.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Init { out, source } => {
            let mut db = Database::with_base_types()?;
            db.set_source(source);
            save(&db, &out)?;
            println!("init: {} ({} base types)", out.display(), db.len());
        }
        Cmd::Merge { out, inputs, allow_conflicts } => {
            let mut dbs = Vec::with_capacity(inputs.len());
            for p in &inputs {
                let mut db = load(p)?;
                if db.source().is_none() {
                    db.set_source(Some(p.display().to_string()));
                }
                dbs.push(db);
            }
            let refs: Vec<&Database> = dbs.iter().collect();
            let outcome = merge(&refs)?;
            for c in &outcome.conflicts {
                eprintln!("conflict: {c}");
            }
            if !outcome.is_clean() && !allow_conflicts {
                return Err(anyhow!("{} definition conflict(s); nothing written", outcome.conflicts.len()));
            }
            save(&outcome.database, &out)?;
            println!(
                "merge: {} inputs -> {} (primitives={}, conflicts={})",
                inputs.len(),
                out.display(),
                outcome.database.len(),
                outcome.conflicts.len()
            );
        }
        Cmd::Info { db } => {
            let d = load(&db)?;
            println!("source   : {}", d.source().unwrap_or("-"));
            println!("names    : {}", d.names().len());
            println!("base     : {}", d.has_base_types());
            for kc in d.stats() {
                if kc.count > 0 {
                    println!("{:<14} {}", kc.kind.label(), kc.count);
                }
            }
        }
        Cmd::Lookup { db, kind, name } => {
            let d = load(&db)?;
            let kind = PrimitiveKind::from(kind);
            let hits = d.lookup_text(kind, &name);
            if hits.is_empty() {
                println!("no {kind} named {name:?}");
            }
            for p in hits {
                let parent = &d.get_name_by_hash(p.parent).text;
                let uid = p
                    .unique_id()
                    .map(|u| format!(" uid={u:016x}"))
                    .unwrap_or_default();
                println!("{kind} {name} [{}] parent={:?} size={}{uid}", p.name, parent, p.size());
            }
        }
        Cmd::Dump { db } => {
            let d = load(&db)?;
            println!("{}", serde_json::to_string_pretty(&d.snapshot())?);
        }
        Cmd::Verify { db } => {
            let hdr = binary::verify_file(&db).with_context(|| format!("verifying {}", db.display()))?;
            println!(
                "verify: ok version={} names={} primitives={} payload={}B",
                hdr.version, hdr.names, hdr.primitives, hdr.payload_len
            );
        }
    }
    Ok(())
}

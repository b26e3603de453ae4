use clap::Parser;
use scandex::{
    DocStore,
    Error,
    IndexConfig,
    Result,
    cli::{Cli, Command, GetArgs, ListArgs},
    indexer,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SCANDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = IndexConfig::resolve(cli.overrides());

    match &cli.command {
        None | Some(Command::Index(_)) => {
            indexer::run(&config)?;
            println!("Index updated.");
        }
        Some(Command::Status(args)) => {
            cmd_status(&config, args.json)?;
        }
        Some(Command::Get(args)) => {
            cmd_get(&config, args)?;
        }
        Some(Command::List(args)) => {
            cmd_list(&config, args)?;
        }
        Some(Command::Completions(args)) => {
            args.generate();
        }
    }

    Ok(())
}

fn cmd_status(config: &IndexConfig, json: bool) -> Result<()> {
    let store = DocStore::open_existing(&config.docs_db())?;
    let documents = store.count()?;
    let failures = store
        .list()?
        .iter()
        .filter(|doc| doc.text.starts_with(scandex::extract::FAILURE_MARKER))
        .count();

    if json {
        let status = serde_json::json!({
            "source_dir": config.source_dir,
            "meta_dir": config.meta_dir,
            "store_dir": config.store_dir,
            "documents": documents,
            "extraction_failures": failures,
        });
        println!("{status}");
    } else {
        println!("Source directory: {}", config.source_dir.display());
        println!("Metadata directory: {}", config.meta_dir.display());
        println!("Store directory: {}", config.store_dir.display());
        println!("Documents: {documents}");
        println!("Extraction failures: {failures}");
    }
    Ok(())
}

fn cmd_get(config: &IndexConfig, args: &GetArgs) -> Result<()> {
    let store = DocStore::open_existing(&config.docs_db())?;
    let doc = store.get(&args.path)?.ok_or_else(|| {
        Error::NotFound {
            kind: "document",
            name: args.path.clone(),
        }
    })?;

    if args.json {
        let mut value = serde_json::to_value(&doc)?;
        if args.meta
            && let Some(object) = value.as_object_mut()
        {
            object.remove("text");
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let show = |label: &str, value: Option<&str>| {
        println!("{label}: {}", value.unwrap_or("-"));
    };
    println!("id: {}", doc.id);
    println!("path: {}", doc.path);
    show("title", doc.title.as_deref());
    show("course", doc.course.as_deref());
    show("term", doc.term.as_deref());
    show("lecture", doc.lecture.map(|n| n.to_string()).as_deref());
    show("tags", doc.tags.as_deref());
    println!("mtime: {}", doc.mtime);
    if !args.meta {
        println!();
        print!("{}", doc.text);
        if !doc.text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn cmd_list(config: &IndexConfig, args: &ListArgs) -> Result<()> {
    let glob = globset::Glob::new(&args.pattern)
        .map_err(|e| Error::Config(format!("invalid glob pattern: {e}")))?
        .compile_matcher();

    let store = DocStore::open_existing(&config.docs_db())?;
    let mut paths: Vec<String> = store
        .list()?
        .into_iter()
        .map(|doc| doc.path)
        .filter(|path| glob.is_match(path))
        .collect();
    paths.sort();

    if args.json {
        println!("{}", serde_json::to_string(&paths)?);
    } else if paths.is_empty() {
        println!("No documents match '{}'", args.pattern);
    } else {
        for path in &paths {
            println!("{path}");
        }
        println!("\n{} match(es)", paths.len());
    }
    Ok(())
}

use std::collections::HashMap;
use std::{env, path::Path, path::PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use recall_cache::LanceResultCache;
use recall_core::config::Config;
use recall_core::types::Document;
use recall_embed::select_provider;
use recall_store::{hash_content, EmbeddingStore};

fn summary_line(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.chars().take(160).collect())
}

fn doc_id_for(relative: &Path) -> String {
    relative
        .with_extension("")
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "-")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut force = false;
    let mut data_dir = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--force" | "-f" => force = true,
            _ if !args[i].starts_with('-') => data_dir = Some(PathBuf::from(&args[i])),
            _ => {}
        }
        i += 1;
    }
    let data_dir = data_dir.unwrap_or_else(|| {
        let dir: String = config
            .get("data.corpus_dir")
            .unwrap_or_else(|_| "./data/corpus".to_string());
        recall_core::config::expand_path(dir)
    });
    let store_dir: String = config
        .get("data.store_dir")
        .unwrap_or_else(|_| "./data/store".to_string());
    let cache_dir: String = config
        .get("data.cache_dir")
        .unwrap_or_else(|_| "./data/cache".to_string());

    println!("recall indexer\n==============");
    println!("Corpus directory: {}", data_dir.display());
    if force {
        println!("⚠️  Re-embedding everything (--force)");
    }

    let provider = select_provider(&config.embedding());
    println!("Embedding provider: {}", provider.model_id());
    let store = EmbeddingStore::open(&store_dir, provider).await?;

    // Current hashes drive change detection: unchanged documents are skipped.
    let known: HashMap<String, String> = store
        .documents()
        .await?
        .into_iter()
        .map(|d| (d.id, d.content_hash))
        .collect();

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(&data_dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == "txt" || ext == "md")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    if files.is_empty() {
        println!("No .txt/.md files found under {}.", data_dir.display());
        return Ok(());
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );

    let mut embedded = 0usize;
    let mut skipped = 0usize;
    for file_path in &files {
        let relative = file_path.strip_prefix(&data_dir).unwrap_or(file_path);
        let doc_id = doc_id_for(relative);
        let content = std::fs::read_to_string(file_path)?;
        let hash = hash_content(&content);

        if !force && known.get(&doc_id) == Some(&hash) {
            skipped += 1;
            pb.inc(1);
            continue;
        }

        store
            .upsert_document(&Document {
                id: doc_id.clone(),
                path: file_path.to_string_lossy().to_string(),
                content_hash: hash.clone(),
                summary: summary_line(&content),
            })
            .await?;
        store.regenerate_embedding(&doc_id, &content, &hash).await?;
        embedded += 1;
        pb.set_message(doc_id);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    if embedded > 0 {
        // Corpus changed: cached results are stale by definition.
        let cache = LanceResultCache::open(&cache_dir).await?;
        cache.invalidate_all().await?;
        println!("🧹 Result cache invalidated");
    }

    println!("\n✅ Indexing completed successfully!");
    println!(
        "📊 {} embedded, {} unchanged, {} total",
        embedded,
        skipped,
        files.len()
    );
    Ok(())
}

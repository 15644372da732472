use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use recall_cache::LanceResultCache;
use recall_core::config::Config;
use recall_core::traits::GraphAccessor;
use recall_core::types::ScoredMatch;
use recall_embed::select_provider;
use recall_engine::RetrievalEngine;
use recall_graph::{DisconnectedGraph, MemoryGraph};
use recall_store::EmbeddingStore;

fn print_matches(label: &str, matches: &[ScoredMatch]) {
    if matches.is_empty() {
        return;
    }
    println!("\n{label}:");
    for (i, m) in matches.iter().enumerate() {
        let strategies: Vec<String> = m
            .strategies
            .iter()
            .map(|s| format!("{s:?}").to_lowercase())
            .collect();
        println!(
            "  {}. score={:.3}  id={}  via=[{}]  path={}",
            i + 1,
            m.score,
            m.doc_id,
            strategies.join(","),
            m.path
        );
        if let Some(summary) = &m.summary {
            println!("     📝 {}", summary);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [max_results]", args[0]);
        eprintln!("Example: {} 'rust error handling' 5", args[0]);
        std::process::exit(1);
    }
    let query = &args[1];
    let max_results = args
        .get(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10);

    let config = Config::load()?;
    let store_dir: String = config
        .get("data.store_dir")
        .unwrap_or_else(|_| "./data/store".to_string());
    let cache_dir: String = config
        .get("data.cache_dir")
        .unwrap_or_else(|_| "./data/cache".to_string());

    let provider = select_provider(&config.embedding());
    let store = EmbeddingStore::open(&store_dir, provider).await?;
    let cache = LanceResultCache::open(&cache_dir).await?;

    let graph: Box<dyn GraphAccessor> = match config.get::<String>("data.graph_file") {
        Ok(path) => {
            let path = PathBuf::from(path);
            if path.exists() {
                Box::new(MemoryGraph::from_json_file(&path)?)
            } else {
                Box::new(DisconnectedGraph)
            }
        }
        Err(_) => Box::new(DisconnectedGraph),
    };

    let engine = RetrievalEngine::new(store, graph, cache, config.engine());
    let ctx = engine.search(query, max_results).await?;

    println!("🔍 recall search\n================");
    println!("Query: {}", query);
    println!(
        "Intent: {:?}  Source: {:?}  Nodes found: {}",
        ctx.intent, ctx.source, ctx.nodes_found
    );
    print_matches("Primary matches", &ctx.primary_matches);
    print_matches("Secondary matches", &ctx.secondary_matches);
    println!("\nExpanded queries:");
    for q in &ctx.expanded_queries {
        println!("  - {}", q);
    }
    Ok(())
}

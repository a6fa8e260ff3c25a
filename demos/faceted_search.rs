/// Faceted search walkthrough
///
/// Demonstrates the query operators end to end:
/// - Ingestion of nested JSON documents
/// - GET / AND / OR / NOT
/// - BUCKET, BUCKETFILTER over DISTINCT values (facet counts)
/// - DICTIONARY and scored SEARCH
/// - Hydration, paging and export/import

use facetdex::{Database, EngineConfig, QueryOptions};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║      facetdex - Faceted Search Walkthrough    ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    // Step 1: Create engine
    let db = Database::open(EngineConfig::default())?;

    // Step 2: Ingest
    println!("Step 2: PUT - Adding documents...");
    let ids = db.put(vec![
        json!({"_id": 1, "make": "Volvo", "color": "Red", "specs": {"drive": "AWD"}, "title": "Volvo XC90 family SUV"}),
        json!({"_id": 2, "make": "Tesla", "color": "White", "specs": {"drive": "AWD"}, "title": "Tesla Model Y electric SUV"}),
        json!({"_id": 3, "make": "BMW", "color": "Black", "specs": {"drive": "RWD"}, "title": "BMW M3 sport sedan"}),
        json!({"_id": 4, "make": "Tesla", "color": "Red", "specs": {"drive": "RWD"}, "title": "Tesla Model 3 electric sedan"}),
        json!({"_id": 5, "make": "Volvo", "color": "White", "specs": {"drive": "FWD"}, "title": "Volvo V60 estate"}),
    ])?;
    println!("  Inserted {} documents, fields: {:?}\n", ids.len(), db.fields());

    // Step 3: Boolean queries
    println!("Step 3: Boolean queries...");
    let plain = QueryOptions::default();
    for query in [
        json!({"GET": "make:tesla"}),
        json!({"AND": ["specs.drive:awd", "color:red"]}),
        json!({"OR": ["make:bmw", "color:white"]}),
        json!({"NOT": {"INCLUDE": "specs.drive:awd", "EXCLUDE": "make:volvo"}}),
    ] {
        let response = db.query(&query, &plain)?;
        println!("  {} -> {:?}", query, response.ids());
    }
    println!();

    // Step 4: Facets
    println!("Step 4: Facets for 'suv' OR 'sedan' by make...");
    let facets = db.query(
        &json!({
            "BUCKETFILTER": {
                "BUCKETS": {"DISTINCT": {"field": "make"}},
                "FILTER": {"OR": [{"SEARCH": "title:suv"}, {"SEARCH": "title:sedan"}]}
            }
        }),
        &plain,
    )?;
    for bucket in facets.buckets().unwrap_or_default() {
        println!("  {:<8} {}", bucket.value.gte, bucket.ids.len());
    }

    let bucket = db.query(&json!({"BUCKET": {"field": "title", "value": "Volvo V60 estate"}}), &plain)?;
    println!("  exact title bucket: {}", serde_json::to_string(&bucket)?);
    println!();

    // Step 5: Dictionary and search
    println!("Step 5: DICTIONARY / SEARCH...");
    let colors = db.query(&json!({"DICTIONARY": "color"}), &plain)?;
    println!("  colors: {}", serde_json::to_string(&colors)?);

    let search = db.query(&json!({"SEARCH": "electric tesla"}), &QueryOptions::with_documents().paged(0, 1))?;
    println!("  top hit: {}", serde_json::to_string_pretty(&search)?);
    println!();

    // Step 6: Export / import
    println!("Step 6: Export and import...");
    let path = std::env::temp_dir().join("facetdex-demo.snap");
    let bytes = db.export(&path)?;
    let copy = Database::in_memory()?;
    copy.import(&path)?;
    println!("  {} bytes, {} documents restored", bytes, copy.document_count());
    std::fs::remove_file(&path)?;

    // Step 7: Statistics
    let stats = db.stats();
    println!("\nStep 7: Statistics");
    println!("  Snapshot version: {}", stats.snapshot_version);
    println!("  Postings:         {}", stats.posting_count);
    println!("  Queries:          {}", stats.queries_evaluated);
    println!("  Cache hit rate:   {:.1}%", stats.cache_stats.hit_rate() * 100.0);

    Ok(())
}

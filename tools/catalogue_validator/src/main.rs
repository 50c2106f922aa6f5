use clauselens_core::catalogue::validate::validate_roots;
use std::path::PathBuf;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let roots: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if roots.is_empty() {
        eprintln!("usage: catalogue_validator <rule-root> [<rule-root> ...]");
        eprintln!("roots are given in priority order; the first root wins id ties");
        std::process::exit(2);
    }

    let conflicts = validate_roots(&roots);
    if conflicts.is_empty() {
        println!("CATALOGUE_VALIDATOR overall=PASS roots={}", roots.len());
        std::process::exit(0);
    }

    for conflict in &conflicts {
        println!(
            "CONFLICT {} variants={}",
            conflict.id,
            conflict.variants.len()
        );
        for variant in &conflict.variants {
            println!(
                "  root[{}] body={} {}",
                variant.root_priority,
                &variant.body_hash[..8],
                variant.path.display()
            );
        }
    }
    println!(
        "CATALOGUE_VALIDATOR overall=FAIL conflicts={}",
        conflicts.len()
    );
    std::process::exit(1);
}

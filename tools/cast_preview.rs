/// Cast Preview — prints the laid-out relationship graph for a cast sheet,
/// and optionally priced locations and elaborated characters.
///
/// Usage: cast_preview <cast.ron> [--locations <file.ron>] [--styles <file.ron>]
///                     [--pricing <file.ron>] [--elaborate] [--seed <n>]

use chrono::Utc;
use story_engine::core::classifier::RelationshipClassifier;
use story_engine::core::emptiness::collapsed_sections;
use story_engine::core::graph::{duplicate_pairs, GraphBuilder};
use story_engine::core::layout::CircularLayout;
use story_engine::core::pricing::{PricingEstimator, PricingTable};
use story_engine::core::synthesis::ArchetypeSynthesizer;
use story_engine::core::tiers::{upgrade_next, TransitionContext};
use story_engine::schema::cast::CastSheet;
use story_engine::schema::character::Character;
use story_engine::schema::location::LocationSuggestion;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let cast_path = &args[1];
    let mut locations_path = None;
    let mut styles_path = None;
    let mut pricing_path = None;
    let mut elaborate = false;
    let mut seed: u64 = 42;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--locations" if i + 1 < args.len() => {
                i += 1;
                locations_path = Some(args[i].clone());
            }
            "--styles" if i + 1 < args.len() => {
                i += 1;
                styles_path = Some(args[i].clone());
            }
            "--pricing" if i + 1 < args.len() => {
                i += 1;
                pricing_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--elaborate" => elaborate = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let cast = match CastSheet::load_from_ron(Path::new(cast_path)) {
        Ok(cast) => cast,
        Err(e) => {
            eprintln!("ERROR: Failed to load cast sheet: {}", e);
            process::exit(1);
        }
    };

    let classifier = match styles_path {
        Some(ref path) => match RelationshipClassifier::load_from_ron(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to load style table: {}", e);
                process::exit(1);
            }
        },
        None => RelationshipClassifier::default(),
    };

    let characters = cast.characters(Utc::now());
    print_graph(&characters, &cast, classifier);

    if elaborate {
        print_elaborated(&characters, seed);
    }

    if let Some(ref path) = locations_path {
        let table = match pricing_path {
            Some(ref p) => match PricingTable::load_from_ron(Path::new(p)) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("ERROR: Failed to load pricing table: {}", e);
                    process::exit(1);
                }
            },
            None => PricingTable::default(),
        };
        print_locations(path, PricingEstimator::new(table));
    }
}

fn print_usage() {
    println!("Usage: cast_preview <cast.ron> [--locations <file.ron>] [--styles <file.ron>]");
    println!("                    [--pricing <file.ron>] [--elaborate] [--seed <n>]");
}

fn print_graph(characters: &[Character], cast: &CastSheet, classifier: RelationshipClassifier) {
    let graph = GraphBuilder::new(classifier, CircularLayout::default())
        .build(characters, &cast.relationships);

    println!("=== Nodes ({}) ===\n", graph.nodes.len());
    for (node, character) in graph.nodes.iter().zip(characters) {
        println!(
            "  {:<16} {:<20} ({:>5.1}, {:>5.1})",
            character.name,
            character.role.as_str(),
            node.x,
            node.y
        );
    }

    println!(
        "\n=== Edges ({} authored, {} latent) ===\n",
        graph.authored_edges().count(),
        graph.latent_edges().count()
    );
    for edge in graph.authored_edges() {
        let name_of = |id: &str| {
            characters
                .iter()
                .find(|c| c.id.0.to_string() == id)
                .map_or("?", |c| c.name.as_str())
        };
        let category = edge
            .category
            .map(|c| format!("{:?}", c).to_lowercase())
            .unwrap_or_default();
        print!(
            "  {} -- {}: \"{}\" [{} {}",
            name_of(&edge.from_id),
            name_of(&edge.to_id),
            edge.relationship_type.as_deref().unwrap_or(""),
            category,
            edge.style.color
        );
        if let Some(ref dash) = edge.style.stroke_dasharray {
            print!(" dash {}", dash);
        }
        if let Some(ref gradient) = edge.style.gradient_id {
            print!(" {}", gradient);
        }
        println!("]");
    }

    for dup in duplicate_pairs(&cast.relationships) {
        let rel = &cast.relationships[dup.ignored];
        println!(
            "  WARNING: record {} ({} / {}) duplicates record {} and is ignored",
            dup.ignored, rel.character_a, rel.character_b, dup.kept
        );
    }
}

fn print_elaborated(characters: &[Character], seed: u64) {
    let synth = ArchetypeSynthesizer::new(seed);
    println!("\n=== Elaborated (seed {}) ===", seed);

    for character in characters {
        let others: Vec<Character> = characters
            .iter()
            .filter(|c| c.id != character.id)
            .cloned()
            .collect();
        let ctx = TransitionContext::new(Utc::now()).with_references(others);

        let mut current = character.clone();
        loop {
            let result = upgrade_next(&current, &ctx, &synth);
            if !result.success {
                break;
            }
            current = result.character;
        }

        println!("\n--- {} ({:?}) ---", current.name, current.tier);
        if let Some(ref balanced) = current.balanced {
            println!("  Age:        {}", balanced.physiology.age);
            println!("  Want/need:  {} / {}", balanced.psychology.want, balanced.psychology.need);
            println!("  Flaw:       {}", balanced.psychology.primary_flaw);
            println!("  Voice:      {}", balanced.voice.speech_pattern);
            println!("  Backstory:  {}", balanced.backstory);
        }
        let collapsed = collapsed_sections(&current);
        if !collapsed.is_empty() {
            println!("  Collapsed:  {:?}", collapsed);
        }
    }
}

fn print_locations(path: &str, estimator: PricingEstimator) {
    let suggestions: Vec<LocationSuggestion> = match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| ron::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load locations: {}", e);
            process::exit(1);
        }
    };

    println!("\n=== Locations ({}) ===\n", suggestions.len());
    for location in estimator.apply_all(suggestions) {
        let rate = location
            .existing_day_rate()
            .map_or("-".to_string(), |r| format!("${:.0}", r));
        println!(
            "  {:<24} {:<16} {:<24} {:>7}{}",
            location.name,
            location.sourcing.as_str(),
            location.venue_type,
            rate,
            if location.is_estimated { " (est.)" } else { "" }
        );
    }
}

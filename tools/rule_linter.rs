/// Rule Linter — validates relationship style tables and pricing tables.
///
/// Usage: rule_linter <file.ron>...
///
/// The table kind is detected from the file contents: a file that parses as
/// a style table is linted as one, otherwise it is tried as a pricing table.

use story_engine::core::classifier::{RelationshipCategory, RelationshipClassifier};
use story_engine::core::pricing::{PricingTable, VenueEffect};
use story_engine::schema::location::SourcingChannel;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: rule_linter <file.ron>...");
        process::exit(0);
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for file in &args[1..] {
        let path = Path::new(file);
        if !path.is_file() {
            errors.push(format!("Path '{}' does not exist", file));
            continue;
        }

        match RelationshipClassifier::load_from_ron(path) {
            Ok(classifier) => {
                println!("Loaded style table: {} ({} rules)", file, classifier.rules.len());
                lint_styles(&classifier, &mut errors, &mut warnings);
            }
            Err(style_err) => match PricingTable::load_from_ron(path) {
                Ok(table) => {
                    println!(
                        "Loaded pricing table: {} ({} channels, {} adjustments)",
                        file,
                        table.base_rates.len(),
                        table.adjustments.len()
                    );
                    lint_pricing(&table, &mut errors, &mut warnings);
                }
                Err(pricing_err) => {
                    errors.push(format!(
                        "{}: not a style table ({}) nor a pricing table ({})",
                        file, style_err, pricing_err
                    ));
                }
            },
        }
    }

    println!("\n=== Rule Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_styles(
    classifier: &RelationshipClassifier,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    for shadowed in classifier.shadowed_keywords() {
        warnings.push(format!(
            "Keyword '{}' ({:?}) can never match: '{}' ({:?}) is checked first",
            shadowed.keyword, shadowed.category, shadowed.shadowing_keyword, shadowed.shadowed_by
        ));
    }

    let mut seen = FxHashSet::default();
    for rule in &classifier.rules {
        if rule.category == RelationshipCategory::Unclassified {
            errors.push("Rule for 'unclassified' shadows the fallback style".to_string());
        }
        if !seen.insert(rule.category) {
            warnings.push(format!(
                "Category {:?} has more than one rule",
                rule.category
            ));
        }
        for keyword in &rule.keywords {
            if keyword.trim().is_empty() {
                errors.push(format!("Rule {:?} has a blank keyword", rule.category));
            } else if keyword.to_lowercase() != *keyword {
                errors.push(format!(
                    "Keyword '{}' ({:?}) has uppercase letters and will never match",
                    keyword, rule.category
                ));
            }
        }
        if !(0.0..=1.0).contains(&rule.style.opacity) {
            errors.push(format!(
                "Rule {:?} opacity {} is outside 0..1",
                rule.category, rule.style.opacity
            ));
        }
    }
}

fn lint_pricing(table: &PricingTable, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let listed: FxHashSet<SourcingChannel> = table.base_rates.iter().map(|r| r.channel).collect();
    for channel in SourcingChannel::ALL {
        if !listed.contains(&channel) {
            warnings.push(format!(
                "Channel '{}' has no base rate; the fallback of {} applies",
                channel, table.fallback_rate
            ));
        }
    }
    if listed.len() < table.base_rates.len() {
        warnings.push("A channel is listed more than once; the first rate wins".to_string());
    }

    if !table
        .adjustments
        .iter()
        .any(|a| a.effect == VenueEffect::Free)
    {
        warnings.push("No adjustment prices public venues at zero".to_string());
    }

    for (i, adjustment) in table.adjustments.iter().enumerate() {
        if adjustment.keywords.is_empty() {
            errors.push(format!("Adjustment {} has no keywords", i));
        }
        for keyword in &adjustment.keywords {
            if keyword.to_lowercase() != *keyword {
                errors.push(format!(
                    "Venue keyword '{}' has uppercase letters and will never match",
                    keyword
                ));
            }
            let earlier = table.adjustments[..i]
                .iter()
                .flat_map(|a| a.keywords.iter())
                .find(|k| keyword.contains(k.as_str()));
            if let Some(k) = earlier {
                warnings.push(format!(
                    "Venue keyword '{}' can never match: '{}' is checked first",
                    keyword, k
                ));
            }
        }
    }
}

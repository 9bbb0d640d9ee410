use std::error::Error;
use std::path::PathBuf;

use anyhow::anyhow;
use dotenvy::dotenv;
use serde_json::{Map, Value};
use tracing::warn;

mod analyzer;
mod brand;
mod config;
mod consistency;
mod dimensions;
mod error;
mod formats;
mod generator;
mod llm;
mod placeholder;
mod prompts;
mod utils;

use analyzer::{ReferenceAnalysis, ReferenceAnalyzer};
use brand::{BrandGuidelines, StyleAdjustments, MAX_STYLE_LEVEL, MIN_STYLE_LEVEL};
use config::Config;
use consistency::ConsistencyChecker;
use error::{classify_model_failure, user_facing_model_error, UserFacingError};
use generator::{AdCopy, AdGenerator, GeneratedAd};
use llm::media::prepare_reference_image;
use llm::GeminiClient;
use utils::logging::init_logging;

type CliResult = Result<(), Box<dyn Error + Send + Sync>>;

#[derive(Debug, Clone, PartialEq)]
struct GenerateArgs {
    brand_file: PathBuf,
    reference_text: Option<String>,
    reference_image: Option<PathBuf>,
    format: String,
    variations: u32,
    tone: u8,
    creativity: u8,
    emotion: u8,
    brand_elements: bool,
    check_consistency: bool,
    json_output: bool,
}

const DEFAULT_FORMAT: &str = "Social Media Post";

fn top_level_usage() -> &'static str {
    "Usage: adgen <generate|list-models> [options]\nRun a subcommand with --help for details"
}

fn generate_usage() -> String {
    format!(
        "Usage: adgen generate --brand <guidelines.json> [--reference-text <text>] [--reference-image <path>] \
         [--format <name>] [--variations <n>] [--tone <1-5>] [--creativity <1-5>] [--emotion <1-5>] \
         [--brand-elements] [--check-consistency] [--json]\n\
         Formats: {} (default: {DEFAULT_FORMAT})",
        formats::format_names().join(", ")
    )
}

fn list_models_usage() -> &'static str {
    "Usage: adgen list-models"
}

fn parse_style_level(name: &str, value: &str) -> anyhow::Result<u8> {
    let level = value
        .parse::<u8>()
        .map_err(|_| anyhow!("Invalid {name} value: {value}"))?;
    if !(MIN_STYLE_LEVEL..=MAX_STYLE_LEVEL).contains(&level) {
        return Err(anyhow!(
            "{name} must be between {MIN_STYLE_LEVEL} and {MAX_STYLE_LEVEL}"
        ));
    }
    Ok(level)
}

fn parse_generate_args(args: &[String]) -> anyhow::Result<Option<GenerateArgs>> {
    if args.get(1).map(|value| value.as_str()) != Some("generate") {
        return Ok(None);
    }

    let mut brand_file: Option<PathBuf> = None;
    let mut reference_text: Option<String> = None;
    let mut reference_image: Option<PathBuf> = None;
    let mut format = DEFAULT_FORMAT.to_string();
    let mut variations = 2u32;
    let mut tone = 3u8;
    let mut creativity = 3u8;
    let mut emotion = 3u8;
    let mut brand_elements = false;
    let mut check_consistency = false;
    let mut json_output = false;

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--brand" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --brand"))?;
                brand_file = Some(PathBuf::from(value));
            }
            "--reference-text" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --reference-text"))?;
                reference_text = Some(value.clone());
            }
            "--reference-image" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --reference-image"))?;
                reference_image = Some(PathBuf::from(value));
            }
            "--format" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --format"))?;
                format = value.clone();
            }
            "--variations" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --variations"))?;
                variations = value
                    .parse::<u32>()
                    .map_err(|_| anyhow!("Invalid --variations value: {value}"))?
                    .max(1);
            }
            "--tone" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --tone"))?;
                tone = parse_style_level("--tone", value)?;
            }
            "--creativity" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --creativity"))?;
                creativity = parse_style_level("--creativity", value)?;
            }
            "--emotion" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --emotion"))?;
                emotion = parse_style_level("--emotion", value)?;
            }
            "--brand-elements" => {
                brand_elements = true;
            }
            "--check-consistency" => {
                check_consistency = true;
            }
            "--json" => {
                json_output = true;
            }
            "--help" | "-h" => {
                return Err(anyhow!(generate_usage()));
            }
            other => {
                return Err(anyhow!(
                    "Unknown generate argument: {other}\n{}",
                    generate_usage()
                ));
            }
        }
        index += 1;
    }

    let brand_file = brand_file.ok_or_else(|| anyhow!("--brand is required"))?;
    if reference_text.is_none() && reference_image.is_none() {
        return Err(anyhow!("Reference advertisement text is required"));
    }

    Ok(Some(GenerateArgs {
        brand_file,
        reference_text,
        reference_image,
        format,
        variations,
        tone,
        creativity,
        emotion,
        brand_elements,
        check_consistency,
        json_output,
    }))
}

fn parse_list_models_args(args: &[String]) -> anyhow::Result<bool> {
    if args.get(1).map(|value| value.as_str()) != Some("list-models") {
        return Ok(false);
    }
    if let Some(other) = args.get(2) {
        if other == "--help" || other == "-h" {
            return Err(anyhow!(list_models_usage()));
        }
        return Err(anyhow!(
            "Unknown list-models argument: {other}\n{}",
            list_models_usage()
        ));
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> CliResult {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if let Some(generate_args) = parse_generate_args(&args)? {
        let config = Config::load()?;
        let _guards = init_logging(&config.log_level);
        return run_generate(&config, generate_args).await;
    }

    if parse_list_models_args(&args)? {
        let config = Config::load()?;
        let _guards = init_logging(&config.log_level);
        return run_list_models(&config).await;
    }

    Err(top_level_usage().into())
}

async fn run_generate(config: &Config, args: GenerateArgs) -> CliResult {
    let raw = std::fs::read_to_string(&args.brand_file).map_err(|err| {
        anyhow!(
            "Failed to read brand guidelines {}: {}",
            args.brand_file.display(),
            err
        )
    })?;
    let guidelines: BrandGuidelines =
        serde_json::from_str(&raw).map_err(|err| anyhow!("Invalid brand guidelines JSON: {err}"))?;
    guidelines.validate()?;

    let adjustments = StyleAdjustments::new(args.tone, args.creativity, args.emotion);
    let analyzer = ReferenceAnalyzer::new(config);

    let mut reference = ReferenceAnalysis::default();
    if let Some(text) = args.reference_text.as_deref() {
        match analyzer.analyze_text(text).await {
            Ok(analysis) => reference.text_analysis = Some(analysis),
            Err(err) => return Err(UserFacingError(user_facing_model_error(&err)).into()),
        }
    }
    if let Some(image) = args.reference_image.as_deref() {
        if !image.exists() {
            return Err(
                anyhow!("Reference image file not found at: {}", image.display()).into(),
            );
        }
        let prepared = prepare_reference_image(image)?;
        reference.image_analysis = Some(analyzer.analyze_image(&prepared).await);
    }

    let brand_elements = if args.brand_elements {
        extract_brand_elements(&analyzer, &reference).await
    } else {
        None
    };

    let generator = AdGenerator::new(config);
    let ads = generator
        .generate(
            &reference,
            &guidelines,
            &args.format,
            args.variations,
            &adjustments,
        )
        .await;

    if ads.is_empty() {
        return Err("Failed to generate advertisements. Please try again.".into());
    }

    let checker = if args.check_consistency {
        Some(ConsistencyChecker::new(config))
    } else {
        None
    };

    if args.json_output {
        print_json_report(&reference, brand_elements, &ads, checker.as_ref(), &guidelines).await
    } else {
        print_console_report(
            &reference,
            brand_elements.as_ref(),
            &ads,
            checker.as_ref(),
            &guidelines,
        )
        .await
    }
}

async fn extract_brand_elements(
    analyzer: &ReferenceAnalyzer,
    reference: &ReferenceAnalysis,
) -> Option<Value> {
    let (Some(text), Some(image)) = (
        reference.text_analysis.as_ref(),
        reference.image_analysis.as_ref(),
    ) else {
        warn!("Brand element extraction needs both a text and an image analysis; skipping");
        return None;
    };
    match analyzer.extract_brand_elements(text, image).await {
        Ok(elements) => Some(elements),
        Err(err) => {
            warn!("Brand element extraction failed: {:#}", err);
            None
        }
    }
}

async fn print_console_report(
    reference: &ReferenceAnalysis,
    brand_elements: Option<&Value>,
    ads: &[GeneratedAd],
    checker: Option<&ConsistencyChecker>,
    guidelines: &BrandGuidelines,
) -> CliResult {
    if !reference.is_empty() {
        println!("Reference Analysis:");
        println!("{}", serde_json::to_string_pretty(reference)?);
    }
    if let Some(elements) = brand_elements {
        println!();
        println!("Brand Elements:");
        println!("{}", serde_json::to_string_pretty(elements)?);
    }

    println!();
    println!("Generated Advertisements");
    for (index, ad) in ads.iter().enumerate() {
        println!();
        println!("Advertisement {}", index + 1);
        println!("Format Details:");
        println!("{}", serde_json::to_string_pretty(&ad.specs)?);
        println!("Text Content:");
        print_ad_copy(&ad.text, &ad.specs.components);
        if let Some(image) = &ad.image {
            println!("Image: {}", image.display());
        }
        if let Some(checker) = checker {
            report_consistency(checker, &ad.text, guidelines).await;
        }
    }
    println!();
    println!("Advertisements generated successfully!");
    Ok(())
}

// Catalog components print in their declared order; anything extra the model
// returned follows.
fn print_ad_copy(copy: &AdCopy, catalog_components: &[String]) {
    match copy {
        AdCopy::Components(map) => {
            for name in catalog_components {
                if let Some(value) = map.get(name) {
                    println!("{}: {}", title_case(name), component_text(value));
                }
            }
            for (name, value) in map {
                if catalog_components.contains(name) {
                    continue;
                }
                println!("{}: {}", title_case(name), component_text(value));
            }
        }
        AdCopy::Raw { text, error } => {
            println!("Raw Text: {text}");
            println!("Error: {error}");
        }
    }
}

fn title_case(component: &str) -> String {
    component
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn component_text(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

async fn report_consistency(
    checker: &ConsistencyChecker,
    copy: &AdCopy,
    guidelines: &BrandGuidelines,
) {
    let ad_value = serde_json::to_value(copy).unwrap_or_default();
    match checker.check_consistency(&ad_value, guidelines).await {
        Ok(score) => println!("Brand Consistency Score: {score:.2}"),
        Err(err) => warn!(
            "Consistency check failed: {}",
            classify_model_failure(&format!("{err:#}"))
        ),
    }
    match checker.improvement_suggestions(&ad_value, guidelines).await {
        Ok(suggestions) => {
            println!("Improvement Suggestions:");
            println!("{suggestions}");
        }
        Err(err) => warn!(
            "Improvement suggestions failed: {}",
            classify_model_failure(&format!("{err:#}"))
        ),
    }
}

async fn print_json_report(
    reference: &ReferenceAnalysis,
    brand_elements: Option<Value>,
    ads: &[GeneratedAd],
    checker: Option<&ConsistencyChecker>,
    guidelines: &BrandGuidelines,
) -> CliResult {
    let mut ad_values = Vec::with_capacity(ads.len());
    for ad in ads {
        let mut ad_value = serde_json::to_value(ad)?;
        if let Some(checker) = checker {
            let copy_value = serde_json::to_value(&ad.text).unwrap_or_default();
            match checker.check_consistency(&copy_value, guidelines).await {
                Ok(score) => {
                    ad_value["consistency_score"] = score.into();
                }
                Err(err) => warn!(
                    "Consistency check failed: {}",
                    classify_model_failure(&format!("{err:#}"))
                ),
            }
            match checker.improvement_suggestions(&copy_value, guidelines).await {
                Ok(suggestions) => {
                    ad_value["improvement_suggestions"] = suggestions.into();
                }
                Err(err) => warn!(
                    "Improvement suggestions failed: {}",
                    classify_model_failure(&format!("{err:#}"))
                ),
            }
        }
        ad_values.push(ad_value);
    }

    let mut document = Map::new();
    document.insert(
        "reference_analysis".to_string(),
        serde_json::to_value(reference)?,
    );
    if let Some(elements) = brand_elements {
        document.insert("brand_elements".to_string(), elements);
    }
    document.insert("ads".to_string(), Value::Array(ad_values));
    println!("{}", serde_json::to_string_pretty(&Value::Object(document))?);
    Ok(())
}

async fn run_list_models(config: &Config) -> CliResult {
    let client = GeminiClient::new(config);
    let models = match client.list_models().await {
        Ok(models) => models,
        Err(err) => return Err(UserFacingError(user_facing_model_error(&err)).into()),
    };

    if models.is_empty() {
        println!("No models available.");
        return Ok(());
    }

    println!("Available Gemini models:");
    for model in models {
        println!("- {}", model.name);
        if let Some(display_name) = model.display_name {
            println!("  Display name: {display_name}");
        }
        if let Some(description) = model.description {
            println!("  Description: {description}");
        }
        println!();
    }
    Ok(())
}

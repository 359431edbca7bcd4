use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use inkpot::config::loader::{load_config, load_config_or_default, write_config};
use inkpot::imaging::report::{format_size, output_path};
use inkpot::imaging::{ImageOptimizer, SourceImage};
use inkpot::{markdown, post, seo, text_stats, Config, SpamScorer};
use log::LevelFilter;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let matches = Command::new("inkpot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Content heuristics for blog authoring and comment moderation")
        .long_about("inkpot - editorial tooling for a blog platform:\n\
                    • Comment spam scoring with configurable pattern tiers\n\
                    • SEO scoring for titles, meta descriptions and Markdown content\n\
                    • Text statistics with reading and speaking time estimates\n\
                    • Image resizing and re-encoding for uploads\n\
                    • Markdown preview rendering")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (.yaml, .yml or .toml)")
                .default_value("inkpot.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write the default configuration to FILE")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and compile all spam patterns")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("spam")
                .long("spam")
                .value_name("FILE")
                .help("Score a comment for spam (use - for stdin)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("seo")
                .long("seo")
                .help("Run SEO analysis on --title, --description and --content")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .value_name("TEXT")
                .help("Post title for SEO analysis")
                .default_value(""),
        )
        .arg(
            Arg::new("description")
                .long("description")
                .value_name("TEXT")
                .help("Meta description for SEO analysis")
                .default_value(""),
        )
        .arg(
            Arg::new("content")
                .long("content")
                .value_name("FILE")
                .help("Markdown content file for SEO analysis (use - for stdin)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("FILE")
                .help("Show text statistics (use - for stdin)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("optimize")
                .long("optimize")
                .value_name("IMAGE")
                .help("Resize and re-encode one or more images")
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .value_name("DIR")
                .help("Directory for optimized images")
                .default_value("optimized"),
        )
        .arg(
            Arg::new("preview")
                .long("preview")
                .value_name("FILE")
                .help("Render Markdown to HTML (use - for stdin)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("slug")
                .long("slug")
                .value_name("TITLE")
                .help("Print the URL slug for a post title")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print results as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging for every rule that fires")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Err(e) = run(&matches) {
        eprintln!("❌ {e:#}");
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    if let Some(path) = matches.get_one::<String>("generate-config") {
        write_config(&Config::default(), path)?;
        println!("Default configuration written to: {path}");
        println!("Please edit the configuration file to suit your needs.");
        return Ok(());
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("inkpot.yaml");
    let json = matches.get_flag("json");

    if matches.get_flag("test-config") {
        return test_config(config_path);
    }

    let config = load_config_or_default(config_path);

    if let Some(path) = matches.get_one::<String>("spam") {
        return score_spam(&config, &read_input(path)?, json);
    }

    if matches.get_flag("seo") {
        let title = matches.get_one::<String>("title").map(String::as_str).unwrap_or("");
        let description = matches
            .get_one::<String>("description")
            .map(String::as_str)
            .unwrap_or("");
        let content = match matches.get_one::<String>("content") {
            Some(path) => read_input(path)?,
            None => String::new(),
        };
        return analyze_seo(title, description, &content, json);
    }

    if let Some(path) = matches.get_one::<String>("stats") {
        return show_stats(&read_input(path)?, json);
    }

    if let Some(images) = matches.get_many::<String>("optimize") {
        let output_dir = matches
            .get_one::<String>("output-dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("optimized"));
        let paths: Vec<&String> = images.collect();
        return optimize_images(&config, &paths, &output_dir, json);
    }

    if let Some(path) = matches.get_one::<String>("preview") {
        print!("{}", markdown::render_html(&read_input(path)?));
        return Ok(());
    }

    if let Some(title) = matches.get_one::<String>("slug") {
        println!("{}", post::slugify(title));
        return Ok(());
    }

    println!("Nothing to do. Run with --help to see the available commands.");
    Ok(())
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read input file: {path}"))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn test_config(path: &str) -> anyhow::Result<()> {
    println!("🔍 Testing configuration...");
    println!();

    let config = if Path::new(path).exists() {
        load_config(path)?
    } else {
        println!("Configuration file '{path}' not found, checking built-in defaults");
        Config::default()
    };

    let scorer = SpamScorer::from_config(&config.spam)?;
    println!("Spam tiers: {}", config.spam.tiers.len());
    for tier in &config.spam.tiers {
        println!(
            "  {} (weight {}): {} patterns",
            tier.name,
            tier.weight,
            tier.patterns.len()
        );
    }
    println!("All {} regex patterns compiled successfully.", scorer.pattern_count());

    ImageOptimizer::new(config.images.clone())?;
    println!(
        "Images: max {}px, limit {}",
        config.images.max_dimension,
        format_size(config.images.max_file_size)
    );
    println!("Moderation flag threshold: {}", config.moderation.flag_threshold);
    println!("✅ Configuration is valid");
    Ok(())
}

fn score_spam(config: &Config, text: &str, json: bool) -> anyhow::Result<()> {
    let scorer = SpamScorer::from_config(&config.spam)?;
    let analysis = scorer.analyze(text.trim());

    if json {
        return print_json(&analysis);
    }

    println!("🛡️  Spam score: {:.2}", analysis.score);
    if analysis.score > config.moderation.flag_threshold {
        println!("⚠️  Possible spam (above {:.2})", config.moderation.flag_threshold);
    }
    for line in &analysis.evidence {
        println!("  • {line}");
    }
    Ok(())
}

fn print_feedback(heading: &str, score: i32, feedback: &[String], ok_message: &str) {
    println!("{heading}: {score}%");
    if feedback.is_empty() {
        println!("  ✅ {ok_message}");
    }
    for line in feedback {
        println!("  • {line}");
    }
    println!();
}

fn analyze_seo(title: &str, description: &str, content: &str, json: bool) -> anyhow::Result<()> {
    let analysis = seo::analyze(title, description, content);
    if json {
        return print_json(&analysis);
    }

    println!("📈 SEO Analysis");
    println!("═══════════════════════════════════════");
    print_feedback(
        &format!("Title ({}/60 characters)", analysis.title.length),
        analysis.title.score,
        &analysis.title.feedback,
        "Title looks good!",
    );
    print_feedback(
        &format!("Description ({}/160 characters)", analysis.description.length),
        analysis.description.score,
        &analysis.description.feedback,
        "Description looks good!",
    );

    let stats = &analysis.content.stats;
    println!(
        "Content: {} words, {} headings, {} links",
        stats.word_count, stats.headings, stats.links
    );
    for keyword in &stats.keyword_density {
        println!("  {:<20} {:.1}%", keyword.keyword, keyword.density);
    }
    print_feedback(
        "Content",
        analysis.content.score,
        &analysis.content.feedback,
        "Content looks good!",
    );
    Ok(())
}

fn show_stats(text: &str, json: bool) -> anyhow::Result<()> {
    let metrics = text_stats::analyze(text);
    if json {
        return print_json(&metrics);
    }

    println!("📊 Text Statistics");
    println!("═══════════════════════════════════════");
    println!("  Characters:             {}", metrics.characters);
    println!("  Characters (no spaces): {}", metrics.characters_no_spaces);
    println!("  Words:                  {}", metrics.words);
    println!("  Sentences:              {}", metrics.sentences);
    println!("  Paragraphs:             {}", metrics.paragraphs);
    println!("  Reading time:           {}", metrics.reading_time);
    println!("  Speaking time:          {}", metrics.speaking_time);
    Ok(())
}

fn optimize_images(
    config: &Config,
    paths: &[&String],
    output_dir: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let optimizer = ImageOptimizer::new(config.images.clone())?;

    let mut failures = 0;
    let mut sources = Vec::new();
    let mut source_paths = Vec::new();
    for path in paths {
        match SourceImage::from_path(path.as_str()) {
            Ok(source) => {
                sources.push(source);
                source_paths.push(*path);
            }
            Err(e) => {
                failures += 1;
                eprintln!("❌ {e}");
            }
        }
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let mut summaries = Vec::new();
    let mut written = HashSet::new();
    let results = optimizer.optimize_batch(&sources);
    for (path, result) in source_paths.iter().zip(results) {
        match result {
            Ok(image) => {
                let stem = Path::new(path.as_str())
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| image.name.clone());
                let target =
                    output_path(output_dir, &stem, image.plan.format.extension(), &written);
                fs::write(&target, &image.bytes)
                    .with_context(|| format!("Failed to write {}", target.display()))?;

                if !json {
                    println!(
                        "✅ {} → {} ({}x{}, {} → {}, saved {}%)",
                        image.name,
                        target.display(),
                        image.width(),
                        image.height(),
                        format_size(image.original_size),
                        format_size(image.optimized_size),
                        image.savings_percent()
                    );
                }
                written.insert(target);
                summaries.push(image);
            }
            Err(e) => {
                failures += 1;
                eprintln!("❌ {path}: {e}");
            }
        }
    }

    if json {
        print_json(&summaries)?;
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} images failed", paths.len());
    }
    Ok(())
}

//! keyanim CLI - Inspect and sample animations from attribute dumps.
//!
//! Input files are JSON dumps of one component's attribute dictionaries, as
//! produced by `MemoryStore::to_json`.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use keyanim::anim::{AnimationChannel, Evaluation};
use keyanim::prelude::{MemoryStore, Settings};
use keyanim::util::{format_number, mat4_to_row_major};
use keyanim::Result;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const BUILD_DATE: &str = env!("KEYANIM_BUILD_DATE");

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut json = false;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            "-j" | "--json" => json = true,
            "-V" | "--version" => {
                println!("keyanim {} ({})", env!("CARGO_PKG_VERSION"), BUILD_DATE);
                return ExitCode::SUCCESS;
            }
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    let Some(&command) = filtered_args.first() else {
        print_help();
        return ExitCode::SUCCESS;
    };
    let settings = Settings::load();
    debug!(dictionary = %settings.dictionary, "settings loaded");

    let result = match command {
        "info" | "i" => with_file(&filtered_args, "info <attrs.json>", |path| {
            cmd_info(path, &settings)
        }),
        "sample" | "s" => with_file(&filtered_args, "sample <attrs.json> [steps]", |path| {
            let steps = match filtered_args.get(2) {
                Some(s) => s
                    .parse()
                    .map_err(|_| keyanim::Error::invalid_value("steps", *s))?,
                None => settings.sample_steps,
            };
            cmd_sample(path, &settings, steps.max(1), json)
        }),
        "check" | "c" => with_file(&filtered_args, "check <attrs.json>", |path| {
            cmd_check(path, &settings)
        }),
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            Ok(ExitCode::FAILURE)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn with_file(
    args: &[&str],
    usage: &str,
    run: impl FnOnce(&Path) -> Result<ExitCode>,
) -> Result<ExitCode> {
    match args.get(1) {
        Some(path) => run(Path::new(path)),
        None => {
            eprintln!("Error: missing file argument");
            eprintln!("Usage: keyanim {}", usage);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_channel(path: &Path, settings: &Settings) -> Result<AnimationChannel> {
    let store = MemoryStore::from_json(&std::fs::read_to_string(path)?)?;
    AnimationChannel::load(&store, &settings.dictionary)?.ok_or_else(|| {
        keyanim::Error::other(format!(
            "{}: no animation in dictionary '{}'",
            path.display(),
            settings.dictionary
        ))
    })
}

fn cmd_info(path: &Path, settings: &Settings) -> Result<ExitCode> {
    let channel = load_channel(path, settings)?;
    let precision = settings.preview_precision;

    println!("File:      {}", path.display());
    println!(
        "Dataref:   {}",
        if channel.dataref.is_empty() { "(unset)" } else { channel.dataref.as_str() }
    );
    if !channel.index.is_empty() {
        println!("Index:     {}", channel.index);
    }
    println!(
        "Loop:      {}",
        if channel.is_looping() { channel.loop_text.as_str() } else { "(none)" }
    );
    println!("Previewable: {}", channel.can_preview());
    println!();

    println!("Keyframes ({}):", channel.keyframes.len());
    for (i, frame) in channel.keyframes.iter().enumerate() {
        let t = frame.transform.w_axis;
        println!(
            "  [{:>2}] value={:<12} position=({}, {}, {})",
            i,
            format_number(frame.value, precision),
            format_number(t.x, precision),
            format_number(t.y, precision),
            format_number(t.z, precision),
        );
    }

    if !channel.rules.is_empty() {
        println!();
        println!("Hide/Show ({}):", channel.rules.len());
        for (i, rule) in channel.rules.iter().enumerate() {
            let driver = if rule.index.is_empty() {
                rule.dataref.clone()
            } else {
                format!("{}[{}]", rule.dataref, rule.index)
            };
            println!(
                "  [{:>2}] {} {} .. {} of {}",
                i,
                rule.mode,
                format_number(rule.from, precision),
                format_number(rule.to, precision),
                driver
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_sample(path: &Path, settings: &Settings, steps: usize, json: bool) -> Result<ExitCode> {
    let channel = load_channel(path, settings)?;
    if !channel.can_preview() {
        eprintln!("Animation cannot be previewed (dataref unset, keyframes out of order or bad loop)");
        return Ok(ExitCode::FAILURE);
    }

    let samples: Vec<(f64, Evaluation)> = (0..=steps)
        .map(|i| {
            let progress = i as f64 / steps as f64;
            channel.evaluate(progress).map(|e| (progress, e))
        })
        .collect::<Result<_>>()?;

    if json {
        let out: Vec<serde_json::Value> = samples
            .iter()
            .map(|(progress, e)| {
                serde_json::json!({
                    "progress": progress,
                    "value": e.value,
                    "segment": [e.segment.lo, e.segment.hi],
                    "t": e.segment.t,
                    "visible": e.visibility.is_visible(),
                    "matrix": mat4_to_row_major(&e.transform).to_vec(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(ExitCode::SUCCESS);
    }

    let precision = settings.preview_precision;
    for (progress, e) in &samples {
        let t = e.transform.w_axis;
        println!(
            "{:>6}  value={:<10} seg={}-{} t={:<8} pos=({}, {}, {}){}",
            format_number(*progress, 3),
            format_number(e.value, precision),
            e.segment.lo,
            e.segment.hi,
            format_number(e.segment.t, 4),
            format_number(t.x, precision),
            format_number(t.y, precision),
            format_number(t.z, precision),
            if e.visibility.is_visible() { "" } else { " hidden" },
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_check(path: &Path, settings: &Settings) -> Result<ExitCode> {
    let channel = load_channel(path, settings)?;
    if channel.can_preview() {
        println!("OK: {} keyframes, valid through index {}", channel.keyframes.len(), channel.valid_prefix());
        Ok(ExitCode::SUCCESS)
    } else {
        if channel.dataref.is_empty() {
            println!("FAIL: dataref is not set");
        } else if channel.valid_prefix() < 2 {
            println!("FAIL: need at least two keyframes in ascending order");
        } else {
            println!("FAIL: loop period must be empty or greater than zero");
        }
        Ok(ExitCode::FAILURE)
    }
}

fn print_help() {
    println!("keyanim - keyframe animation inspector");
    println!();
    println!("USAGE:");
    println!("    keyanim-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info   <file>             Show dataref, loop, keyframes and hide/show rules");
    println!("    s, sample <file> [steps]     Evaluate the animation at evenly spaced points");
    println!("    c, check  <file>             Exit non-zero if the animation cannot be previewed");
    println!("    h, help                      Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!("    -j, --json       JSON output (sample)");
    println!("    -V, --version    Show version and build date");
    println!();
    println!("Logging can also be controlled with RUST_LOG.");
}

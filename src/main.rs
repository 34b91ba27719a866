use nmodel_editor::config::EditorConfig;
use nmodel_editor::session::Session;
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.nmodel> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  -o, --output <file>   Write the re-saved model");
        eprintln!("  -s, --svg <file>      Write an SVG rendering of the diagram");
        eprintln!("  -c, --config <file>   JSON settings overrides");
        eprintln!();
        eprintln!("With no outputs, prints a summary of the model.");
        process::exit(1);
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;
    let mut svg_path: Option<String> = None;
    let mut config_path: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(args[i].clone());
                }
            }
            "-s" | "--svg" => {
                i += 1;
                if i < args.len() {
                    svg_path = Some(args[i].clone());
                }
            }
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(args[i].clone());
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            let text = read_or_exit(&path);
            match EditorConfig::from_json(&text) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Invalid config {}: {}", path, e);
                    process::exit(1);
                }
            }
        }
        None => EditorConfig::default(),
    };

    let input = read_or_exit(input_path);
    let mut session = Session::new(config);
    if let Err(e) = session.load_str(&input) {
        eprintln!("Failed to load {}: {}", input_path, e);
        process::exit(1);
    }

    if output_path.is_none() && svg_path.is_none() {
        println!("{}", session.summary());
        for entry in session.objects() {
            println!("  [{}] {} ({})", entry.kind.as_str(), entry.name, entry.uuid);
        }
        return;
    }

    if let Some(path) = svg_path {
        write_or_exit(&path, &session.export_svg());
    }

    if let Some(path) = output_path {
        match session.save_string() {
            Ok(text) => write_or_exit(&path, &text),
            Err(e) => {
                eprintln!("Failed to save model: {}", e);
                process::exit(1);
            }
        }
    }
}

fn read_or_exit(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn write_or_exit(path: &str, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Failed to write {}: {}", path, e);
        process::exit(1);
    }
}

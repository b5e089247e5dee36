use std::env;
use std::process::ExitCode;

use mdpage::{extract_image_urls, BookContent};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Transform { input: String, output: String },
    Images { markdown_path: String },
    Help,
}

fn main() -> ExitCode {
    match run(env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    match parse_args(&args)? {
        Command::Transform { input, output } => {
            let json = std::fs::read_to_string(&input)
                .map_err(|e| format!("unable to read {}: {}", input, e))?;
            let content = BookContent::from_json_str(&json).map_err(|e| e.to_string())?;
            let pretty = content.to_json_pretty().map_err(|e| e.to_string())?;
            if let Some(parent) = std::path::Path::new(&output).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
                }
            }
            std::fs::write(&output, pretty)
                .map_err(|e| format!("unable to write {}: {}", output, e))?;
            println!("Wrote {} entries to {}", content.len(), output);
            Ok(())
        }
        Command::Images { markdown_path } => {
            let markdown = std::fs::read_to_string(&markdown_path)
                .map_err(|e| format!("unable to read {}: {}", markdown_path, e))?;
            for url in extract_image_urls(&markdown) {
                println!("{}", url);
            }
            Ok(())
        }
        Command::Help => {
            println!("{}", help_text());
            Ok(())
        }
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(sub) = args.first() else {
        return Err("missing subcommand".to_string());
    };
    match sub.as_str() {
        "transform" => match &args[1..] {
            [input, output] => Ok(Command::Transform {
                input: input.clone(),
                output: output.clone(),
            }),
            _ => Err("transform expects <input.json> <output.json>".to_string()),
        },
        "images" => match &args[1..] {
            [path] => Ok(Command::Images {
                markdown_path: path.clone(),
            }),
            _ => Err("images expects <file.md>".to_string()),
        },
        "-h" | "--help" | "help" => Ok(Command::Help),
        other => Err(format!("unknown subcommand `{}`", other)),
    }
}

fn help_text() -> &'static str {
    "usage:\n  mdpage transform <input.json> <output.json>   convert CMS export to a page array\n  mdpage images <file.md>                         list referenced image URLs"
}

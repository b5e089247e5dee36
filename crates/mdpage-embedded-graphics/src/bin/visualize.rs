use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use mdpage::{preload_images, FsImageSource, ImageMap};
use mdpage_embedded_graphics::{Canvas, MarkdownRenderOptions, MarkdownRenderer};
use mdpage_render::{LayoutConfig, LinkRect};

const DEFAULT_OUT_PATH: &str = "target/mdpage/page.png";

#[derive(Clone, Debug, PartialEq)]
struct Args {
    markdown_path: String,
    out_path: String,
    config_path: Option<String>,
    images_dir: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let markdown = std::fs::read_to_string(&cli.markdown_path)
        .map_err(|e| format!("unable to read {}: {}", cli.markdown_path, e))?;

    let mut layout = match &cli.config_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("unable to read {}: {}", path, e))?;
            LayoutConfig::from_json_str(&json).map_err(|e| format!("invalid config: {}", e))?
        }
        None => LayoutConfig::default(),
    };
    if let Some(width) = cli.width {
        layout.display_width = width;
    }
    if let Some(height) = cli.height {
        layout.display_height = height;
    }
    let (width, height) = (layout.display_width, layout.display_height);

    let images = match &cli.images_dir {
        Some(dir) => load_images(dir, &markdown)?,
        None => ImageMap::new(),
    };

    let renderer = MarkdownRenderer::new(layout);
    let mut canvas = Canvas::new(width, height);
    let mut links: Vec<LinkRect> = Vec::new();
    let options = MarkdownRenderOptions {
        images: Some(&images),
        link_rects: Some(&mut links),
    };
    match renderer.render(&mut canvas, &markdown, width, height, options) {
        Ok(()) => {}
        Err(never) => match never {},
    }

    if let Some(parent) = Path::new(&cli.out_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }
    canvas
        .save_png(&cli.out_path)
        .map_err(|e| format!("unable to write {}: {}", cli.out_path, e))?;

    println!(
        "Wrote {}x{} page to {} ({} image(s), {} link rect(s))",
        width,
        height,
        cli.out_path,
        images.len(),
        links.len()
    );
    for rect in &links {
        println!(
            "  link {:>6.1},{:>6.1} {:>5.1}x{:<5.1} {}",
            rect.x, rect.y, rect.w, rect.h, rect.url
        );
    }
    Ok(())
}

fn load_images(dir: &str, markdown: &str) -> Result<ImageMap, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("unable to start runtime: {}", e))?;
    let source = Arc::new(FsImageSource::new(dir));
    Ok(runtime.block_on(preload_images(source, markdown)))
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }
    let Some(markdown_path) = args.get(1).filter(|v| !v.starts_with("--")) else {
        return Err("missing markdown path".to_string());
    };

    let mut cfg = Args {
        markdown_path: markdown_path.clone(),
        out_path: DEFAULT_OUT_PATH.to_string(),
        config_path: None,
        images_dir: None,
        width: None,
        height: None,
    };

    let mut i = 2usize;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = || {
            args.get(i + 1)
                .ok_or_else(|| format!("{} requires a value", flag))
        };
        match flag {
            "--out" => cfg.out_path = value()?.clone(),
            "--config" => cfg.config_path = Some(value()?.clone()),
            "--images-dir" => cfg.images_dir = Some(value()?.clone()),
            "--width" => cfg.width = Some(parse_dimension(flag, value()?)?),
            "--height" => cfg.height = Some(parse_dimension(flag, value()?)?),
            other => return Err(format!("unknown argument '{}'", other)),
        }
        i += 2;
    }

    if cfg.out_path.is_empty() {
        return Err("--out must not be empty".to_string());
    }
    Ok(cfg)
}

fn parse_dimension(flag: &str, raw: &str) -> Result<u32, String> {
    match raw.parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(format!("invalid {} value '{}'", flag, raw)),
    }
}

fn help_text() -> &'static str {
    "usage: visualize <page.md> [--out page.png] [--config layout.json] [--images-dir DIR] [--width PX] [--height PX]"
}

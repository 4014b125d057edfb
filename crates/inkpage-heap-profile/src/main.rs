//! DHAT heap profiler for inkpage.
//!
//! Profiles allocation patterns of the layout pipeline on plain-text books:
//! page indexing (LOCATION), page display (DISPLAY) and a full reading
//! session that indexes once and then shows every page.
//!
//! Usage:
//!   cargo run -p inkpage-heap-profile --release -- --font <TTF> [OPTIONS] [TEXT_FILES...]
//!
//! Outputs dhat-<phase>.json in the output directory (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};

use inkpage::{
    locate_pages, show_page, text_tokens, FaceStyle, FontRegistry, FontSource, Format,
    LayoutEngine, LayoutOptions, RegistryOptions, DEFAULT_FAMILY,
};

const DISPLAY_WIDTH: i32 = 480;
const DISPLAY_HEIGHT: i32 = 800;
const MARGIN: i32 = 24;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Locate,
    Display,
    Session,
}

impl Phase {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "locate" => Some(Self::Locate),
            "display" => Some(Self::Display),
            "session" => Some(Self::Session),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Locate => "locate",
            Self::Display => "display",
            Self::Session => "session",
        }
    }
}

fn page_format() -> Format {
    Format {
        font_size: 18,
        indent: 24,
        margin_bottom: 8,
        screen_left: MARGIN,
        screen_top: MARGIN,
        screen_right: DISPLAY_WIDTH - MARGIN,
        screen_bottom: DISPLAY_HEIGHT - MARGIN,
        ..Format::default()
    }
}

fn build_engine(font: &Path) -> LayoutEngine {
    let mut fonts: FontRegistry = FontRegistry::new(RegistryOptions::default());
    if let Err(e) = fonts.try_add(DEFAULT_FAMILY, FaceStyle::Normal, FontSource::Path(font)) {
        eprintln!("Failed to load font {}: {}", font.display(), e);
        std::process::exit(1);
    }
    LayoutEngine::new(fonts, LayoutOptions::default())
}

fn profile_file(engine: &mut LayoutEngine, path: &Path, phase: Phase) {
    let path_str = path.to_string_lossy();
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {}", path_str, e));
    let fmt = page_format();
    let tokens = text_tokens(&text, &fmt);

    match phase {
        Phase::Locate => {
            let pages = locate_pages(engine, &tokens, &fmt)
                .unwrap_or_else(|e| panic!("locate {}: {}", path_str, e));
            eprintln!("    {} pages", pages.len());
        }
        Phase::Display => {
            // Index, then show the first pages the way a book open does.
            let pages = locate_pages(engine, &tokens, &fmt)
                .unwrap_or_else(|e| panic!("locate {}: {}", path_str, e));
            for page in pages.iter().take(16) {
                show_page(engine, &tokens, &fmt, page)
                    .unwrap_or_else(|e| panic!("show {}: {}", path_str, e));
            }
        }
        Phase::Session => {
            let pages = locate_pages(engine, &tokens, &fmt)
                .unwrap_or_else(|e| panic!("locate {}: {}", path_str, e));
            let mut entries = 0usize;
            for page in &pages {
                show_page(engine, &tokens, &fmt, page)
                    .unwrap_or_else(|e| panic!("show {}: {}", path_str, e));
                entries = entries.saturating_add(engine.display_list().len());
            }
            if entries == 0 && !tokens.is_empty() {
                panic!("session {} produced no display entries", path_str);
            }
            engine.fonts_mut().clear_glyph_caches();
        }
    }
}

/// Extract a short name from a file path for use in output filenames.
fn short_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn usage() {
    eprintln!("Usage: heap-profile --font <TTF> [OPTIONS] [TEXT_FILES...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --font <PATH>                        Face used for all text (required)");
    eprintln!(
        "  --phase <locate|display|session>     Pipeline phase to profile (default: session)"
    );
    eprintln!("  --out-dir <DIR>                      Output directory for dhat JSON (default: target/memory)");
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut phase = Phase::Session;
    let mut out_dir = PathBuf::from("target/memory");
    let mut font: Option<PathBuf> = None;
    let mut files: Vec<PathBuf> = Vec::with_capacity(8);
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--phase" => {
                i += 1;
                phase = args
                    .get(i)
                    .and_then(|s| Phase::from_str(s))
                    .unwrap_or_else(|| {
                        eprintln!("Unknown phase: {}", args.get(i).map_or("", String::as_str));
                        usage();
                        std::process::exit(1);
                    });
            }
            "--out-dir" => {
                i += 1;
                out_dir = PathBuf::from(args.get(i).map_or("target/memory", String::as_str));
            }
            "--font" => {
                i += 1;
                font = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => {
                files.push(PathBuf::from(other));
            }
        }
        i += 1;
    }

    let Some(font) = font else {
        eprintln!("No font given.");
        usage();
        std::process::exit(1);
    };
    if files.is_empty() {
        eprintln!("No text files given.");
        std::process::exit(1);
    }

    std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output dir {}: {}", out_dir.display(), e);
        std::process::exit(1);
    });

    let phase_name = phase.name();
    eprintln!(
        "heap-profile: phase={}, files={}, out={}",
        phase_name,
        files.len(),
        out_dir.display()
    );

    let json_path = out_dir.join(format!("dhat-{phase_name}.json"));
    let _profiler = dhat::Profiler::builder()
        .file_name(json_path.clone())
        .build();

    let mut engine = build_engine(&font);
    for file in &files {
        eprintln!("  profiling: {}", file.display());
        profile_file(&mut engine, file, phase);
        log::info!(
            "{}: {} glyphs cached",
            short_name(file),
            engine
                .fonts_mut()
                .get(0)
                .map_or(0, |cache| cache.cached_glyphs())
        );
    }

    // _profiler drops here, writes JSON
    eprintln!("Done. {}", json_path.display());
    eprintln!();
    eprintln!("Open in https://nnethercote.github.io/dh_view/dh_view.html");
}

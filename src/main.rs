mod audio;
mod render;

use clap::Parser;
use log::{debug, error, info, warn};
use macroquad::prelude::*;
use std::path::PathBuf;
use std::process;
use wandfire::ai::AiPolicyTable;
use wandfire::assets::{DEFAULT_MAP, load_embedded_map};
use wandfire::config::{DEFAULT_HEADLESS_TICKS, HEADLESS_FRAME_DELTA, SimConfig, WINDOW_HEIGHT, WINDOW_WIDTH};
use wandfire::map::MapData;
use wandfire::spell::SpellBook;
use wandfire::types::{Point, TickInput};
use wandfire::{Game, Outcome, SimEvent, logging};

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map descriptor (JSON). Defaults to the bundled castle map.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Simulation settings override (JSON); unspecified fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the enemy spawner.
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Debug filter to specify log topics (e.g., "move,zone,spell,ai,combat")
    #[arg(long)]
    debug_filter: Option<String>,

    /// Run without a window, feeding idle input at a fixed frame delta.
    #[arg(long)]
    headless: bool,

    /// Number of ticks to run in headless mode.
    #[arg(long, default_value_t = DEFAULT_HEADLESS_TICKS)]
    ticks: u32,
}

const CAST_KEYS: [(KeyCode, char); 5] = [
    (KeyCode::Q, 'Q'),
    (KeyCode::W, 'W'),
    (KeyCode::E, 'E'),
    (KeyCode::R, 'R'),
    (KeyCode::F, 'F'),
];

fn window_conf() -> Conf {
    Conf {
        window_title: "Wandfire".to_owned(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        window_resizable: false,
        ..Default::default()
    }
}

fn init_logging(args: &Args) {
    // RUST_LOG takes over from the built-in logger when present
    if std::env::var_os("RUST_LOG").is_some() {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Failed to initialize env_logger: {}", e);
        }
        return;
    }
    let level = logging::parse_level(&args.log_level);
    if let Err(e) = logging::init_logger(level, args.debug_filter.clone()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    if let Some(filter) = &args.debug_filter {
        for topic in logging::parse_debug_filter(filter) {
            if !logging::TOPICS.contains(&topic.as_str()) {
                warn!("Unknown debug topic '{}', available: {}", topic, logging::TOPICS.join(","));
            }
        }
    }
}

fn load_game(args: &Args) -> Game {
    let map = match &args.map {
        Some(path) => MapData::load(path),
        None => load_embedded_map(DEFAULT_MAP),
    };
    let map = match map {
        Ok(map) => map,
        Err(e) => {
            error!("Error loading map: {}", e);
            process::exit(1);
        }
    };

    let mut config = match &args.config {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Error loading configuration {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    Game::new(map, config, SpellBook::default(), AiPolicyTable::default())
}

fn log_events(game: &mut Game) -> Vec<SimEvent> {
    let events = game.drain_events();
    for event in &events {
        debug!("Event: {:?}", event);
    }
    events
}

fn run_headless(mut game: Game, ticks: u32) {
    info!("Running {} headless ticks", ticks);
    let idle = TickInput::idle();
    for _ in 0..ticks {
        game.tick(HEADLESS_FRAME_DELTA, &idle);
        log_events(&mut game);
        if game.outcome() != Outcome::InProgress {
            break;
        }
    }

    let snapshot = game.snapshot();
    info!(
        "Headless run finished at tick {}: {:?}, lives {}, score {}, {} enemies left",
        snapshot.tick,
        snapshot.outcome,
        snapshot.lives,
        snapshot.score,
        snapshot.enemies.len()
    );
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize final snapshot: {}", e),
    }
}

// Arrow keys move; the letter keys are spell bindings
fn read_input() -> TickInput {
    let mut direction = Point::ZERO;
    if is_key_down(KeyCode::Left) {
        direction.x -= 1.0;
    }
    if is_key_down(KeyCode::Right) {
        direction.x += 1.0;
    }
    if is_key_down(KeyCode::Up) {
        direction.y -= 1.0;
    }
    if is_key_down(KeyCode::Down) {
        direction.y += 1.0;
    }
    let casts = CAST_KEYS
        .iter()
        .filter(|(code, _)| is_key_pressed(*code))
        .map(|&(_, key)| key)
        .collect();
    TickInput { direction, casts }
}

async fn run_windowed(mut game: Game) {
    info!("Initializing macroquad rendering system");
    let mut renderer = render::Renderer::new();
    renderer.load_ui_font();
    renderer.load_zone_textures(game.map());
    let mut sounds = audio::AudioManager::new();
    sounds.load_assets().await;
    info!("Starting main loop...");

    while !render::Renderer::window_should_close() {
        let input = read_input();
        game.tick(get_frame_time() as f64, &input);
        for event in log_events(&mut game) {
            if let SimEvent::Sound(cue) = event {
                sounds.play(cue);
            }
        }
        renderer.draw_frame(game.map(), &game.snapshot());
        next_frame().await;
    }
    info!("Exiting Wandfire.");
}

fn main() {
    let args = Args::parse();
    init_logging(&args);
    info!("Initializing Wandfire...");

    let game = load_game(&args);
    if args.headless {
        run_headless(game, args.ticks);
    } else {
        macroquad::Window::from_config(window_conf(), run_windowed(game));
    }
}

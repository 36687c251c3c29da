use log::{info, warn};
use macroquad::prelude::*;
use std::collections::HashMap;
use wandfire::assets::get_asset_bytes;
use wandfire::config::{DOOR_WIDTH_TILES, HUD_HEIGHT, WALL_MARGIN_TILES};
use wandfire::entity::{DementorState, EnemyArchetype, EntityKind, EntityView};
use wandfire::map::{MapData, Side, Zone};
use wandfire::spell::SpellType;
use wandfire::types::{Facing, Point, Rgb};
use wandfire::utils::{blend_colors, shade};
use wandfire::{Outcome, Snapshot};

const FLOOR_COLOR: Rgb = Rgb::new(92, 84, 70);
const WALL_COLOR: Rgb = Rgb::new(48, 44, 40);
const DOOR_COLOR: Rgb = Rgb::new(120, 96, 60);
const WALK_BOB_RATE: f32 = 10.0; // Radians per second of walking
const WALK_BOB_HEIGHT: f32 = 2.0;

fn to_color(rgb: Rgb, alpha: f32) -> Color {
    Color::from_rgba(rgb.r, rgb.g, rgb.b, (alpha.clamp(0.0, 1.0) * 255.0) as u8)
}

fn kind_color(view: &EntityView) -> Rgb {
    match view.kind {
        EntityKind::Player => Rgb::new(200, 40, 40),
        EntityKind::Enemy(EnemyArchetype::Slytherin) => Rgb::new(30, 130, 60),
        EntityKind::Enemy(EnemyArchetype::DarkWizard) => Rgb::new(90, 40, 120),
        EntityKind::DeathEater => Rgb::new(20, 20, 20),
        EntityKind::Dementor => match view.dementor_state {
            Some(DementorState::Fleeing) => Rgb::new(150, 170, 190),
            Some(DementorState::Attached) => Rgb::new(40, 40, 70),
            _ => Rgb::new(70, 70, 90),
        },
    }
}

// Same green-yellow-red ramp as the status cards
fn health_color(ratio: f32) -> Color {
    if ratio > 0.5 {
        let t = (ratio - 0.5) * 2.0;
        Color::new(1.0 - t, 1.0, 0.0, 1.0)
    } else {
        Color::new(1.0, ratio * 2.0, 0.0, 1.0)
    }
}

/// Draws snapshots with a camera centred on the player.
pub struct Renderer {
    ui_font: Option<Font>,
    zone_textures: HashMap<String, Texture2D>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            ui_font: None,
            zone_textures: HashMap::new(),
        }
    }

    pub fn load_ui_font(&mut self) {
        match get_asset_bytes("fonts/ui.ttf") {
            Some(bytes) => match load_ttf_font_from_bytes(&bytes) {
                Ok(font) => self.ui_font = Some(font),
                Err(e) => log::error!("Failed to load UI font fonts/ui.ttf: {}", e),
            },
            None => info!("No UI font bundled, using the built-in font"),
        }
    }

    // Missing textures are not an error: the zone falls back to a shaded solid fill
    pub fn load_zone_textures(&mut self, map: &MapData) {
        for zone in &map.zones {
            let Some(name) = &zone.texture else {
                continue;
            };
            let path = format!("textures/{}.png", name);
            match get_asset_bytes(&path) {
                Some(bytes) => {
                    let texture = Texture2D::from_file_with_format(&bytes, None);
                    texture.set_filter(FilterMode::Nearest);
                    self.zone_textures.insert(zone.id.clone(), texture);
                }
                None => warn!("Texture '{}' for zone '{}' not found, using solid fill", path, zone.id),
            }
        }
    }

    pub fn draw_frame(&self, map: &MapData, snapshot: &Snapshot) {
        clear_background(BLACK);

        let view_h = screen_height() - HUD_HEIGHT;
        let camera = Point::new(
            snapshot.player.position.x - screen_width() as f64 / 2.0,
            snapshot.player.position.y - view_h as f64 / 2.0,
        );
        let to_screen = |p: Point| vec2((p.x - camera.x) as f32, (p.y - camera.y) as f32 + HUD_HEIGHT);

        for zone in &map.zones {
            self.draw_zone(map, zone, &to_screen);
        }

        for spell in &snapshot.spells {
            let pos = to_screen(spell.position);
            let color = to_color(spell.color, 1.0);
            if spell.spell_type == SpellType::Patronus {
                draw_circle(pos.x, pos.y, spell.radius as f32, faded(color, 0.8));
                draw_circle_lines(pos.x, pos.y, spell.radius as f32 * 2.5, 1.5, faded(color, 0.4));
            } else {
                draw_circle(pos.x, pos.y, spell.radius as f32, color);
            }
        }

        for beam in &snapshot.beams {
            let from = to_screen(beam.from);
            let to = to_screen(beam.to);
            let glow = blend_colors(beam.color, Rgb::new(255, 255, 255));
            draw_line(from.x, from.y, to.x, to.y, 6.0, to_color(beam.color, beam.alpha as f32 * 0.5));
            draw_line(from.x, from.y, to.x, to.y, 2.0, to_color(glow, beam.alpha as f32));
        }

        for spark in &snapshot.sparks {
            let pos = to_screen(spark.position);
            draw_circle(pos.x, pos.y, 2.0, to_color(spark.color, spark.alpha as f32));
        }

        for enemy in snapshot.enemies.iter().filter(|e| e.zone_id == snapshot.player.zone_id) {
            Self::draw_entity(enemy, to_screen(enemy.position));
        }
        Self::draw_entity(&snapshot.player, to_screen(snapshot.player.position));

        self.draw_hud(map, snapshot);
        if snapshot.outcome != Outcome::InProgress {
            if let Some(message) = &snapshot.message {
                self.draw_announcement(message);
            }
        }
    }

    fn draw_zone(&self, map: &MapData, zone: &Zone, to_screen: &impl Fn(Point) -> Vec2) {
        let ts = map.tile_size;
        let b = &zone.bounds;
        let origin = to_screen(Point::new(b.x as f64 * ts, b.y as f64 * ts));
        let (w, h) = ((b.width as f64 * ts) as f32, (b.height as f64 * ts) as f32);
        let margin = (WALL_MARGIN_TILES as f64 * ts) as f32;

        draw_rectangle(origin.x, origin.y, w, h, to_color(shade(WALL_COLOR, zone.lighting), 1.0));
        let (ix, iy, iw, ih) = (origin.x + margin, origin.y + margin, w - 2.0 * margin, h - 2.0 * margin);
        match self.zone_textures.get(&zone.id) {
            Some(texture) => {
                let tint = shade(Rgb::new(255, 255, 255), zone.lighting);
                draw_texture_ex(
                    texture,
                    ix,
                    iy,
                    to_color(tint, 1.0),
                    DrawTextureParams {
                        dest_size: Some(vec2(iw, ih)),
                        ..Default::default()
                    },
                );
            }
            None => draw_rectangle(ix, iy, iw, ih, to_color(shade(FLOOR_COLOR, zone.lighting), 1.0)),
        }

        let door_len = (DOOR_WIDTH_TILES as f64 * ts) as f32;
        for exit in &zone.exits {
            let center = to_screen(map.door_center(zone, exit));
            let (x, y, dw, dh) = match exit.side {
                Side::North => (center.x - door_len / 2.0, center.y, door_len, margin),
                Side::South => (center.x - door_len / 2.0, center.y - margin, door_len, margin),
                Side::West => (center.x, center.y - door_len / 2.0, margin, door_len),
                Side::East => (center.x - margin, center.y - door_len / 2.0, margin, door_len),
            };
            draw_rectangle(x, y, dw, dh, to_color(shade(DOOR_COLOR, zone.lighting), 1.0));
        }
        draw_rectangle_lines(origin.x, origin.y, w, h, 1.0, faded(GRAY, 0.5));
    }

    fn draw_entity(view: &EntityView, pos: Vec2) {
        let radius = view.radius as f32;
        // Walk bob
        let pos = if view.is_moving {
            pos + vec2(0.0, -(view.anim_time as f32 * WALK_BOB_RATE).sin().abs() * WALK_BOB_HEIGHT)
        } else {
            pos
        };
        let body = to_color(kind_color(view), if view.is_falling { 0.5 } else { 1.0 });
        draw_circle(pos.x, pos.y, radius, body);
        draw_circle_lines(pos.x, pos.y, radius, 1.0, LIGHTGRAY);

        let dir = match view.facing {
            Facing::Up => vec2(0.0, -1.0),
            Facing::Down => vec2(0.0, 1.0),
            Facing::Left => vec2(-1.0, 0.0),
            Facing::Right => vec2(1.0, 0.0),
        };
        let tip = pos + dir * (radius + if view.is_casting { 8.0 } else { 4.0 });
        draw_line(pos.x, pos.y, tip.x, tip.y, 2.0, if view.is_casting { YELLOW } else { WHITE });

        if view.is_stunned {
            draw_circle_lines(pos.x, pos.y, radius + 4.0, 2.0, GOLD);
        }

        let ratio = (view.health / view.max_health).clamp(0.0, 1.0) as f32;
        let bar_w = radius * 2.0;
        let bar_y = pos.y - radius - 8.0;
        draw_rectangle(pos.x - radius, bar_y, bar_w, 3.0, DARKGRAY);
        draw_rectangle(pos.x - radius, bar_y, bar_w * ratio, 3.0, health_color(ratio));
    }

    fn draw_hud(&self, map: &MapData, snapshot: &Snapshot) {
        draw_rectangle(0.0, 0.0, screen_width(), HUD_HEIGHT, Color::from_rgba(10, 10, 20, 230));
        let zone_name = map
            .zone(&snapshot.player.zone_id)
            .map_or(snapshot.player.zone_id.as_str(), |z| z.name.as_str());
        let mut line = format!(
            "{}   Lives {}   Health {:.0}   Score {}   Level {}",
            zone_name, snapshot.lives, snapshot.player.health, snapshot.score, snapshot.level
        );
        if snapshot.patronus_remaining > 0.0 {
            line.push_str(&format!("   Patronus {:.1}s", snapshot.patronus_remaining));
        }
        let params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: 20,
            color: WHITE,
            ..Default::default()
        };
        draw_text_ex(&line, 12.0, 20.0, params.clone());

        if snapshot.outcome == Outcome::InProgress {
            if let Some(message) = &snapshot.message {
                draw_text_ex(
                    message,
                    12.0,
                    40.0,
                    TextParams {
                        color: ORANGE,
                        font_size: 16,
                        ..params
                    },
                );
            }
        }
    }

    fn draw_announcement(&self, msg: &str) {
        let rect_width = 500.0;
        let rect_height = 120.0;
        let x = screen_width() / 2.0 - rect_width / 2.0;
        let y = screen_height() / 2.0 - rect_height / 2.0;
        draw_rectangle(x, y, rect_width, rect_height, Color::from_rgba(0, 0, 0, 180));

        let font_size = 32.0;
        let params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: font_size as u16,
            color: WHITE,
            ..Default::default()
        };
        let dims = measure_text(msg, self.ui_font.as_ref(), params.font_size, 1.0);
        let text_x = x + (rect_width - dims.width) / 2.0;
        let text_y = y + (rect_height - font_size) / 2.0 + font_size * 0.7;
        draw_text_ex(msg, text_x, text_y, params.clone());

        let hint = "Press ESC to exit";
        let hint_params = TextParams {
            font_size: 18,
            color: LIGHTGRAY,
            ..params
        };
        let hint_dims = measure_text(hint, self.ui_font.as_ref(), hint_params.font_size, 1.0);
        draw_text_ex(hint, x + (rect_width - hint_dims.width) / 2.0, y + rect_height - 28.0, hint_params);
    }

    pub fn window_should_close() -> bool {
        is_key_down(KeyCode::Escape) || is_quit_requested()
    }
}

fn faded(mut color: Color, alpha: f32) -> Color {
    color.a *= alpha;
    color
}

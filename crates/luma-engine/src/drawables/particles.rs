//! Particle systems: emitters spawning short-lived sprites.
//!
//! Emitter parameters are plain data (usually JSON); every random choice
//! goes through the system's own [`Rng`], so a seed reproduces a run.

use glam::Vec2;
use serde::Deserialize;

use super::rng::Rng;
use super::sprite::Sprite;
use crate::assets::Assets;
use crate::renderer::{BlendMode, Color, Renderer};

/// Value range sampled per particle. JSON: a number or `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "RangeRepr")]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    pub fn sample(&self, rng: &mut Rng) -> f32 {
        rng.range(self.min, self.max)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RangeRepr {
    Fixed(f32),
    Span([f32; 2]),
}

impl From<RangeRepr> for Range {
    fn from(repr: RangeRepr) -> Self {
        match repr {
            RangeRepr::Fixed(v) => Range::fixed(v),
            RangeRepr::Span([min, max]) => Range::new(min, max),
        }
    }
}

/// Where new particles appear, relative to the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnAreaMode {
    #[default]
    Point,
    /// Inside `spawn_rect` (`[x, y, width, height]`, offset from the emitter).
    Rect,
    /// Inside a circle of radius `spawn_circle_r`.
    Circle,
}

/// Order in which an emitter picks its textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureSelectionMode {
    Serial,
    Random,
    /// Every texture once in random order, then reshuffle.
    #[default]
    Shuffle,
}

/// Parameters of one emitter. Angles are degrees; times are seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleParams {
    pub spawn_area_mode: SpawnAreaMode,
    pub spawn_rect: [f32; 4],
    pub spawn_circle_r: f32,
    /// Texture or region paths in the asset registry.
    pub textures: Vec<String>,
    pub texture_selection_mode: TextureSelectionMode,
    pub blending_mode: BlendMode,
    /// Emitter position relative to the system.
    pub emitter_pos: Vec2,
    /// Live particles follow the system when it moves.
    pub attached: bool,
    /// Emission time; 0 emits forever.
    pub duration: f32,
    /// Live particle cap; 0 is unlimited.
    pub max_count: u32,
    pub spawn_count: Range,
    pub spawn_delay: f32,
    pub init_spawn_delay: f32,
    pub lifetime: Range,
    pub direction: Range,
    /// Take the direction from the emitter towards the spawn point instead
    /// of `direction`. Only meaningful for rect and circle areas.
    pub dir_from_emitter: bool,
    pub gravity: Vec2,
    pub speed_begin: Range,
    pub speed_end: Range,
    pub init_angle: Range,
    /// Degrees per second.
    pub rotate: Range,
    pub scale_begin: Range,
    pub scale_end: Range,
    pub alpha_begin: Range,
    pub alpha_end: Range,
    pub color_begin: Color,
    pub color_end: Color,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            spawn_area_mode: SpawnAreaMode::Point,
            spawn_rect: [0.0; 4],
            spawn_circle_r: 0.0,
            textures: Vec::new(),
            texture_selection_mode: TextureSelectionMode::Shuffle,
            blending_mode: BlendMode::Alpha,
            emitter_pos: Vec2::ZERO,
            attached: false,
            duration: 0.0,
            max_count: 0,
            spawn_count: Range::fixed(1.0),
            spawn_delay: 0.0,
            init_spawn_delay: 0.0,
            lifetime: Range::fixed(1.0),
            direction: Range::fixed(0.0),
            dir_from_emitter: false,
            gravity: Vec2::ZERO,
            speed_begin: Range::fixed(0.0),
            speed_end: Range::fixed(0.0),
            init_angle: Range::fixed(0.0),
            rotate: Range::fixed(0.0),
            scale_begin: Range::fixed(1.0),
            scale_end: Range::fixed(1.0),
            alpha_begin: Range::fixed(1.0),
            alpha_end: Range::fixed(1.0),
            color_begin: Color::WHITE,
            color_end: Color::WHITE,
        }
    }
}

/// JSON accepts one emitter object or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ParamsRepr {
    One(ParticleParams),
    Many(Vec<ParticleParams>),
}

#[derive(Debug, Clone)]
struct Particle {
    sprite: Sprite,
    lifetime: f32,
    total: f32,
    dir: Vec2,
    fall: Vec2,
    speed: (f32, f32),
    rotate: f32,
    scale: (f32, f32),
    alpha: (f32, f32),
}

impl Particle {
    fn is_dead(&self) -> bool {
        self.lifetime <= 0.0
    }

    fn update(&mut self, dt: f32, params: &ParticleParams) {
        self.lifetime = (self.lifetime - dt).max(0.0);
        let t = if self.total > 0.0 {
            1.0 - self.lifetime / self.total
        } else {
            1.0
        };
        let lerp = |(begin, end): (f32, f32)| begin + (end - begin) * t;

        self.fall += params.gravity * dt;
        let velocity = self.dir * lerp(self.speed) + self.fall;
        self.sprite.set_pos(self.sprite.pos() + velocity * dt);
        self.sprite.set_angle(self.sprite.angle() + self.rotate * dt);
        self.sprite.set_scale(Vec2::splat(lerp(self.scale)));
        self.sprite.set_color(params.color_begin.lerp(params.color_end, t));
        self.sprite.set_alpha(lerp(self.alpha));
    }
}

#[derive(Debug, Clone)]
struct Emitter {
    params: ParticleParams,
    sprites: Vec<Sprite>,
    order: Vec<usize>,
    cursor: usize,
    pos: Vec2,
    elapsed: f32,
    timer: f32,
    particles: Vec<Particle>,
}

impl Emitter {
    fn new(assets: &Assets, params: ParticleParams, rng: &mut Rng) -> Self {
        let sprites: Vec<Sprite> = params
            .textures
            .iter()
            .filter_map(|path| Sprite::from_path(assets, path))
            .map(|mut sprite| {
                sprite.set_origin_to_center();
                sprite.set_blend(params.blending_mode);
                sprite
            })
            .collect();
        if sprites.is_empty() {
            log::error!("Particle emitter must have at least one texture or texture region");
        }
        let mut order: Vec<usize> = (0..sprites.len()).collect();
        if params.texture_selection_mode == TextureSelectionMode::Shuffle {
            rng.shuffle(&mut order);
        }
        Self {
            timer: params.init_spawn_delay,
            pos: params.emitter_pos,
            params,
            sprites,
            order,
            cursor: 0,
            elapsed: 0.0,
            particles: Vec::new(),
        }
    }

    fn is_emitting(&self) -> bool {
        !self.sprites.is_empty() && (self.params.duration <= 0.0 || self.elapsed < self.params.duration)
    }

    fn next_sprite(&mut self, rng: &mut Rng) -> Option<Sprite> {
        let count = self.sprites.len();
        if count == 0 {
            return None;
        }
        let index = match self.params.texture_selection_mode {
            TextureSelectionMode::Random => rng.next_int(count as u32) as usize,
            TextureSelectionMode::Serial => {
                let index = self.cursor % count;
                self.cursor = (self.cursor + 1) % count;
                index
            }
            TextureSelectionMode::Shuffle => {
                if self.cursor >= count {
                    rng.shuffle(&mut self.order);
                    self.cursor = 0;
                }
                let index = self.order[self.cursor];
                self.cursor += 1;
                index
            }
        };
        self.sprites.get(index).cloned()
    }

    fn spawn_offset(&self, rng: &mut Rng) -> Vec2 {
        match self.params.spawn_area_mode {
            SpawnAreaMode::Point => Vec2::ZERO,
            SpawnAreaMode::Rect => {
                let [x, y, width, height] = self.params.spawn_rect;
                Vec2::new(x + rng.range(0.0, width), y + rng.range(0.0, height))
            }
            SpawnAreaMode::Circle => {
                let r = rng.range(0.0, self.params.spawn_circle_r);
                Vec2::from_angle(rng.range(0.0, 360.0).to_radians()) * r
            }
        }
    }

    fn emit(&mut self, rng: &mut Rng) {
        let count = rng.range_int(
            self.params.spawn_count.min.round() as i32,
            self.params.spawn_count.max.round() as i32,
        );
        for _ in 0..count.max(0) {
            let max = self.params.max_count as usize;
            if max > 0 && self.particles.len() >= max {
                return;
            }
            let Some(mut sprite) = self.next_sprite(rng) else {
                return;
            };
            let offset = self.spawn_offset(rng);
            let p = &self.params;
            let dir = if p.dir_from_emitter && offset != Vec2::ZERO {
                offset.normalize()
            } else {
                Vec2::from_angle(p.direction.sample(rng).to_radians())
            };
            sprite.set_pos(self.pos + offset);
            sprite.set_angle(p.init_angle.sample(rng));

            let lifetime = p.lifetime.sample(rng).max(0.0);
            let mut particle = Particle {
                sprite,
                lifetime,
                total: lifetime,
                dir,
                fall: Vec2::ZERO,
                speed: (p.speed_begin.sample(rng), p.speed_end.sample(rng)),
                rotate: p.rotate.sample(rng),
                scale: (p.scale_begin.sample(rng).max(0.0), p.scale_end.sample(rng).max(0.0)),
                alpha: (p.alpha_begin.sample(rng), p.alpha_end.sample(rng)),
            };
            particle.update(0.0, p);
            self.particles.push(particle);
        }
    }

    fn update(&mut self, dt: f32, rng: &mut Rng) {
        for particle in &mut self.particles {
            particle.update(dt, &self.params);
        }
        self.particles.retain(|p| !p.is_dead());

        if self.is_emitting() {
            self.timer -= dt;
            if self.timer <= 0.0 {
                self.emit(rng);
                self.timer = self.params.spawn_delay;
            }
        }
        self.elapsed += dt;
    }

    fn move_to(&mut self, system_pos: Vec2) {
        let pos = system_pos + self.params.emitter_pos;
        if self.params.attached {
            let delta = pos - self.pos;
            for particle in &mut self.particles {
                particle.sprite.set_pos(particle.sprite.pos() + delta);
            }
        }
        self.pos = pos;
    }
}

/// Set of emitters sharing a position and a random generator.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    emitters: Vec<Emitter>,
    pos: Vec2,
    rng: Rng,
}

impl ParticleSystem {
    pub fn new(assets: &Assets, params: Vec<ParticleParams>, seed: u64) -> Self {
        let mut rng = Rng::new(seed);
        let emitters = params
            .into_iter()
            .map(|p| Emitter::new(assets, p, &mut rng))
            .collect();
        Self {
            emitters,
            pos: Vec2::ZERO,
            rng,
        }
    }

    /// Build from a JSON emitter object or list. Malformed JSON is logged.
    pub fn from_json(assets: &Assets, json: &str, seed: u64) -> Option<Self> {
        match serde_json::from_str::<ParamsRepr>(json) {
            Ok(ParamsRepr::One(params)) => Some(Self::new(assets, vec![params], seed)),
            Ok(ParamsRepr::Many(params)) => Some(Self::new(assets, params, seed)),
            Err(err) => {
                log::error!("Invalid particle system description: {err}");
                None
            }
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
        for emitter in &mut self.emitters {
            emitter.move_to(pos);
        }
    }

    pub fn particle_count(&self) -> usize {
        self.emitters.iter().map(|e| e.particles.len()).sum()
    }

    /// No emitter will spawn again and every particle has died.
    pub fn is_finished(&self) -> bool {
        self.emitters
            .iter()
            .all(|e| !e.is_emitting() && e.particles.is_empty())
    }

    pub fn update(&mut self, dt: f32) {
        for emitter in &mut self.emitters {
            emitter.update(dt, &mut self.rng);
        }
    }

    pub fn render(&self, renderer: &mut Renderer, assets: &Assets) {
        for particle in self.emitters.iter().flat_map(|e| &e.particles) {
            particle.sprite.render(renderer, assets);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::files::{FileLocation, MemoryFileSystem};
    use crate::platform::image::{ColorFormat, Image, ImageCodec, RawCodec};
    use crate::renderer::{Camera, HeadlessBackend};

    fn setup() -> (Renderer, Assets) {
        let mut renderer = Renderer::new(
            Box::new(HeadlessBackend::new()),
            Camera::new(100.0, 100.0, Vec2::splat(100.0)),
        );
        let image = RawCodec
            .encode(&Image::new(4, 4, ColorFormat::Rgba))
            .unwrap_or_default();
        let mut files = MemoryFileSystem::new();
        files.insert("fx/spark.png", image.clone(), FileLocation::Assets);
        files.insert("fx/smoke.png", image, FileLocation::Assets);
        let mut assets = Assets::new(Box::new(files), Box::new(RawCodec), "", 1.0);
        assets.load_all(renderer.backend_mut());
        (renderer, assets)
    }

    #[test]
    fn params_from_json() {
        let json = r#"{
            "textures": ["fx/spark"],
            "spawnAreaMode": "circle",
            "spawnCircleR": 5,
            "blendingMode": "additive",
            "lifetime": [0.5, 1.5],
            "speedBegin": 10,
            "gravity": [0, -9.8],
            "colorBegin": [255, 0, 0]
        }"#;
        let params: ParticleParams = match serde_json::from_str(json) {
            Ok(params) => params,
            Err(err) => panic!("{err}"),
        };
        assert_eq!(params.spawn_area_mode, SpawnAreaMode::Circle);
        assert_eq!(params.blending_mode, BlendMode::Additive);
        assert_eq!(params.lifetime, Range::new(0.5, 1.5));
        assert_eq!(params.speed_begin, Range::fixed(10.0));
        assert_eq!(params.gravity, Vec2::new(0.0, -9.8));
        assert_eq!(params.color_begin, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(params.texture_selection_mode, TextureSelectionMode::Shuffle);
    }

    #[test]
    fn same_seed_same_run() {
        let (_, assets) = setup();
        let json = r#"{"textures": ["fx/spark", "fx/smoke"], "spawnAreaMode": "rect",
            "spawnRect": [0, 0, 10, 10], "spawnCount": [1, 3], "direction": [0, 360], "speedBegin": 5}"#;
        let run = |seed| {
            let Some(mut system) = ParticleSystem::from_json(&assets, json, seed) else {
                panic!("bad json");
            };
            for _ in 0..5 {
                system.update(0.1);
            }
            system
                .emitters
                .iter()
                .flat_map(|e| e.particles.iter().map(|p| p.sprite.pos()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
        assert!(!run(3).is_empty());
    }

    #[test]
    fn spawn_rect_bounds() {
        let (_, assets) = setup();
        let params = ParticleParams {
            textures: vec!["fx/spark".to_string()],
            spawn_area_mode: SpawnAreaMode::Rect,
            spawn_rect: [10.0, 20.0, 5.0, 5.0],
            spawn_count: Range::fixed(50.0),
            lifetime: Range::fixed(10.0),
            ..ParticleParams::default()
        };
        let mut system = ParticleSystem::new(&assets, vec![params], 11);
        system.update(0.0);
        assert_eq!(system.particle_count(), 50);
        for p in &system.emitters[0].particles {
            let pos = p.sprite.pos();
            assert!((10.0..=15.0).contains(&pos.x), "{pos}");
            assert!((20.0..=25.0).contains(&pos.y), "{pos}");
        }
    }

    #[test]
    fn lifetime_duration_and_cap() {
        let (_, assets) = setup();
        let params = ParticleParams {
            textures: vec!["fx/spark".to_string()],
            spawn_count: Range::fixed(4.0),
            max_count: 6,
            duration: 0.25,
            spawn_delay: 0.1,
            lifetime: Range::fixed(0.5),
            ..ParticleParams::default()
        };
        let mut system = ParticleSystem::new(&assets, vec![params], 1);
        system.update(0.0);
        assert_eq!(system.particle_count(), 4);
        system.update(0.125);
        assert_eq!(system.particle_count(), 6);
        for _ in 0..10 {
            system.update(0.125);
        }
        assert_eq!(system.particle_count(), 0);
        assert!(system.is_finished());
    }

    #[test]
    fn particles_fade_and_fall() {
        let (_, assets) = setup();
        let params = ParticleParams {
            textures: vec!["fx/spark".to_string()],
            duration: 0.01,
            lifetime: Range::fixed(1.0),
            alpha_begin: Range::fixed(1.0),
            alpha_end: Range::fixed(0.0),
            gravity: Vec2::new(0.0, -10.0),
            ..ParticleParams::default()
        };
        let mut system = ParticleSystem::new(&assets, vec![params], 1);
        system.update(0.0);
        system.update(0.5);
        let particle = &system.emitters[0].particles[0];
        assert!((particle.sprite.alpha() - 0.5).abs() < 1e-5);
        assert!((particle.sprite.pos().y + 2.5).abs() < 1e-5);
    }

    #[test]
    fn attached_particles_follow_system() {
        let (_, assets) = setup();
        let params = ParticleParams {
            textures: vec!["fx/spark".to_string()],
            attached: true,
            duration: 0.01,
            lifetime: Range::fixed(5.0),
            ..ParticleParams::default()
        };
        let mut system = ParticleSystem::new(&assets, vec![params], 1);
        system.update(0.0);
        system.set_pos(Vec2::new(3.0, 4.0));
        assert_eq!(system.emitters[0].particles[0].sprite.pos(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn renders_in_one_batch() {
        let (mut renderer, assets) = setup();
        let params = ParticleParams {
            textures: vec!["fx/spark".to_string()],
            spawn_count: Range::fixed(10.0),
            ..ParticleParams::default()
        };
        let mut system = ParticleSystem::new(&assets, vec![params], 5);
        system.update(0.0);
        renderer.begin_render();
        system.render(&mut renderer, &assets);
        renderer.end_render();
        assert_eq!(renderer.stats().render_calls, 1);
        assert_eq!(renderer.stats().rendered_vertices, 60);
    }
}

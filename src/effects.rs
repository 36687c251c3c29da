// Transient cosmetic effects: spell-clash beams and impact sparks.
// Nothing here feeds back into gameplay.

use crate::types::{Point, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Beam {
    pub from: Point,
    pub to: Point,
    pub color: Rgb,
    lifetime: f64,
    initial_lifetime: f64,
}

impl Beam {
    fn alpha(&self) -> f64 {
        (self.lifetime / self.initial_lifetime).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
struct Spark {
    position: Point,
    velocity: Point,
    color: Rgb,
    lifetime: f64,
    initial_lifetime: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeamView {
    pub from: Point,
    pub to: Point,
    pub color: Rgb,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparkView {
    pub position: Point,
    pub color: Rgb,
    pub alpha: f64,
}

#[derive(Debug)]
pub struct EffectSystem {
    beams: Vec<Beam>,
    sparks: Vec<Spark>,
    beam_lifetime: f64,
    rng: StdRng,
}

impl EffectSystem {
    pub fn new(beam_lifetime: f64) -> Self {
        EffectSystem {
            beams: Vec::new(),
            sparks: Vec::new(),
            beam_lifetime,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn spawn_beam(&mut self, from: Point, to: Point, color: Rgb) {
        self.beams.push(Beam {
            from,
            to,
            color,
            lifetime: self.beam_lifetime,
            initial_lifetime: self.beam_lifetime,
        });
    }

    // Radial burst where a spell landed
    pub fn spawn_sparks(&mut self, position: Point, color: Rgb, count: usize, max_speed: f64) {
        for _ in 0..count {
            let angle = self.rng.r#gen::<f64>() * std::f64::consts::TAU;
            let speed = self.rng.r#gen::<f64>() * max_speed;
            let lifetime = 0.2 + self.rng.r#gen::<f64>() * 0.3;
            self.sparks.push(Spark {
                position,
                velocity: Point::new(angle.cos() * speed, angle.sin() * speed),
                color,
                lifetime,
                initial_lifetime: lifetime,
            });
        }
    }

    pub fn update(&mut self, dt: f64) {
        for beam in self.beams.iter_mut() {
            beam.lifetime -= dt;
        }
        self.beams.retain(|b| b.lifetime > 0.0);

        for spark in self.sparks.iter_mut() {
            spark.position += spark.velocity * dt;
            spark.lifetime -= dt;
        }
        self.sparks.retain(|s| s.lifetime > 0.0);
    }

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    pub fn beam_views(&self) -> Vec<BeamView> {
        self.beams
            .iter()
            .map(|b| BeamView {
                from: b.from,
                to: b.to,
                color: b.color,
                alpha: b.alpha(),
            })
            .collect()
    }

    pub fn spark_views(&self) -> Vec<SparkView> {
        self.sparks
            .iter()
            .map(|s| SparkView {
                position: s.position,
                color: s.color,
                alpha: (s.lifetime / s.initial_lifetime).clamp(0.0, 1.0),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_beam_fades_and_expires() {
        let mut effects = EffectSystem::new(0.4);
        effects.spawn_beam(Point::ZERO, Point::new(10.0, 0.0), Rgb::new(255, 0, 0));
        effects.update(0.1);
        let views = effects.beam_views();
        assert_eq!(views.len(), 1);
        assert_approx_eq!(views[0].alpha, 0.75);
        effects.update(0.35);
        assert!(effects.beams().is_empty());
    }

    #[test]
    fn test_sparks_expire() {
        let mut effects = EffectSystem::new(0.4);
        effects.spawn_sparks(Point::new(5.0, 5.0), Rgb::new(255, 255, 255), 12, 100.0);
        assert_eq!(effects.spark_views().len(), 12);
        effects.update(0.6);
        assert!(effects.spark_views().is_empty());
    }
}

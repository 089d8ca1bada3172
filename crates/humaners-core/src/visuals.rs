// ─────────────────────────────────────────────────────────────────────
// HumanERS — Cosmetic Visual State
// ─────────────────────────────────────────────────────────────────────
//! Particles and touch ripples advanced once per animation frame.
//!
//! Nothing here feeds the threat score except the live touch count and
//! pressure, which drive the simulation generator. All randomness comes
//! from the caller's RNG so frames are reproducible under a fixed seed.

use rand::Rng;
use serde::Serialize;

use humaners_types::clamp01;
use humaners_types::config::VisualConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub life: f64,
    pub decay: f64,
}

pub struct ParticleField {
    particles: Vec<Particle>,
    max: usize,
    spawn_rate: f64,
    width: f64,
    height: f64,
}

impl ParticleField {
    pub fn new(cfg: &VisualConfig) -> Self {
        Self {
            particles: Vec::with_capacity(cfg.max_particles + 1),
            max: cfg.max_particles,
            spawn_rate: cfg.spawn_rate,
            width: cfg.width,
            height: cfg.height,
        }
    }

    /// Spawn with probability `threat * spawn_rate`, move, age and cap.
    pub fn step<R: Rng>(&mut self, threat: f64, rng: &mut R) {
        if rng.gen::<f64>() < clamp01(threat) * self.spawn_rate {
            self.particles.push(Particle {
                x: rng.gen::<f64>() * self.width,
                y: rng.gen::<f64>() * self.height,
                vx: (rng.gen::<f64>() - 0.5) * 4.0,
                vy: (rng.gen::<f64>() - 0.5) * 4.0,
                life: 1.0,
                decay: 0.01 + rng.gen::<f64>() * 0.02,
            });
        }

        self.particles.retain_mut(|p| {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= p.decay;
            p.life > 0.0
        });

        if self.particles.len() > self.max {
            let excess = self.particles.len() - self.max;
            self.particles.drain(..excess);
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
    pub intensity: f64,
    pub life: f64,
}

pub struct TouchField {
    points: Vec<TouchPoint>,
    decay: f64,
}

impl TouchField {
    pub fn new(cfg: &VisualConfig) -> Self {
        Self {
            points: Vec::new(),
            decay: cfg.touch_decay,
        }
    }

    /// Record a pointer/touch event. Without a pressure reading the
    /// intensity is drawn from [0.5, 1.0).
    pub fn add<R: Rng>(&mut self, x: f64, y: f64, pressure: Option<f64>, rng: &mut R) {
        let intensity = match pressure {
            Some(p) if p.is_finite() && p > 0.0 => clamp01(p),
            _ => rng.gen::<f64>() * 0.5 + 0.5,
        };
        self.points.push(TouchPoint {
            x,
            y,
            intensity,
            life: 1.0,
        });
    }

    pub fn step(&mut self) {
        let decay = self.decay;
        self.points.retain_mut(|p| {
            p.life -= decay;
            p.life > 0.0
        });
    }

    pub fn points(&self) -> &[TouchPoint] {
        &self.points
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Mean intensity of live points, 0 when idle.
    pub fn mean_intensity(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.intensity).sum::<f64>() / self.points.len() as f64
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_no_particles_at_zero_threat() {
        let mut field = ParticleField::new(&VisualConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            field.step(0.0, &mut rng);
        }
        assert!(field.particles().is_empty());
    }

    #[test]
    fn test_particle_cap() {
        let cfg = VisualConfig {
            max_particles: 5,
            spawn_rate: 1.0,
            ..VisualConfig::default()
        };
        let mut field = ParticleField::new(&cfg);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            field.step(1.0, &mut rng);
            assert!(field.particles().len() <= 5);
        }
        assert_eq!(field.particles().len(), 5);
    }

    #[test]
    fn test_particles_expire() {
        let cfg = VisualConfig {
            spawn_rate: 1.0,
            ..VisualConfig::default()
        };
        let mut field = ParticleField::new(&cfg);
        let mut rng = StdRng::seed_from_u64(3);
        field.step(1.0, &mut rng);
        assert_eq!(field.particles().len(), 1);
        // decay >= 0.01 per frame, so 100 frames without spawning clears it
        for _ in 0..100 {
            field.step(0.0, &mut rng);
        }
        assert!(field.particles().is_empty());
    }

    #[test]
    fn test_same_seed_same_particles() {
        let cfg = VisualConfig {
            spawn_rate: 1.0,
            ..VisualConfig::default()
        };
        let mut a = ParticleField::new(&cfg);
        let mut b = ParticleField::new(&cfg);
        let mut ra = StdRng::seed_from_u64(9);
        let mut rb = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            a.step(0.7, &mut ra);
            b.step(0.7, &mut rb);
        }
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_touch_points_fade() {
        let mut touches = TouchField::new(&VisualConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        touches.add(10.0, 10.0, None, &mut rng);
        assert!((0.5..1.0).contains(&touches.points()[0].intensity));
        for _ in 0..49 {
            touches.step();
        }
        assert_eq!(touches.count(), 1);
        // life 1.0 - 50 * 0.02 reaches 0
        touches.step();
        assert_eq!(touches.count(), 0);
    }

    #[test]
    fn test_touch_pressure_used() {
        let mut touches = TouchField::new(&VisualConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        touches.add(0.0, 0.0, Some(0.3), &mut rng);
        assert!((touches.mean_intensity() - 0.3).abs() < 1e-12);
    }
}

use crate::track::EntityId;
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use ultraviolet::Vec3;

/// Linear RGB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color(Vec3);

impl From<Vec3> for Color {
    fn from(v: Vec3) -> Self {
        Self(v)
    }
}

impl From<Color> for Vec3 {
    fn from(c: Color) -> Self {
        c.0
    }
}

impl Color {
    pub const BACKGROUND: Color = Color(Vec3 {
        x: 0.01,
        y: 0.01,
        z: 0.02,
    });

    /// Stable marker color, bright enough to see on the background.
    pub fn for_entity(entity: EntityId) -> Self {
        let mut rng = XorShiftRng::seed_from_u64(entity.index() as u64);
        let [r, g, b] = rng.gen::<[f32; 3]>();
        Self(Vec3::new(r, g, b) * 0.75 + Vec3::broadcast(0.25))
    }

    fn sqrt(self) -> Self {
        Self(Vec3::new(self.0.x.sqrt(), self.0.y.sqrt(), self.0.z.sqrt()))
    }

    fn clamp(self, min: f32, max: f32) -> Color {
        Self(self.0.clamped(Vec3::broadcast(min), Vec3::broadcast(max)))
    }
}

pub const COLOR_CHANNELS: usize = 3;
pub type OutputColor = [u8; COLOR_CHANNELS];

impl From<Color> for OutputColor {
    fn from(color: Color) -> Self {
        let c = Vec3::from(color.sqrt().clamp(0., 0.999)) * 256.;
        [c.x as u8, c.y as u8, c.z as u8]
    }
}

use std::time::Duration;
use thiserror::Error;
use ultraviolet::{Vec2, Vec3};

pub const NEAR: f32 = 0.1;

const MAX_PITCH: f32 = 89. * std::f32::consts::PI / 180.;

#[derive(Error, Debug, PartialEq)]
#[error("unknown key {0:?}, expected some of \"wasdqe\"")]
pub struct UnknownKey(pub char);

/// Movement keys held down during a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl KeyState {
    /// w forward, s back, a left, d right, e up, q down.
    pub fn parse(keys: &str) -> Result<Self, UnknownKey> {
        let mut state = Self::default();
        for key in keys.chars() {
            let held = match key.to_ascii_lowercase() {
                'w' => &mut state.forward,
                's' => &mut state.back,
                'a' => &mut state.left,
                'd' => &mut state.right,
                'e' => &mut state.up,
                'q' => &mut state.down,
                _ => return Err(UnknownKey(key)),
            };
            *held = true;
        }
        Ok(state)
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    positive as i32 as f32 - negative as i32 as f32
}

#[derive(Clone, Debug)]
pub struct FreeFlyCamera {
    position: Vec3,
    /// Radians, 0 looks down -z and positive turns right.
    yaw: f32,
    /// Radians, positive looks up.
    pitch: f32,
    vertical_fov_degrees: f32,
    far: f32,
}

impl FreeFlyCamera {
    pub fn new(
        position: Vec3,
        yaw_degrees: f32,
        pitch_degrees: f32,
        vertical_fov_degrees: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            yaw: yaw_degrees.to_radians(),
            pitch: pitch_degrees.to_radians().max(-MAX_PITCH).min(MAX_PITCH),
            vertical_fov_degrees,
            far,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
    }

    /// Right handed basis: right, up and forward.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let cw = self.forward();
        let cu = cw.cross(Vec3::unit_y()).normalized();
        let cv = cu.cross(cw);
        (cu, cv, cw)
    }

    pub fn look_at(&mut self, target: Vec3) {
        let direction = target - self.position;
        if direction.mag_sq() == 0. {
            return;
        }
        let direction = direction.normalized();
        self.yaw = direction.x.atan2(-direction.z);
        self.pitch = direction.y.asin().max(-MAX_PITCH).min(MAX_PITCH);
    }

    /// Turns by a pointer delta in pixels, `sensitivity` degrees per pixel.
    pub fn look(&mut self, delta: Vec2, sensitivity: f32) {
        self.yaw += (delta.x * sensitivity).to_radians();
        self.pitch = (self.pitch - (delta.y * sensitivity).to_radians())
            .max(-MAX_PITCH)
            .min(MAX_PITCH);
    }

    /// Moves along the view basis, up and down along world y.
    pub fn fly(&mut self, keys: KeyState, dt: Duration, speed: f32) {
        let (right, _, forward) = self.basis();
        let movement = forward * axis(keys.forward, keys.back)
            + right * axis(keys.right, keys.left)
            + Vec3::unit_y() * axis(keys.up, keys.down);
        if movement.mag_sq() > 0. {
            self.position += movement.normalized() * speed * dt.as_secs_f32();
        }
    }

    /// Camera space coordinates, z being the distance in front of the camera.
    pub fn view(&self, point: Vec3) -> Vec3 {
        let (cu, cv, cw) = self.basis();
        let d = point - self.position;
        Vec3::new(d.dot(cu), d.dot(cv), d.dot(cw))
    }

    /// Pixel coordinates of a camera space point in front of the near plane.
    pub fn project_view(&self, v: Vec3, width: usize, height: usize) -> Vec2 {
        let aspect_ratio = width as f32 / height as f32;
        let theta = self.vertical_fov_degrees.to_radians();
        let viewport_height = 2. * (theta / 2.).tan();
        let viewport_width = aspect_ratio * viewport_height;

        // Viewport plane at distance 1, y growing downward in the image
        let u = v.x / v.z / viewport_width + 0.5;
        let w = 0.5 - v.y / v.z / viewport_height;
        Vec2::new(u * width as f32, w * height as f32)
    }

    /// `None` when the point is outside the near and far planes.
    pub fn project(&self, point: Vec3, width: usize, height: usize) -> Option<Vec2> {
        let v = self.view(point);
        if v.z < NEAR || v.z > self.far {
            return None;
        }
        Some(self.project_view(v, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).mag() < 1e-5
    }

    #[test]
    fn test_default_orientation_looks_down_negative_z() {
        let camera = FreeFlyCamera::new(Vec3::zero(), 0., 0., 60., 100.);
        assert!(close(camera.forward(), Vec3::new(0., 0., -1.)));
        assert!(close(camera.view(Vec3::new(1., 2., -5.)), Vec3::new(1., 2., 5.)));
    }

    #[test]
    fn test_project_center_and_planes() {
        let camera = FreeFlyCamera::new(Vec3::zero(), 0., 0., 90., 100.);
        let center = camera.project(Vec3::new(0., 0., -5.), 200, 100).unwrap();
        assert!((center - Vec2::new(100., 50.)).mag() < 1e-4);

        // 90 degrees vertical: at depth 1 the top edge is y = 1
        let top = camera.project(Vec3::new(0., 1., -1.), 200, 100).unwrap();
        assert!(top.y.abs() < 1e-4);

        assert!(camera.project(Vec3::new(0., 0., 5.), 200, 100).is_none());
        assert!(camera.project(Vec3::new(0., 0., -0.05), 200, 100).is_none());
        assert!(camera.project(Vec3::new(0., 0., -101.), 200, 100).is_none());
    }

    #[test]
    fn test_look_at() {
        let mut camera = FreeFlyCamera::new(Vec3::new(0., 0., 10.), 0., 0., 60., 100.);
        camera.look_at(Vec3::new(10., 0., 10.));
        assert!(close(camera.forward(), Vec3::new(1., 0., 0.)));

        camera.look_at(Vec3::new(0., 10., 10.));
        assert!(camera.forward().y > 0.99);
    }

    #[test]
    fn test_look_clamps_pitch() {
        let mut camera = FreeFlyCamera::new(Vec3::zero(), 0., 0., 60., 100.);
        camera.look(Vec2::new(0., -10_000.), 0.1);
        assert!((camera.pitch - MAX_PITCH).abs() < 1e-6);

        camera.look(Vec2::new(900., 0.), 0.1);
        let forward = camera.forward();
        assert!(forward.x > 0. && forward.z.abs() < 1e-5);
    }

    #[test]
    fn test_fly() {
        let mut camera = FreeFlyCamera::new(Vec3::zero(), 90., 0., 60., 100.);
        let keys = KeyState::parse("w").unwrap();
        camera.fly(keys, Duration::from_secs(2), 3.);
        assert!(close(camera.position(), Vec3::new(6., 0., 0.)));

        // Opposite keys cancel out
        camera.fly(KeyState::parse("adqe").unwrap(), Duration::from_secs(1), 3.);
        assert!(close(camera.position(), Vec3::new(6., 0., 0.)));

        camera.fly(KeyState::parse("E").unwrap(), Duration::from_secs(1), 3.);
        assert!(close(camera.position(), Vec3::new(6., 3., 0.)));
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(KeyState::parse(""), Ok(KeyState::default()));
        let keys = KeyState::parse("sd").unwrap();
        assert!(keys.back && keys.right && !keys.forward);
        assert_eq!(KeyState::parse("wx"), Err(UnknownKey('x')));
    }
}

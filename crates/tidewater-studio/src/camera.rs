use glam::{Mat4, Vec3};

/// Camera orbiting the origin on a sphere.
#[derive(Debug, Copy, Clone)]
pub struct OrbitCamera {
    pub theta: f32,
    pub phi: f32,
    pub radius: f32,
    pub fov_y: f32,
    pub near_z: f32,
    pub far_z: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            theta: 1.5 * std::f32::consts::PI,
            phi: std::f32::consts::FRAC_PI_2 - 0.1,
            radius: 50.0,
            fov_y: 0.25 * std::f32::consts::PI,
            near_z: 1.0,
            far_z: 1000.0,
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sp, cp) = self.phi.sin_cos();
        let (st, ct) = self.theta.sin_cos();
        Vec3::new(self.radius * sp * ct, self.radius * cp, self.radius * sp * st)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near_z, self.far_z)
    }

    /// Slow turn around the scene, in radians per second.
    pub fn orbit(&mut self, dt: f32, speed: f32) {
        self.theta = (self.theta + speed * dt).rem_euclid(std::f32::consts::TAU);
    }
}

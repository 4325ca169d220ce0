use glam::Vec3;

use super::SimError;

/// Grid shape and physical constants of a [`HeightField`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WaveParams {
    pub rows: usize,
    pub cols: usize,
    /// Distance between adjacent grid points.
    pub spacing: f32,
    /// Fixed integration step in seconds.
    pub time_step: f32,
    pub wave_speed: f32,
    pub damping: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            rows: 128,
            cols: 128,
            spacing: 1.0,
            time_step: 0.03,
            wave_speed: 4.0,
            damping: 0.2,
        }
    }
}

impl WaveParams {
    /// `speed * dt / dx`; the explicit scheme diverges above `1/sqrt(2)`.
    pub fn courant(&self) -> f32 {
        self.wave_speed * self.time_step / self.spacing
    }

    fn validate(&self) -> Result<(), SimError> {
        if self.rows < 3 || self.cols < 3 {
            return Err(SimError::InvalidParams("grid must be at least 3x3"));
        }
        if self.rows.saturating_mul(self.cols) > u32::MAX as usize {
            return Err(SimError::InvalidParams("grid has too many vertices for 32-bit indices"));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(SimError::InvalidParams("spacing must be positive"));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(SimError::InvalidParams("time step must be positive"));
        }
        if !(self.wave_speed.is_finite() && self.wave_speed >= 0.0) {
            return Err(SimError::InvalidParams("wave speed must be non-negative"));
        }
        if !(self.damping.is_finite() && self.damping >= 0.0) {
            return Err(SimError::InvalidParams("damping must be non-negative"));
        }

        let courant = self.courant();
        if courant > std::f32::consts::FRAC_1_SQRT_2 {
            return Err(SimError::Unstable { courant });
        }
        Ok(())
    }
}

/// Damped 2D wave equation on a regular grid, integrated with a fixed step.
///
/// Heights live on the XZ plane centred at the origin. Border rows and columns
/// are held at rest.
#[derive(Debug, Clone)]
pub struct HeightField {
    params: WaveParams,
    k1: f32,
    k2: f32,
    k3: f32,
    accumulated: f32,
    steps: u64,

    prev: Vec<f32>,
    curr: Vec<f32>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
}

impl HeightField {
    pub fn new(params: WaveParams) -> Result<Self, SimError> {
        params.validate()?;

        let dt = params.time_step;
        let d = params.damping * dt + 2.0;
        let e = (params.wave_speed * params.wave_speed) * (dt * dt) / (params.spacing * params.spacing);

        let n = params.rows * params.cols;
        Ok(Self {
            params,
            k1: (params.damping * dt - 2.0) / d,
            k2: (4.0 - 8.0 * e) / d,
            k3: (2.0 * e) / d,
            accumulated: 0.0,
            steps: 0,
            prev: vec![0.0; n],
            curr: vec![0.0; n],
            normals: vec![Vec3::Y; n],
            tangents: vec![Vec3::X; n],
        })
    }

    #[inline]
    pub fn params(&self) -> &WaveParams {
        &self.params
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.params.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.params.cols
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.curr.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        2 * (self.rows() - 1) * (self.cols() - 1)
    }

    /// Extent along X, used to derive texture coordinates.
    #[inline]
    pub fn width(&self) -> f32 {
        self.cols() as f32 * self.params.spacing
    }

    /// Extent along Z, used to derive texture coordinates.
    #[inline]
    pub fn depth(&self) -> f32 {
        self.rows() as f32 * self.params.spacing
    }

    /// Integration steps taken since construction.
    #[inline]
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// `(k1, k2, k3)` weights of the previous height, the current height and
    /// the sum of the four neighbours.
    #[inline]
    pub fn coefficients(&self) -> (f32, f32, f32) {
        (self.k1, self.k2, self.k3)
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols() + col
    }

    #[inline]
    pub fn height(&self, row: usize, col: usize) -> f32 {
        self.curr[self.index(row, col)]
    }

    pub fn position(&self, i: usize) -> Vec3 {
        let (row, col) = (i / self.cols(), i % self.cols());
        let dx = self.params.spacing;
        let half_w = (self.cols() - 1) as f32 * dx * 0.5;
        let half_d = (self.rows() - 1) as f32 * dx * 0.5;
        Vec3::new(-half_w + col as f32 * dx, self.curr[i], half_d - row as f32 * dx)
    }

    #[inline]
    pub fn normal(&self, i: usize) -> Vec3 {
        self.normals[i]
    }

    #[inline]
    pub fn tangent_x(&self, i: usize) -> Vec3 {
        self.tangents[i]
    }

    fn is_interior(&self, row: usize, col: usize) -> bool {
        (1..self.rows() - 1).contains(&row) && (1..self.cols() - 1).contains(&col)
    }

    /// Adds `magnitude` at an interior cell and half of it to each interior
    /// 4-neighbour.
    pub fn disturb(&mut self, row: usize, col: usize, magnitude: f32) -> Result<(), SimError> {
        if !self.is_interior(row, col) {
            return Err(SimError::OutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }

        let half = 0.5 * magnitude;
        let centre = self.index(row, col);
        self.curr[centre] += magnitude;

        for (r, c) in [(row - 1, col), (row + 1, col), (row, col - 1), (row, col + 1)] {
            if self.is_interior(r, c) {
                let i = self.index(r, c);
                self.curr[i] += half;
            }
        }
        Ok(())
    }

    /// Accumulates `dt` and integrates one step once a full time step has
    /// elapsed. Returns whether a step was taken.
    pub fn update(&mut self, dt: f32) -> bool {
        if !dt.is_finite() || dt < 0.0 {
            log::debug!("ignoring wave update with dt {dt}");
            return false;
        }

        self.accumulated += dt;
        if self.accumulated < self.params.time_step {
            return false;
        }

        self.step();
        self.accumulated = 0.0;
        true
    }

    /// Integrates exactly one time step regardless of the accumulator.
    pub fn step(&mut self) {
        let (rows, cols) = (self.rows(), self.cols());

        // `prev` becomes the next solution in place.
        for row in 1..rows - 1 {
            for col in 1..cols - 1 {
                let i = row * cols + col;
                let neighbours =
                    self.curr[i - cols] + self.curr[i + cols] + self.curr[i - 1] + self.curr[i + 1];
                self.prev[i] = self.k1 * self.prev[i] + self.k2 * self.curr[i] + self.k3 * neighbours;
            }
        }
        for col in 0..cols {
            self.prev[col] = 0.0;
            self.prev[(rows - 1) * cols + col] = 0.0;
        }
        for row in 0..rows {
            self.prev[row * cols] = 0.0;
            self.prev[row * cols + cols - 1] = 0.0;
        }

        std::mem::swap(&mut self.prev, &mut self.curr);
        self.steps += 1;
        self.rebuild_normals();
    }

    fn rebuild_normals(&mut self) {
        let (rows, cols) = (self.rows(), self.cols());
        let two_dx = 2.0 * self.params.spacing;

        for row in 0..rows {
            for col in 0..cols {
                let l = self.curr[row * cols + col.saturating_sub(1)];
                let r = self.curr[row * cols + (col + 1).min(cols - 1)];
                let t = self.curr[row.saturating_sub(1) * cols + col];
                let b = self.curr[(row + 1).min(rows - 1) * cols + col];

                let i = row * cols + col;
                self.normals[i] = Vec3::new(l - r, two_dx, b - t).normalize();
                self.tangents[i] = Vec3::new(two_dx, r - l, 0.0).normalize();
            }
        }
    }
}

/// Triangle-list indices for a `rows x cols` grid, two triangles per quad in
/// row-major order.
pub fn grid_indices(rows: usize, cols: usize) -> Vec<u32> {
    if rows < 2 || cols < 2 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(6 * (rows - 1) * (cols - 1));
    let n = cols as u32;
    for i in 0..rows as u32 - 1 {
        for j in 0..n - 1 {
            out.extend_from_slice(&[
                i * n + j,
                i * n + j + 1,
                (i + 1) * n + j,
                (i + 1) * n + j,
                i * n + j + 1,
                (i + 1) * n + j + 1,
            ]);
        }
    }
    out
}

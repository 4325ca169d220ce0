/// Rejected simulation input. Nothing is ever clamped into range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("cell ({row}, {col}) is outside the disturbable interior of a {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid wave parameters: {0}")]
    InvalidParams(&'static str),

    #[error("wave parameters are unstable (courant number {courant:.3} exceeds 1/sqrt(2))")]
    Unstable { courant: f32 },
}

use crate::geometry::shapes::TessellationOptions;

/// Axis the output document treats as "up".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpAxis {
    Y,
    Z,
}

impl UpAxis {
    pub fn token(self) -> &'static str {
        match self {
            UpAxis::Y => "Y",
            UpAxis::Z => "Z",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub frames_per_second: f64,
    pub up_axis: UpAxis,
    pub meters_per_unit: f64,
    pub tessellation: TessellationOptions,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 30.0,
            // Physics scenes are authored Z-up
            up_axis: UpAxis::Z,
            meters_per_unit: 1.0,
            tessellation: TessellationOptions::default(),
        }
    }
}

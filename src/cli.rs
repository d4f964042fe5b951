use std::path::PathBuf;

use clap::Parser;

use sim_usd_export::config::ExportConfig;
use sim_usd_export::geometry::TessellationOptions;

#[derive(Parser, Debug, Clone)]
#[command(name = "sim-usd-export")]
#[command(about = "Exports an animated demo scene as a USDA file", long_about = None)]
pub struct Cli {
    /// Where to write the .usda file
    #[arg(short, long, default_value = "scene.usda")]
    pub output: PathBuf,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    #[arg(long, default_value_t = 30.0)]
    pub fps: f64,

    /// glTF file whose meshes are added to the scene
    #[arg(long)]
    pub gltf: Option<PathBuf>,

    /// Latitude steps used when tessellating round shapes
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(2..=1024))]
    pub resolution: u32,
}

impl Cli {
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            frames_per_second: self.fps,
            tessellation: TessellationOptions {
                resolution: self.resolution,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_range_checked() {
        assert!(Cli::try_parse_from(["sim-usd-export", "--resolution", "4294967295"]).is_err());
        assert!(Cli::try_parse_from(["sim-usd-export", "--resolution", "1"]).is_err());

        let cli = Cli::try_parse_from(["sim-usd-export", "--resolution", "64"]).unwrap();
        assert_eq!(cli.export_config().tessellation.resolution, 64);
    }
}

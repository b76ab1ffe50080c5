use std::path::PathBuf;

use clap::Parser;

use crate::pipeline::persistence;
use crate::pipeline::voice_binding::{A4_FREQ_HZ, VoiceBinding};

#[derive(Parser, Debug)]
#[command(name = "raybrush", version, about = "Paint with sound in the terminal")]
pub struct Args {
    /// Project directory; state goes in <dir>/.raybrush [default: current directory]
    pub project_dir: Option<PathBuf>,

    /// Where takes are saved and loaded [default: <project_dir>/.raybrush/takes]
    #[arg(long)]
    pub takes_dir: Option<PathBuf>,

    /// Frequency of note 69 (A4) in Hz
    #[arg(long, default_value_t = A4_FREQ_HZ, value_parser = parse_pitch)]
    pub reference_pitch: f64,

    /// Start with loop mode off regardless of the saved project
    #[arg(long)]
    pub no_loop: bool,
}

fn parse_pitch(s: &str) -> Result<f64, String> {
    let hz: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(format!("reference pitch must be a positive number of Hz, got {}", s))
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub project_dir: PathBuf,
    pub takes_dir: PathBuf,
    pub binding: VoiceBinding,
    pub force_loop_off: bool,
}

impl Args {
    pub fn into_config(self) -> Config {
        let project_dir = self
            .project_dir
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
        let takes_dir = self
            .takes_dir
            .unwrap_or_else(|| persistence::default_takes_dir(&project_dir));
        Config {
            binding: VoiceBinding {
                reference_pitch: self.reference_pitch,
                ..VoiceBinding::default()
            },
            project_dir,
            takes_dir,
            force_loop_off: self.no_loop,
        }
    }
}

use crate::camera::{KeyState, UnknownKey};
use pico_args::Arguments;
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use ultraviolet::{Vec2, Vec3};

pub const HELP: &str = "\
Renders the entities of a position log as moving wireframe cubes

USAGE:
  swarmvis [OPTIONS] <positions.csv>

OPTIONS:
  -o, --output DIR     Directory for the PNG frames [default: frames]
      --width N        Frame width in pixels [default: 1440]
      --height N       Frame height in pixels [default: 810]
      --fps N          Frames per second of playback [default: 30]
      --speed X        Simulation seconds per playback second [default: 1]
      --start T        Initial simulation time [default: first sample]
      --duration D     Playback length, e.g. 30s or 2m [default: until the last sample]
      --max-frames N   Stop after this many frames
      --fov DEG        Vertical field of view [default: 60]
      --far D          Far plane distance [default: 1000]
      --camera X,Y,Z   Camera position [default: framed from the log]
      --yaw DEG        Camera yaw, used with --camera [default: 0]
      --pitch DEG      Camera pitch, used with --camera [default: 0]
      --pan DX,DY      Pointer movement applied every frame, in pixels [default: 0,0]
      --hold KEYS      Movement keys held during playback, any of wasdqe
      --fly-speed X    Camera speed in units per second [default: 5]
      --cube-size X    Marker edge length [default: 2]
      --threads N      Render threads [default: number of CPUs]
  -v, --verbose        More logging, repeat for more
  -h, --help           Prints help information
";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Args(#[from] pico_args::Error),

    #[error("{flag}: {message}")]
    Invalid { flag: &'static str, message: String },

    #[error("--hold: {0}")]
    Keys(#[from] UnknownKey),

    #[error("unexpected arguments: {0:?}")]
    Unexpected(Vec<OsString>),
}

/// Pointer sensitivity for `--pan`, degrees per pixel.
pub const LOOK_SENSITIVITY: f32 = 0.1;

#[derive(Debug)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    pub fps: u32,
    pub speed: f64,
    pub start: Option<f64>,
    pub duration: Option<Duration>,
    pub max_frames: Option<usize>,
    pub fov: f32,
    pub far: f32,
    pub camera: Option<Vec3>,
    pub yaw: f32,
    pub pitch: f32,
    pub pan: Vec2,
    pub hold: KeyState,
    pub fly_speed: f32,
    pub cube_size: f32,
    pub threads: usize,
    pub verbosity: u8,
}

pub enum Command {
    Run(Config),
    Help,
}

fn parse_components<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {} comma separated numbers", N));
    }
    let mut out = [0.; N];
    for (o, part) in out.iter_mut().zip(parts) {
        *o = f32::from_str(part).map_err(|e| format!("{:?}: {}", part, e))?;
    }
    Ok(out)
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let [x, y, z] = parse_components::<3>(s)?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2(s: &str) -> Result<Vec2, String> {
    let [x, y] = parse_components::<2>(s)?;
    Ok(Vec2::new(x, y))
}

fn check<T>(flag: &'static str, value: T, valid: bool, expected: &str) -> Result<T, ConfigError> {
    if valid {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            flag,
            message: format!("must be {}", expected),
        })
    }
}

fn positive(flag: &'static str, value: f64) -> Result<f64, ConfigError> {
    check(flag, value, value.is_finite() && value > 0., "a positive number")
}

impl Command {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(Arguments::from_env())
    }

    pub fn parse(mut args: Arguments) -> Result<Self, ConfigError> {
        if args.contains(["-h", "--help"]) {
            return Ok(Command::Help);
        }

        let mut verbosity = 0;
        while args.contains(["-v", "--verbose"]) {
            verbosity += 1;
        }

        let width: usize = args.opt_value_from_str("--width")?.unwrap_or(1440);
        let height: usize = args.opt_value_from_str("--height")?.unwrap_or(810);
        let fps: u32 = args.opt_value_from_str("--fps")?.unwrap_or(30);
        let speed = args.opt_value_from_str("--speed")?.unwrap_or(1.);
        let start: Option<f64> = args.opt_value_from_str("--start")?;
        let fov: f32 = args.opt_value_from_str("--fov")?.unwrap_or(60.);
        let far = args.opt_value_from_str("--far")?.unwrap_or(1000.);
        let fly_speed = args.opt_value_from_str("--fly-speed")?.unwrap_or(5.);
        let cube_size = args.opt_value_from_str("--cube-size")?.unwrap_or(2.);
        let threads: Option<usize> = args.opt_value_from_str("--threads")?;
        let hold: Option<String> = args.opt_value_from_str("--hold")?;

        let config = Config {
            output: args
                .opt_value_from_str(["-o", "--output"])?
                .unwrap_or_else(|| PathBuf::from("frames")),
            width: check("--width", width, width > 0, "at least 1")?,
            height: check("--height", height, height > 0, "at least 1")?,
            fps: check("--fps", fps, fps > 0, "at least 1")?,
            speed: positive("--speed", speed)?,
            start: match start {
                Some(t) => Some(check("--start", t, t.is_finite(), "a finite number")?),
                None => None,
            },
            duration: args.opt_value_from_fn("--duration", humantime::parse_duration)?,
            max_frames: args.opt_value_from_str("--max-frames")?,
            fov: check("--fov", fov, fov > 0. && fov < 180., "between 0 and 180 degrees")?,
            far: positive("--far", far)? as f32,
            camera: args.opt_value_from_fn("--camera", parse_vec3)?,
            yaw: args.opt_value_from_str("--yaw")?.unwrap_or(0.),
            pitch: args.opt_value_from_str("--pitch")?.unwrap_or(0.),
            pan: args
                .opt_value_from_fn("--pan", parse_vec2)?
                .unwrap_or_else(Vec2::zero),
            hold: KeyState::parse(hold.as_deref().unwrap_or(""))?,
            fly_speed: positive("--fly-speed", fly_speed)? as f32,
            cube_size: positive("--cube-size", cube_size)? as f32,
            threads: match threads {
                Some(n) => check("--threads", n, n > 0, "at least 1")?,
                None => num_cpus::get(),
            },
            verbosity,
            input: args.free_from_str()?,
        };

        let remaining = args.finish();
        if !remaining.is_empty() {
            return Err(ConfigError::Unexpected(remaining));
        }

        Ok(Command::Run(config))
    }
}

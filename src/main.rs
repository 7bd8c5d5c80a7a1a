use anyhow::{anyhow, Context, Result};
use std::convert::TryFrom;
use std::path::Path;
use std::time::{Duration, Instant};
use swarmvis::camera::FreeFlyCamera;
use swarmvis::clock::PlaybackClock;
use swarmvis::color::{Color, OutputColor};
use swarmvis::config::{self, Command, Config, LOOK_SENSITIVITY};
use swarmvis::scene::{self, FrameJob, Marker, RenderSettings};
use swarmvis::track::{self, Interpolator, TrackLog};
use ultraviolet::Vec3;

/// Places the camera in front of the whole swarm, looking at its center.
fn framing_camera(log: &TrackLog, config: &Config) -> FreeFlyCamera {
    let (center, extent) = match log.bounds() {
        Some(bounds) => (bounds.center(), bounds.diagonal().max(config.cube_size)),
        None => (Vec3::zero(), config.cube_size),
    };
    // Far enough back for the bounding sphere to fit the vertical field of view
    let distance = extent / (config.fov.to_radians() / 2.).tan();
    let mut camera = FreeFlyCamera::new(
        center + Vec3::new(0., extent / 2., distance),
        0.,
        0.,
        config.fov,
        config.far.max(distance + extent),
    );
    camera.look_at(center);
    camera
}

/// Frames the playback will produce. Errors when there are too many to count.
fn frame_count(log: &TrackLog, config: &Config, start: f64, frame_time: Duration) -> Result<usize> {
    let frames = match config.duration {
        Some(duration) => (duration.as_secs_f64() * f64::from(config.fps)).ceil(),
        None => {
            let end = log.time_span().map_or(start, |span| span.end);
            let frame_span = frame_time.as_secs_f64() * config.speed;
            ((end - start) / frame_span).max(0.).floor() + 1.
        }
    };
    let frames = config
        .max_frames
        .map_or(frames, |max| frames.min(max as f64));

    // usize::MAX rounds up to a power of two as f64, so it is itself out of range
    if !(frames < usize::MAX as f64) {
        return Err(anyhow!(
            "Playback of {:e} frames is too long, use --max-frames, --duration or a higher --speed",
            frames
        ));
    }
    Ok(frames as usize)
}

/// Runs the playback clock and hands every frame snapshot to `emit` in order.
/// Only this thread touches the cursors.
fn playback(
    log: &TrackLog,
    config: &Config,
    mut emit: impl FnMut(FrameJob) -> Result<()>,
) -> Result<usize> {
    let frame_time = Duration::from_secs(1) / config.fps;
    let start = config
        .start
        .or_else(|| log.time_span().map(|span| span.start))
        .unwrap_or(0.);
    let frame_count = frame_count(log, config, start, frame_time)?;

    let palette: Vec<OutputColor> = log
        .registry()
        .iter()
        .map(|(id, _)| OutputColor::from(Color::for_entity(id)))
        .collect();

    let mut camera = match config.camera {
        Some(position) => {
            FreeFlyCamera::new(position, config.yaw, config.pitch, config.fov, config.far)
        }
        None => framing_camera(log, config),
    };
    let mut clock = PlaybackClock::new(start, config.speed);
    let mut interpolator = Interpolator::new(log);

    for index in 0..frame_count {
        let time = clock.time();
        let markers: Vec<Marker> = interpolator
            .positions_at(time)
            .with_context(|| format!("Failed to interpolate frame {} at time {}", index, time))?
            .into_iter()
            .map(|(id, center)| Marker {
                center,
                color: palette[id.index()],
            })
            .collect();
        log::debug!("Frame {} at time {:.3}: {} markers", index, time, markers.len());

        emit(FrameJob {
            index,
            time,
            camera: camera.clone(),
            markers,
        })?;

        camera.look(config.pan, LOOK_SENSITIVITY);
        camera.fly(config.hold, frame_time, config.fly_speed);
        clock.advance(frame_time);
    }

    Ok(frame_count)
}

/// Plays the log back on this thread while the workers rasterise and write frames.
/// At most a few frames per worker are in flight.
fn render_all(log: &TrackLog, config: &Config) -> Result<usize> {
    std::fs::create_dir_all(&config.output)
        .with_context(|| format!("Failed to create {}", config.output.display()))?;

    let settings = RenderSettings {
        width: config.width,
        height: config.height,
        cube_size: config.cube_size,
    };
    let settings = &settings;
    let output = config.output.as_path();
    let (sender, receiver) = crossbeam_channel::bounded::<FrameJob>(config.threads * 2);

    crossbeam_utils::thread::scope(|s| {
        let workers: Vec<_> = (0..config.threads)
            .map(|_| {
                let receiver = receiver.clone();
                s.spawn(move |_| -> Result<()> {
                    for job in receiver.iter() {
                        let canvas = scene::render(&job, settings);
                        let path = output.join(format!("frame_{:05}.png", job.index));
                        write_png(&path, canvas.width(), canvas.height(), canvas.data())
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        log::debug!("Wrote {} (time {:.3})", path.display(), job.time);
                    }
                    Ok(())
                })
            })
            .collect();
        drop(receiver);

        let played = playback(log, config, |job| {
            sender
                .send(job)
                .map_err(|_| anyhow!("Render threads stopped early"))
        });
        // Workers drain the queue and exit once the sender is gone
        drop(sender);

        // A worker's own error explains a failed send better
        workers
            .into_iter()
            .try_for_each(|worker| worker.join().map_err(|_| anyhow!("Render thread panicked"))?)?;
        played
    })
    .map_err(|_| anyhow!("Render thread panicked"))?
}

fn run(config: Config) -> Result<()> {
    let started = Instant::now();

    let log = track::load_path(&config.input)
        .with_context(|| format!("Failed to load {}", config.input.display()))?;
    if log.registry().is_empty() {
        log::warn!("{} has no samples", config.input.display());
    }
    if let Some(span) = log.time_span() {
        log::info!(
            "{} samples of {} entities from time {} to {}",
            log.samples().len(),
            log.registry().len(),
            span.start,
            span.end
        );
    }

    let frames = render_all(&log, &config)?;

    log::info!(
        "Rendered {} frames to {} in {}",
        frames,
        config.output.display(),
        humantime::format_duration(Duration::from_millis(started.elapsed().as_millis() as u64))
    );
    Ok(())
}

fn main() -> Result<()> {
    let config = match Command::from_env()? {
        Command::Run(config) => config,
        Command::Help => {
            print!("{}", config::HELP);
            return Ok(());
        }
    };

    env_logger::Builder::new()
        .filter_level(match config.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    run(config)
}

fn write_png(path: impl AsRef<Path>, width: usize, height: usize, rgb8_data: &[u8]) -> Result<()> {
    let file = std::fs::File::create(&path)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, u32::try_from(width)?, u32::try_from(height)?);
    encoder.set_color(png::ColorType::RGB);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgb8_data)?;
    Ok(())
}

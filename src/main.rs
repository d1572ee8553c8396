mod compositor;
mod dirty;
mod draw;
mod error;
mod font;
mod gallery;
mod geometry;
mod overlay;
mod precompute;
mod ramp;
mod settings;
mod surface;
mod timepiece;

use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime, Timelike};
use log::{error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use structopt::StructOpt;
use winit::{
    dpi::PhysicalSize,
    event::{Event, VirtualKeyCode},
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};
use winit_input_helper::WinitInputHelper;

use crate::compositor::{CommitMode, Committed};
use crate::error::AppError;
use crate::font::{GlyphSource, SheetFont};
use crate::gallery::{Catalog, Showcase};
use crate::geometry::{center_square, point_on_circle, Point, Rect};
use crate::overlay::{Overlay, OverlayOptions};
use crate::ramp::RampCurve;
use crate::settings::Settings;
use crate::surface::{Canvas, Frame};
use crate::timepiece::{Timepiece, TimepieceOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowSize {
    width: u32,
    height: u32,
}

impl FromStr for WindowSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("bad size '{s}': {e}"));
        let size = WindowSize {
            width: parse(w)?,
            height: parse(h)?,
        };
        if size.width == 0 || size.height == 0 {
            return Err(format!("size '{s}' has no area"));
        }
        Ok(size)
    }
}

fn parse_hour(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(hour) if hour <= 24 => Ok(hour),
        _ => Err(format!("expected an hour 0-23, or 24 for all, got '{s}'")),
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "image-clock", about = "An analog railway clock.")]
struct Opt {
    /// Second-hand frames per second
    #[structopt(short = "r", long = "framerate")]
    frame_rate: Option<u32>,

    /// Settings file to use instead of searching the default locations
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Borderless fullscreen with a hidden cursor
    #[structopt(short, long)]
    fullscreen: bool,

    /// Window size when not fullscreen
    #[structopt(long, default_value = "850x720")]
    size: WindowSize,

    /// Second-hand motion, e.g. clockwork-long or continuous-sweep
    #[structopt(long)]
    curve: Option<RampCurve>,

    /// Border around the dial in pixels
    #[structopt(long)]
    margin: Option<u32>,

    /// Write the effective settings to the --config path (or ./image-clock.toml) and exit
    #[structopt(long)]
    write_config: bool,

    /// Only restore the hour and minute hands where something erased them
    #[structopt(long)]
    skip_idle_hands: bool,

    /// Hide the digital time
    #[structopt(long)]
    no_overlay: bool,

    /// Directory of pictures named HHMM*, shown during their minute
    #[structopt(long, parse(from_os_str))]
    images: Option<PathBuf>,

    /// Print the pictures found and exit
    #[structopt(long)]
    list_files: bool,

    /// Print images whose names do not start with a valid HHMM and exit
    #[structopt(long)]
    invalid_files: bool,

    /// Print the minutes of an hour (24 for the whole day) without a picture and exit
    #[structopt(long, parse(try_from_str = parse_hour))]
    missing: Option<u32>,
}

impl Opt {
    fn apply(&self, settings: &mut Settings) {
        if let Some(frame_rate) = self.frame_rate {
            settings.general.frame_rate = frame_rate;
        }
        if let Some(curve) = self.curve {
            settings.analog_clock.curve = curve;
        }
        if let Some(margin) = self.margin {
            settings.analog_clock.margin = margin;
        }
        if self.skip_idle_hands {
            settings.analog_clock.skip_idle_hands = true;
        }
        if let Some(images) = &self.images {
            settings.images.directory = Some(images.clone());
        }
    }

    /// Catalog listings requested on the command line, one entry per line.
    fn report(&self, catalog: &Catalog) -> Option<Vec<String>> {
        let mut lines = Vec::new();
        if self.list_files {
            lines.extend(
                catalog
                    .entries()
                    .iter()
                    .map(|e| format!("{:04} {}", e.clock4, e.path.display())),
            );
        }
        if self.invalid_files {
            lines.extend(catalog.rejected().iter().map(|p| p.display().to_string()));
        }
        if let Some(hour) = self.missing {
            let hour = (hour < 24).then_some(hour);
            lines.extend(catalog.missing(hour).into_iter().map(|m| format!("{m:04}")));
        }
        (self.list_files || self.invalid_files || self.missing.is_some()).then_some(lines)
    }
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("{}", e);
        process::exit(1);
    }
}

fn load_settings(opt: &Opt) -> Result<Settings, AppError> {
    let mut settings = if opt.write_config {
        Settings::default()
    } else {
        Settings::discover(opt.config.as_deref())?
    };
    opt.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_catalog(settings: &Settings) -> Result<Catalog, AppError> {
    match &settings.images.directory {
        Some(dir) => Ok(Catalog::scan(dir)?),
        None => Ok(Catalog::default()),
    }
}

/// The configured glyph sheet, or `None` for the built-in digits.
fn load_font(settings: &Settings) -> Option<Box<dyn GlyphSource>> {
    let path = settings.analog_clock.font.as_ref()?;
    match SheetFont::load(path) {
        Ok(font) => Some(Box::new(font)),
        Err(e) => {
            warn!("{}, using the built-in digits", e);
            None
        }
    }
}

fn time_text(now: &NaiveDateTime) -> String {
    format!("{:02}.{:02}", now.hour(), now.minute())
}

fn run(opt: Opt) -> Result<(), AppError> {
    let settings = load_settings(&opt)?;
    if opt.write_config {
        let path = opt.config.clone().unwrap_or_else(|| PathBuf::from(crate::settings::FILE_NAME));
        settings.write(&path)?;
        info!("wrote settings to {}", path.display());
        return Ok(());
    }

    let catalog = load_catalog(&settings)?;
    if let Some(lines) = opt.report(&catalog) {
        for line in lines {
            println!("{}", line);
        }
        return Ok(());
    }

    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();
    let window = {
        let size = PhysicalSize::new(opt.size.width, opt.size.height);
        let mut builder = WindowBuilder::new()
            .with_title("Image Clock")
            .with_inner_size(size)
            .with_min_inner_size(PhysicalSize::new(64, 64));
        if opt.fullscreen {
            builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        builder.build(&event_loop)?
    };
    if opt.fullscreen {
        window.set_cursor_visible(false);
    }

    let PhysicalSize { width, height } = window.inner_size();
    let mut pixels = {
        let surface_texture = SurfaceTexture::new(width, height, &window);
        Pixels::new(width, height, surface_texture)?
    };

    let frame_rate = settings.general.frame_rate;
    let region = center_square(width, height);
    let options = TimepieceOptions {
        frame_rate,
        margin: settings.analog_clock.margin,
        curve: settings.analog_clock.curve,
        skip_idle_hands: settings.analog_clock.skip_idle_hands,
    };
    let mut clock = Timepiece::new(width, height, region, options, load_font(&settings))?;
    let mut showcase = Showcase::new(catalog, region.w as u32);
    info!(
        "{}x{} output, clock in {:?}, {} fps, {} curve",
        width, height, clock.region(), frame_rate, options.curve
    );

    let mut overlay: Option<Box<dyn Overlay>> = if opt.no_overlay {
        None
    } else {
        let geometry = clock.geometry();
        let local = point_on_circle(geometry.center(), geometry.date_distance, FRAC_PI_2);
        let center = Point::new(local.x + region.x, local.y + region.y);
        let overlay_options = OverlayOptions::from_settings(&settings.text_overlay, frame_rate, region.w as u32);
        let now = Local::now().naive_local();
        Some(crate::overlay::build(&overlay_options, center, &time_text(&now)))
    };

    let tick = Duration::from_secs_f64(1.0 / f64::from(frame_rate));
    let mut next_tick = Instant::now();
    let mut minute = None;
    let mut last_commit: Vec<Rect> = Vec::new();

    event_loop.run(move |event, _, control_flow| {
        if let Event::RedrawRequested(_) = event {
            if pixels
                .render()
                .map_err(|e| error!("pixels.render() failed: {}", e))
                .is_err()
            {
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        if input.update(&event) {
            // Close events
            if input.key_pressed(VirtualKeyCode::Escape) || input.key_pressed(VirtualKeyCode::Q) || input.quit() {
                *control_flow = ControlFlow::Exit;
                return;
            }

            if input.key_pressed(VirtualKeyCode::B) {
                info!(
                    "frame {:?}, hands {:?}, last commit wrote {} rects: {:?}",
                    clock.current_frame(),
                    clock.angles(),
                    last_commit.len(),
                    last_commit
                );
            }

            // Resize the window
            if let Some(size) = input.window_resized() {
                pixels.resize_surface(size.width, size.height);
            }

            if Instant::now() >= next_tick {
                let now = Local::now().naive_local();
                let mut frame = Frame::new(pixels.get_frame(), width, height);
                let repaint = showcase.update(&now);
                if let Some(picture) = showcase.picture() {
                    if repaint {
                        frame.blit(picture, region.origin(), picture.bounds());
                    }
                } else {
                    clock.compute(&now);
                    if let Committed::List(rects) = clock.commit(&mut frame, CommitMode::List) {
                        last_commit = rects;
                    }
                    // a picture covered the region last minute
                    if repaint {
                        clock.partial_redraw(&mut frame, region);
                    }
                }

                if let Some(overlay) = overlay.as_mut() {
                    let mut stale = overlay.bounds();
                    if minute != Some(now.minute()) {
                        minute = Some(now.minute());
                        overlay.set_text(&time_text(&now));
                        stale = stale.union(&overlay.bounds());
                    }
                    if showcase.redraw_area(&mut frame, region, stale).is_none() {
                        clock.partial_redraw(&mut frame, stale);
                    }
                    overlay.compute();
                    overlay.render(&mut frame);
                }

                next_tick += tick;
                // fell behind, e.g. after the window was hidden
                if next_tick < Instant::now() {
                    next_tick = Instant::now() + tick;
                }
                window.request_redraw();
            }
            *control_flow = ControlFlow::WaitUntil(next_tick);
        }
    })
}

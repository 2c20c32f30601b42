// facade texture synthesis: a color map and an emission map with a seeded window grid
//
// stream draws happen in a fixed order: per cell (row-major) jitter x, jitter y,
// on/off, palette index, brightness, then one draw per interior pixel of an unlit window.
// the window surface noise is a fixed coherent noise field and never touches the stream

use bevy::color::Srgba;
use bevy::log::debug;
use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::config::*;
use crate::error::{Result, GenerationError, check_non_negative, check_positive, check_range, check_unit};
use super::pixels::{self, PixelBuffer, TRANSPARENT};
use super::rng::SeedStream;

// independent of the generation seed, windows look the same wherever they land
const SURFACE_NOISE_SEED: i32 = 1337;
const SURFACE_NOISE_SCALE: f32 = 10.0;
const BORDER_FRACTION: f32 = 0.08;
const BORDER_BLEND: f32 = 0.6;
const EMISSION_SCALE: f32 = 0.6;

#[derive(Clone, Debug, PartialEq)]
pub struct WindowGridSpec {
    pub texture_width: u32,
    pub texture_height: u32,
    pub cols: u32,
    pub rows: u32,
    pub window_on_probability: f32,
    pub padding_normalized: f32,
}

impl Default for WindowGridSpec {
    fn default() -> Self {
        Self {
            texture_width: TEXTURE_WIDTH,
            texture_height: TEXTURE_HEIGHT,
            cols: WINDOW_COLS,
            rows: WINDOW_ROWS,
            window_on_probability: WINDOW_ON_PROBABILITY,
            padding_normalized: WINDOW_PADDING,
        }
    }
}

impl WindowGridSpec {
    pub fn validate(&self) -> Result<()> {
        check_positive("texture_width", self.texture_width)?;
        check_positive("texture_height", self.texture_height)?;
        check_positive("cols", self.cols)?;
        check_positive("rows", self.rows)?;
        check_unit("window_on_probability", self.window_on_probability)?;
        check_range("padding_normalized", self.padding_normalized, 0.0, 0.4)
    }

    // integer cell size in pixels
    pub fn cell_size(&self) -> (i32, i32) {
        (
            (self.texture_width / self.cols) as i32,
            (self.texture_height / self.rows) as i32,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FacadeStyle {
    pub palette: Vec<Srgba>,
    pub facade_color: Srgba,
    pub off_color: Srgba,
    pub emission_intensity: f32,
    // 0 disables roof clearing
    pub roof_clear_fraction: f32,
}

impl Default for FacadeStyle {
    fn default() -> Self {
        let rgb = |c: [f32; 3]| Srgba::rgb(c[0], c[1], c[2]);
        Self {
            palette: WINDOW_PALETTE.iter().copied().map(rgb).collect(),
            facade_color: rgb(FACADE_COLOR),
            off_color: rgb(WINDOW_OFF_COLOR),
            emission_intensity: EMISSION_INTENSITY,
            roof_clear_fraction: ROOF_CLEAR_FRACTION,
        }
    }
}

impl FacadeStyle {
    pub fn validate(&self) -> Result<()> {
        if self.palette.is_empty() {
            return Err(GenerationError::invalid("palette", "needs at least one color"));
        }
        check_non_negative("emission_intensity", self.emission_intensity)?;
        check_range("roof_clear_fraction", self.roof_clear_fraction, 0.0, 0.5)
    }
}

/// Output of one synthesis call. Both buffers share dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacadeTextures {
    pub color: PixelBuffer,
    pub emission: PixelBuffer,
}

impl FacadeTextures {
    pub fn apply_to(&self, sink: &mut impl RendererSink) {
        sink.apply(&self.color, &self.emission);
    }
}

/// Consumer of synthesized textures, e.g. a material on the GPU side.
pub trait RendererSink {
    fn apply(&mut self, color: &PixelBuffer, emission: &PixelBuffer);
}

// one window, alive only while its cell is rasterized
#[derive(Clone, Copy, Debug)]
struct WindowCell {
    grid_x: u32,
    grid_y: u32,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    is_on: bool,
    palette_color: Srgba,
    brightness: f32,
}

pub fn synthesize(spec: &WindowGridSpec, style: &FacadeStyle, seed: u64) -> Result<FacadeTextures> {
    spec.validate()?;
    style.validate()?;

    let mut stream = SeedStream::new(seed);
    let mut synth = Rasterizer::new(spec, style);

    let (cell_w, cell_h) = spec.cell_size();
    let pad_x = (cell_w as f32 * spec.padding_normalized).round_ties_even().max(1.0) as i32;
    let pad_y = (cell_h as f32 * spec.padding_normalized).round_ties_even().max(1.0) as i32;

    let mut lit = 0;
    for grid_y in 0..spec.rows {
        for grid_x in 0..spec.cols {
            let cell = draw_cell(
                &mut stream, spec, style, grid_x, grid_y, (cell_w, cell_h), (pad_x, pad_y),
            );
            lit += cell.is_on as u32;
            synth.rasterize(&cell, &mut stream);
        }
    }

    let mut textures = synth.finish();
    clear_roof(&mut textures, style.facade_color, style.roof_clear_fraction);

    debug!(
        "facade seed {}: {} of {} windows lit",
        seed,
        lit,
        spec.cols * spec.rows
    );
    Ok(textures)
}

/// Repaints the top `fraction` of both maps as bare facade. Applying it twice changes nothing.
pub fn clear_roof(textures: &mut FacadeTextures, facade_color: Srgba, fraction: f32) {
    if fraction <= 0.0 {
        return;
    }
    let height = textures.color.height();
    let rows = ((height as f32 * fraction).round_ties_even() as u32).clamp(1, height);
    textures.color.fill_rows(0..rows, pixels::opaque(facade_color));
    textures.emission.fill_rows(0..rows, TRANSPARENT);
}

fn draw_cell(
    stream: &mut SeedStream,
    spec: &WindowGridSpec,
    style: &FacadeStyle,
    grid_x: u32,
    grid_y: u32,
    (cell_w, cell_h): (i32, i32),
    (pad_x, pad_y): (i32, i32),
) -> WindowCell {
    let max_x = spec.texture_width as i32 - 1;
    let max_y = spec.texture_height as i32 - 1;

    let (gx, gy) = (grid_x as i32, grid_y as i32);
    let x0 = gx * cell_w + pad_x;
    let x1 = (gx + 1) * cell_w - pad_x;
    let y0 = gy * cell_h + pad_y;
    let y1 = (gy + 1) * cell_h - pad_y;

    // slight randomness in window placement, shifts the whole rectangle
    let jitter_w = stream.range_i32(-(pad_x / 3), (pad_x / 3).max(1));
    let jitter_h = stream.range_i32(-(pad_y / 3), (pad_y / 3).max(1));

    let is_on = stream.unit() < spec.window_on_probability as f64;
    let palette_index = stream.range_i32(0, style.palette.len() as i32) as usize;
    let brightness = 0.85 + stream.unit() as f32 * 0.3;

    WindowCell {
        grid_x,
        grid_y,
        x0: (x0 + jitter_w).clamp(0, max_x),
        x1: (x1 + jitter_w).clamp(0, max_x),
        y0: (y0 + jitter_h).clamp(0, max_y),
        y1: (y1 + jitter_h).clamp(0, max_y),
        is_on,
        palette_color: style.palette[palette_index],
        brightness,
    }
}

struct Rasterizer<'a> {
    spec: &'a WindowGridSpec,
    style: &'a FacadeStyle,
    noise: FastNoiseLite,
    border_color: [u8; 4],
    color: PixelBuffer,
    emission: PixelBuffer,
}

impl<'a> Rasterizer<'a> {
    fn new(spec: &'a WindowGridSpec, style: &'a FacadeStyle) -> Self {
        let mut noise = FastNoiseLite::with_seed(SURFACE_NOISE_SEED);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));

        let (w, h) = (spec.texture_width, spec.texture_height);
        Self {
            spec,
            style,
            noise,
            border_color: pixels::opaque(pixels::lerp(style.facade_color, style.off_color, BORDER_BLEND)),
            color: PixelBuffer::filled(w, h, pixels::opaque(style.facade_color)),
            emission: PixelBuffer::filled(w, h, TRANSPARENT),
        }
    }

    fn rasterize(&mut self, cell: &WindowCell, stream: &mut SeedStream) {
        if cell.x1 < cell.x0 || cell.y1 < cell.y0 {
            debug!("window {},{} collapsed after padding", cell.grid_x, cell.grid_y);
            return;
        }

        let span_x = cell.x1 - cell.x0;
        let span_y = cell.y1 - cell.y0;
        let border = ((span_x.min(span_y) as f32 * BORDER_FRACTION).round_ties_even() as i32).max(1);
        // windows too small to hold a frame are all glass
        let framed = span_x.min(span_y) + 1 > 2 * border;

        let center_x = (cell.x0 + cell.x1) as f32 * 0.5;
        let center_y = (cell.y0 + cell.y1) as f32 * 0.5;
        let emission_gain = cell.brightness * self.style.emission_intensity * EMISSION_SCALE;

        for y in cell.y0..=cell.y1 {
            for x in cell.x0..=cell.x1 {
                let (px, py) = (x as u32, y as u32);
                let is_border = framed
                    && (x < cell.x0 + border
                        || x > cell.x1 - border
                        || y < cell.y0 + border
                        || y > cell.y1 - border);

                if is_border {
                    self.color.set(px, py, self.border_color);
                } else if cell.is_on {
                    let n = self.surface_noise(x, y) * 0.2 + 0.9;
                    let albedo = pixels::scale(cell.palette_color, cell.brightness * n);
                    self.color.set(px, py, pixels::opaque(albedo));

                    // radial falloff from the window center
                    let dx = (x as f32 - center_x) / span_x.max(1) as f32;
                    let dy = (y as f32 - center_y) / span_y.max(1) as f32;
                    let fall = (1.0 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                    let glow = pixels::scale(cell.palette_color, fall * emission_gain);
                    self.emission.set(px, py, pixels::opaque(glow));
                } else {
                    let dim = 0.6 + stream.unit() as f32 * 0.2;
                    let albedo = pixels::scale(self.style.off_color, dim);
                    self.color.set(px, py, pixels::opaque(albedo));
                }
            }
        }
    }

    // coherent noise in [0, 1] over normalized texture coordinates
    fn surface_noise(&self, x: i32, y: i32) -> f32 {
        let nx = x as f32 / self.spec.texture_width as f32;
        let ny = y as f32 / self.spec.texture_height as f32;
        let raw = self
            .noise
            .get_noise_2d(nx * SURFACE_NOISE_SCALE, ny * SURFACE_NOISE_SCALE);
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    fn finish(self) -> FacadeTextures {
        FacadeTextures {
            color: self.color,
            emission: self.emission,
        }
    }
}

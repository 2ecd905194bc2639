//! Frame rendering with tiny-skia
//!
//! Rasterises the shell chrome and a [`MapScene`] into one pixmap. Text is
//! drawn with ab_glyph when a font is loaded; without one the frame is
//! complete except for labels.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use tiny_skia::{
    Color, FillRule, Mask, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Rect as SkiaRect,
    Stroke, Transform,
};

use crate::domain::core::Rect;
use crate::ui::layout::{Control, ShellLayout};
use crate::ui::map_view::{ATTRIBUTION, MARKER_LABEL, MapScene};
use crate::ui::shell::SearchBox;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Failed to read font {path}: {source}")]
    FontUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("File {path} is not a usable font")]
    InvalidFont { path: String },
}

/// Everything one frame shows
pub struct Frame<'a> {
    pub layout: &'a ShellLayout,
    pub scene: &'a MapScene,
    pub search: &'a SearchBox,
    pub status: &'a str,
    /// Button currently held down
    pub pressed: Option<Control>,
    /// Highlights the Select button while select mode is on
    pub selecting: bool,
}

mod palette {
    use tiny_skia::Color;

    pub fn window() -> Color {
        Color::from_rgba8(79, 70, 229, 255)
    }
    pub fn map_background() -> Color {
        Color::from_rgba8(170, 211, 223, 255)
    }
    pub fn grid_minor() -> Color {
        Color::from_rgba8(255, 255, 255, 110)
    }
    pub fn grid_major() -> Color {
        Color::from_rgba8(255, 255, 255, 200)
    }
    pub fn preview_fill() -> Color {
        Color::from_rgba8(51, 136, 255, 50)
    }
    pub fn preview_stroke() -> Color {
        Color::from_rgba8(51, 136, 255, 230)
    }
    pub fn marker() -> Color {
        Color::from_rgba8(42, 129, 203, 255)
    }
    pub fn field() -> Color {
        Color::from_rgba8(255, 255, 255, 235)
    }
    pub fn field_focus() -> Color {
        Color::from_rgba8(129, 140, 248, 255)
    }
    pub fn text() -> Color {
        Color::from_rgba8(55, 65, 81, 255)
    }
    pub fn placeholder() -> Color {
        Color::from_rgba8(156, 163, 175, 255)
    }
    pub fn light_text() -> Color {
        Color::from_rgba8(255, 255, 255, 255)
    }
    pub fn status() -> Color {
        Color::from_rgba8(31, 41, 55, 255)
    }
    pub fn increase() -> Color {
        Color::from_rgba8(34, 197, 94, 255)
    }
    pub fn decrease() -> Color {
        Color::from_rgba8(239, 68, 68, 255)
    }
    pub fn select() -> Color {
        Color::from_rgba8(209, 213, 219, 255)
    }
    pub fn select_active() -> Color {
        Color::from_rgba8(251, 191, 36, 255)
    }
    pub fn search_button() -> Color {
        Color::from_rgba8(67, 56, 202, 255)
    }
}

/// Draws frames; holds the optional label font
#[derive(Debug, Clone, Default)]
pub struct ShellRenderer {
    font: Option<FontArc>,
}

impl ShellRenderer {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    /// Loads the font at `path`; labels are disabled when it cannot be used
    pub fn with_font_file(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("No label font configured, text labels are disabled");
            return Self::new(None);
        };
        match load_font(path) {
            Ok(font) => Self::new(Some(font)),
            Err(err) => {
                log::warn!("{}; text labels are disabled", err);
                Self::new(None)
            }
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Renders a full frame the size of the layout
    pub fn render(&self, frame: &Frame<'_>) -> Result<Pixmap, RendererError> {
        let layout = frame.layout;
        if layout.width <= 0 || layout.height <= 0 {
            return Err(RendererError::InvalidDimensions {
                width: layout.width,
                height: layout.height,
            });
        }
        let mut pixmap = Pixmap::new(layout.width as u32, layout.height as u32)
            .ok_or(RendererError::PixmapCreationFailed)?;
        pixmap.fill(palette::window());

        self.render_map(&mut pixmap, frame.scene)?;
        self.render_toolbar(&mut pixmap, frame);
        self.render_status(&mut pixmap, layout.status, frame.status);

        Ok(pixmap)
    }

    fn render_map(&self, pixmap: &mut Pixmap, scene: &MapScene) -> Result<(), RendererError> {
        let (ox, oy) = scene.origin;
        let area = SkiaRect::from_xywh(ox, oy, scene.width, scene.height)
            .ok_or(RendererError::InvalidDimensions {
                width: scene.width as i32,
                height: scene.height as i32,
            })?;
        fill_rect(pixmap, area, palette::map_background(), None);

        let mut clip = Mask::new(pixmap.width(), pixmap.height())
            .ok_or(RendererError::PixmapCreationFailed)?;
        clip.fill_path(
            &PathBuilder::from_rect(area),
            FillRule::Winding,
            false,
            Transform::identity(),
        );
        let to_window = Transform::from_translate(ox, oy);

        for line in &scene.graticule {
            let mut pb = PathBuilder::new();
            pb.move_to(line.from.0, line.from.1);
            pb.line_to(line.to.0, line.to.1);
            if let Some(path) = pb.finish() {
                let (color, width) = if line.major {
                    (palette::grid_major(), 1.5)
                } else {
                    (palette::grid_minor(), 1.0)
                };
                let stroke = Stroke {
                    width,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &solid(color), &stroke, to_window, Some(&clip));
            }
            if let Some(label) = &line.label {
                let x = ox + line.from.0.max(0.0) + 4.0;
                let y = oy + line.from.1.max(0.0) + 14.0;
                self.draw_text(pixmap, label, x, y, 12.0, palette::light_text());
            }
        }

        if let Some(circle) = scene.preview {
            if let Some(path) = PathBuilder::from_circle(circle.cx, circle.cy, circle.radius.max(1.0)) {
                pixmap.fill_path(
                    &path,
                    &solid(palette::preview_fill()),
                    FillRule::Winding,
                    to_window,
                    Some(&clip),
                );
                let stroke = Stroke {
                    width: 3.0,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &solid(palette::preview_stroke()), &stroke, to_window, Some(&clip));
            }
        }

        if scene.marker_visible() {
            self.render_marker(pixmap, scene.marker, to_window, &clip);
            let (mx, my) = scene.marker;
            self.draw_text(pixmap, MARKER_LABEL, ox + mx + 14.0, oy + my - 28.0, 13.0, palette::status());
        }

        let attribution_x = ox + scene.width - 200.0;
        let attribution_y = oy + scene.height - 6.0;
        self.draw_text(pixmap, ATTRIBUTION, attribution_x, attribution_y, 11.0, palette::status());
        Ok(())
    }

    /// Pin: a circle head on a short stem, anchored at the tip
    fn render_marker(&self, pixmap: &mut Pixmap, (x, y): (f32, f32), transform: Transform, clip: &Mask) {
        let mut pb = PathBuilder::new();
        pb.move_to(x, y);
        pb.line_to(x - 8.0, y - 20.0);
        pb.line_to(x + 8.0, y - 20.0);
        pb.close();
        pb.push_circle(x, y - 26.0, 10.0);
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &solid(palette::marker()), FillRule::Winding, transform, Some(clip));
        }
        if let Some(dot) = PathBuilder::from_circle(x, y - 26.0, 4.0) {
            pixmap.fill_path(&dot, &solid(palette::light_text()), FillRule::Winding, transform, Some(clip));
        }
    }

    fn render_toolbar(&self, pixmap: &mut Pixmap, frame: &Frame<'_>) {
        let layout = frame.layout;

        let search_rect = layout.search_box;
        if let Some(rect) = to_skia(search_rect) {
            fill_rect(pixmap, rect, palette::field(), None);
            if frame.search.is_focused() {
                stroke_rect(pixmap, rect, palette::field_focus(), 2.0);
            }
        }
        let (text, is_placeholder) = frame.search.display_text();
        let color = if is_placeholder {
            palette::placeholder()
        } else {
            palette::text()
        };
        let baseline = search_rect.y as f32 + search_rect.h as f32 * 0.7;
        self.draw_text(pixmap, text, search_rect.x as f32 + 8.0, baseline, 15.0, color);

        for control in [
            Control::SearchButton,
            Control::IncreaseRadius,
            Control::DecreaseRadius,
            Control::Select,
        ] {
            let color = match control {
                Control::SearchButton => palette::search_button(),
                Control::IncreaseRadius => palette::increase(),
                Control::DecreaseRadius => palette::decrease(),
                _ if frame.selecting => palette::select_active(),
                _ => palette::select(),
            };
            self.render_button(pixmap, layout.rect_of(control), control, color, frame.pressed == Some(control));
        }
    }

    fn render_button(&self, pixmap: &mut Pixmap, rect: Rect, control: Control, color: Color, pressed: bool) {
        let Some(area) = to_skia(rect) else {
            return;
        };
        let mut color = color;
        if pressed {
            color.set_alpha(0.75);
        }
        fill_rect(pixmap, area, color, None);

        if let Some(label) = control.label() {
            let text_color = if control == Control::Select {
                palette::text()
            } else {
                palette::light_text()
            };
            let size = 15.0;
            let width = self.text_width(label, size);
            let x = rect.x as f32 + (rect.w as f32 - width) / 2.0;
            let y = rect.y as f32 + rect.h as f32 * 0.7;
            self.draw_text(pixmap, label, x, y, size, text_color);
        }
    }

    fn render_status(&self, pixmap: &mut Pixmap, rect: Rect, text: &str) {
        if let Some(area) = to_skia(rect) {
            fill_rect(pixmap, area, palette::status(), None);
        }
        let baseline = rect.y as f32 + rect.h as f32 * 0.72;
        self.draw_text(pixmap, text, rect.x as f32 + 8.0, baseline, 13.0, palette::light_text());
    }

    /// Advance width of `text` at `size` pixels, zero without a font
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let Some(font) = &self.font else {
            return 0.0;
        };
        let scaled = font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    /// Draws `text` with its baseline at `y`
    fn draw_text(&self, pixmap: &mut Pixmap, text: &str, x: f32, y: f32, size: f32, color: Color) {
        let Some(font) = &self.font else {
            return;
        };
        let scaled = font.as_scaled(PxScale::from(size));
        let width = pixmap.width() as i32;
        let height = pixmap.height() as i32;
        let pixels = pixmap.pixels_mut();

        let mut caret = x;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scaled.scale(), point(caret, y));
            caret += scaled.h_advance(id);
            previous = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                let index = (py * width + px) as usize;
                pixels[index] = blend(pixels[index], color, coverage);
            });
        }
    }
}

fn load_font(path: &Path) -> Result<FontArc, RendererError> {
    let data = std::fs::read(path).map_err(|source| RendererError::FontUnreadable {
        path: path.display().to_string(),
        source,
    })?;
    FontArc::try_from_vec(data).map_err(|_| RendererError::InvalidFont {
        path: path.display().to_string(),
    })
}

/// Source-over of `color` at `coverage` onto a premultiplied pixel
fn blend(dst: PremultipliedColorU8, color: Color, coverage: f32) -> PremultipliedColorU8 {
    let alpha = (color.alpha() * coverage.clamp(0.0, 1.0)).clamp(0.0, 1.0);
    let inverse = 1.0 - alpha;
    let channel = |src: f32, dst: u8| (src * alpha * 255.0 + dst as f32 * inverse).round().clamp(0.0, 255.0) as u8;

    let a = (alpha * 255.0 + dst.alpha() as f32 * inverse).round().clamp(0.0, 255.0) as u8;
    let r = channel(color.red(), dst.red()).min(a);
    let g = channel(color.green(), dst.green()).min(a);
    let b = channel(color.blue(), dst.blue()).min(a);
    PremultipliedColorU8::from_rgba(r, g, b, a).unwrap_or(dst)
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn to_skia(rect: Rect) -> Option<SkiaRect> {
    SkiaRect::from_xywh(rect.x as f32, rect.y as f32, rect.w as f32, rect.h as f32)
}

fn fill_rect(pixmap: &mut Pixmap, rect: SkiaRect, color: Color, clip: Option<&Mask>) {
    pixmap.fill_rect(rect, &solid(color), Transform::identity(), clip);
}

fn stroke_rect(pixmap: &mut Pixmap, rect: SkiaRect, color: Color, width: f32) {
    let path = PathBuilder::from_rect(rect);
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
}

/// Converts tiny-skia's premultiplied RGBA to the BGRA order of a
/// top-down 32-bit DIB
pub fn pixmap_to_bgra(pixmap: &Pixmap) -> Vec<u8> {
    let mut data = pixmap.data().to_vec();
    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::{Mode, SelectionState};
    use crate::domain::geo::Coordinate;
    use crate::domain::viewport::Viewport;

    fn frame_parts(selecting: bool) -> (ShellLayout, MapScene, SearchBox) {
        let layout = ShellLayout::compute(640, 480);
        let center = Coordinate::new(20.0, 78.0).unwrap();
        let mut state = SelectionState::new(center, Default::default());
        if selecting {
            state.mode = Mode::Selecting {
                preview: Some(center),
            };
        }
        let viewport = Viewport::new(center, 10.0, layout.map.w as f64, layout.map.h as f64);
        let scene = MapScene::build(&state, &viewport, layout.map);
        (layout, scene, SearchBox::new())
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> PremultipliedColorU8 {
        pixmap.pixel(x, y).unwrap()
    }

    #[test]
    fn renders_full_window() {
        let (layout, scene, search) = frame_parts(false);
        let renderer = ShellRenderer::new(None);
        let pixmap = renderer
            .render(&Frame {
                layout: &layout,
                scene: &scene,
                search: &search,
                status: "status",
                pressed: None,
                selecting: false,
            })
            .unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (640, 480));

        // Map area corner shows the map background, not the window color
        let corner = pixel(&pixmap, 2, layout.map.y as u32 + 2);
        let expected = palette::map_background().premultiply().to_color_u8();
        assert_eq!(corner.red(), expected.red());
        assert_eq!(corner.blue(), expected.blue());
    }

    #[test]
    fn preview_circle_is_painted() {
        let (layout, scene, search) = frame_parts(true);
        let renderer = ShellRenderer::default();
        let frame = Frame {
            layout: &layout,
            scene: &scene,
            search: &search,
            status: "",
            pressed: None,
            selecting: true,
        };
        let with_preview = renderer.render(&frame).unwrap();

        let (_, idle_scene, _) = frame_parts(false);
        let idle = renderer
            .render(&Frame {
                scene: &idle_scene,
                selecting: false,
                ..frame
            })
            .unwrap();

        // A point inside the circle but away from the marker differs
        let circle = scene.preview.unwrap();
        let x = (scene.origin.0 + circle.cx + circle.radius * 0.5) as u32;
        let y = (scene.origin.1 + circle.cy + circle.radius * 0.5) as u32;
        assert_ne!(pixel(&with_preview, x, y), pixel(&idle, x, y));
    }

    #[test]
    fn text_width_without_font_is_zero() {
        assert_eq!(ShellRenderer::new(None).text_width("Search", 15.0), 0.0);
        assert!(!ShellRenderer::with_font_file(None).has_font());
    }

    #[test]
    fn missing_font_file_disables_labels() {
        let renderer = ShellRenderer::with_font_file(Some(Path::new("/no/such/font.ttf")));
        assert!(!renderer.has_font());
        assert!(matches!(
            load_font(Path::new("/no/such/font.ttf")),
            Err(RendererError::FontUnreadable { .. })
        ));
    }

    #[test]
    fn bgra_conversion_swaps_red_and_blue() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(Color::from_rgba8(10, 20, 30, 255));
        assert_eq!(pixmap_to_bgra(&pixmap), vec![30, 20, 10, 255]);
    }

    #[test]
    fn blending_full_coverage_replaces_pixel() {
        let dst = PremultipliedColorU8::from_rgba(0, 0, 0, 255).unwrap();
        let out = blend(dst, Color::from_rgba8(255, 255, 255, 255), 1.0);
        assert_eq!((out.red(), out.green(), out.blue(), out.alpha()), (255, 255, 255, 255));

        let none = blend(dst, Color::WHITE, 0.0);
        assert_eq!(none, dst);
    }
}

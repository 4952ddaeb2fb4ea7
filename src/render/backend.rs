use std::any::Any;
use std::fmt;

use crate::color::UiColor;
use crate::errors::{RenderError, Result};
use crate::geometry::{UiPadding, UiPoint, UiPointF, UiRect, UiRectF, UiSize};
use crate::render::native::{NativeWindow, RenderPaint};
use crate::render::rich_text::{RichTextCacheHandle, RichTextData, RichTextEdit, RichTextMetrics};
use crate::render::types::{
    BitmapAlphaType, DashStyle, FillType, Gradient, LineCap, LineJoin, RenderClipType, RopMode,
    TextFormat, TiledDrawParam, UiFont,
};

/// Which family of implementation produced a render object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendType {
    /// The software rasterizer in this crate.
    Raster,
    /// A host-provided vector library backend.
    Vector,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::Raster => write!(f, "raster"),
            BackendType::Vector => write!(f, "vector"),
        }
    }
}

/// Common base of every render object so backends can recover their concrete types.
pub trait RenderObject: Any {
    fn backend_type(&self) -> BackendType;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Recover the concrete type behind a render object, checking the backend tag first.
pub fn downcast_ref<T: 'static, O: RenderObject + ?Sized>(obj: &O, expected: BackendType) -> Result<&T> {
    let actual = obj.backend_type();
    if actual != expected {
        return Err(RenderError::BackendMismatch { expected, actual });
    }
    obj.as_any()
        .downcast_ref::<T>()
        .ok_or(RenderError::BackendMismatch { expected, actual })
}

pub fn downcast_mut<T: 'static, O: RenderObject + ?Sized>(obj: &mut O, expected: BackendType) -> Result<&mut T> {
    let actual = obj.backend_type();
    if actual != expected {
        return Err(RenderError::BackendMismatch { expected, actual });
    }
    obj.as_any_mut()
        .downcast_mut::<T>()
        .ok_or(RenderError::BackendMismatch { expected, actual })
}

/// A 32-bit ARGB image.
pub trait Bitmap: RenderObject {
    /// (Re)allocate the image. `pixels`, when given, holds `width * height * 4` little-endian bytes.
    fn init(
        &mut self,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
        scale: f32,
        alpha_type: BitmapAlphaType,
    ) -> Result<()>;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn size(&self) -> UiSize {
        UiSize::new(self.width() as i32, self.height() as i32)
    }
    fn alpha_type(&self) -> BitmapAlphaType;
    fn lock_pixel_bits(&mut self) -> Option<&mut [u32]>;
    fn unlock_pixel_bits(&mut self);
    fn clone_bitmap(&self) -> Box<dyn Bitmap>;
}

pub trait Font: RenderObject {
    fn init_font(&mut self, font: &UiFont) -> Result<()>;
    fn font_name(&self) -> &str;
    fn font_size(&self) -> i32;
    fn is_bold(&self) -> bool;
    fn is_italic(&self) -> bool;
    fn is_underline(&self) -> bool;
    fn is_strikeout(&self) -> bool;
    fn clone_font(&self) -> Box<dyn Font>;
}

pub trait Pen: RenderObject {
    fn width(&self) -> f32;
    fn set_width(&mut self, width: f32);
    fn color(&self) -> UiColor;
    fn set_color(&mut self, color: UiColor);
    fn start_cap(&self) -> LineCap;
    fn set_start_cap(&mut self, cap: LineCap);
    fn end_cap(&self) -> LineCap;
    fn set_end_cap(&mut self, cap: LineCap);
    fn dash_cap(&self) -> LineCap;
    fn set_dash_cap(&mut self, cap: LineCap);
    fn line_join(&self) -> LineJoin;
    fn set_line_join(&mut self, join: LineJoin);
    fn dash_style(&self) -> DashStyle;
    fn set_dash_style(&mut self, style: DashStyle);
    fn clone_pen(&self) -> Box<dyn Pen>;
}

pub trait Brush: RenderObject {
    fn color(&self) -> UiColor;
    fn clone_brush(&self) -> Box<dyn Brush>;
}

/// 2x3 affine transform `[m11, m12, m21, m22, dx, dy]`.
pub trait Matrix: RenderObject {
    fn translate(&mut self, offset: UiPointF);
    fn scale(&mut self, sx: f32, sy: f32);
    /// Rotate by `angle` degrees, clockwise in a y-down space.
    fn rotate(&mut self, angle: f32);
    fn rotate_at(&mut self, angle: f32, center: UiPointF);
    fn transform_point(&self, pt: UiPointF) -> UiPointF;
    fn elements(&self) -> [f32; 6];
}

pub trait Path: RenderObject {
    fn fill_type(&self) -> FillType;
    fn set_fill_type(&mut self, fill_type: FillType);
    fn add_line(&mut self, p1: UiPointF, p2: UiPointF);
    fn add_lines(&mut self, points: &[UiPointF]);
    fn add_bezier(&mut self, p1: UiPointF, p2: UiPointF, p3: UiPointF, p4: UiPointF);
    /// A start point followed by groups of three points per segment.
    fn add_beziers(&mut self, points: &[UiPointF]);
    fn add_rect(&mut self, rc: UiRectF);
    fn add_ellipse(&mut self, rc: UiRectF);
    fn add_arc(&mut self, rc: UiRectF, start_angle: f32, sweep_angle: f32);
    fn add_polygon(&mut self, points: &[UiPoint]);
    fn add_polygon_f(&mut self, points: &[UiPointF]);
    fn transform(&mut self, matrix: &dyn Matrix);
    /// Bounding box, widened by half the pen width when a pen is given.
    fn bounds(&self, pen: Option<&dyn Pen>) -> UiRectF;
    fn close(&mut self);
    fn reset(&mut self);
    fn clone_path(&self) -> Box<dyn Path>;
}

pub struct MeasureStringParam<'a> {
    pub font: &'a dyn Font,
    pub format: TextFormat,
    /// Layout width limit; unlimited when `None`.
    pub rect_size: Option<i32>,
}

pub struct DrawStringParam<'a> {
    pub font: &'a dyn Font,
    pub text_rect: UiRect,
    pub color: UiColor,
    pub fade: u8,
    pub format: TextFormat,
}

/// Surface state: size, origin, clip, raw pixel access.
pub trait RenderCanvas: RenderObject {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Reallocate the surface. Previous content is discarded.
    fn resize(&mut self, width: i32, height: i32) -> Result<()>;
    fn is_empty(&self) -> bool;

    /// Shift the window origin by `-offset`; returns the previous origin.
    fn offset_window_org(&mut self, offset: UiPoint) -> UiPoint;
    fn set_window_org(&mut self, pt: UiPoint) -> UiPoint;
    fn window_org(&self) -> UiPoint;

    /// Push the active clip; the returned token goes to the matching `restore_clip`.
    fn save_clip(&mut self) -> usize;
    fn restore_clip(&mut self, token: usize);
    fn set_clip(&mut self, rc: UiRect, intersect: bool);
    fn set_round_clip(&mut self, rc: UiRect, rx: i32, ry: i32, intersect: bool);
    fn clear_clip(&mut self);
    fn clip_info(&self) -> (RenderClipType, Vec<UiRect>);
    fn is_clip_empty(&self) -> bool;

    fn clear(&mut self, color: UiColor);
    fn clear_rect(&mut self, rc: UiRect, color: UiColor);

    /// Copy device pixels in `rc` to `dst` as little-endian ARGB bytes.
    fn read_pixels(&self, dst: &mut [u8], rc: UiRect) -> Result<()>;
    fn write_pixels(&mut self, src: &[u8], rc: UiRect) -> Result<()>;
    /// `src` covers all of `rc`; only the part inside `paint_rc` is committed.
    fn write_pixels_in(&mut self, src: &[u8], rc: UiRect, paint_rc: UiRect) -> Result<()>;

    fn make_image_snapshot(&self) -> Option<Box<dyn Bitmap>>;
    fn clear_alpha(&mut self, rc: UiRect, alpha: u8);
    fn restore_alpha(&mut self, rc: UiRect, padding: UiPadding, alpha: u8);
    fn restore_alpha_opaque(&mut self, rc: UiRect, padding: UiPadding);
    fn clone_render(&self) -> Box<dyn Render>;
}

#[allow(clippy::too_many_arguments)]
pub trait RenderImages {
    fn bit_blt(
        &mut self,
        x: i32,
        y: i32,
        cx: i32,
        cy: i32,
        src: &dyn Render,
        x_src: i32,
        y_src: i32,
        rop: RopMode,
    ) -> Result<()>;
    fn stretch_blt(
        &mut self,
        x: i32,
        y: i32,
        cx: i32,
        cy: i32,
        src: &dyn Render,
        x_src: i32,
        y_src: i32,
        cx_src: i32,
        cy_src: i32,
        rop: RopMode,
    ) -> Result<()>;
    fn alpha_blend(
        &mut self,
        x: i32,
        y: i32,
        cx: i32,
        cy: i32,
        src: &dyn Render,
        x_src: i32,
        y_src: i32,
        cx_src: i32,
        cy_src: i32,
        alpha: u8,
    ) -> Result<()>;

    /// Nine-patch draw. Corner paddings split destination and source into a 3x3 grid.
    fn draw_image(
        &mut self,
        paint_rc: UiRect,
        bitmap: &dyn Bitmap,
        rc_dest: UiRect,
        rc_dest_corners: UiPadding,
        rc_source: UiRect,
        rc_source_corners: UiPadding,
        fade: u8,
        tiled: Option<&TiledDrawParam>,
        window_shadow_mode: bool,
    );
    fn draw_image_simple(&mut self, paint_rc: UiRect, bitmap: &dyn Bitmap, rc_dest: UiRect, rc_source: UiRect, fade: u8);
    fn draw_image_rect(
        &mut self,
        paint_rc: UiRect,
        bitmap: &dyn Bitmap,
        rc_dest: UiRect,
        rc_source: UiRect,
        fade: u8,
        matrix: Option<&dyn Matrix>,
    );
}

#[allow(clippy::too_many_arguments)]
pub trait RenderShapes {
    fn fill_rect(&mut self, rc: UiRect, color: UiColor, fade: u8);
    fn fill_rect_gradient(&mut self, rc: UiRect, from: UiColor, to: UiColor, direction: i8, fade: u8);
    fn draw_line(&mut self, p1: UiPointF, p2: UiPointF, color: UiColor, width: f32, fade: u8);
    fn draw_line_pen(&mut self, p1: UiPointF, p2: UiPointF, pen: &dyn Pen, fade: u8);
    fn draw_rect(&mut self, rc: UiRect, color: UiColor, width: f32, line_in_rect: bool, fade: u8);
    fn draw_rect_pen(&mut self, rc: UiRect, pen: &dyn Pen, line_in_rect: bool, fade: u8);
    fn draw_round_rect(&mut self, rc: UiRect, rx: f32, ry: f32, color: UiColor, width: f32, fade: u8);
    fn draw_round_rect_pen(&mut self, rc: UiRect, rx: f32, ry: f32, pen: &dyn Pen, fade: u8);
    fn fill_round_rect(&mut self, rc: UiRect, rx: f32, ry: f32, color: UiColor, fade: u8);
    fn fill_round_rect_gradient(
        &mut self,
        rc: UiRect,
        rx: f32,
        ry: f32,
        from: UiColor,
        to: UiColor,
        direction: i8,
        fade: u8,
    );
    fn draw_circle(&mut self, center: UiPoint, radius: i32, color: UiColor, width: f32, fade: u8);
    fn draw_circle_pen(&mut self, center: UiPoint, radius: i32, pen: &dyn Pen, fade: u8);
    fn fill_circle(&mut self, center: UiPoint, radius: i32, color: UiColor, fade: u8);
    /// Angles in degrees, clockwise from the positive x axis.
    fn draw_arc(
        &mut self,
        rc: UiRect,
        start_angle: f32,
        sweep_angle: f32,
        use_center: bool,
        pen: &dyn Pen,
        gradient: Option<&Gradient>,
    );
    fn draw_path(&mut self, path: &dyn Path, pen: &dyn Pen);
    fn fill_path(&mut self, path: &dyn Path, brush: &dyn Brush);
    fn fill_path_gradient(&mut self, path: &dyn Path, rc: UiRect, from: UiColor, to: UiColor, direction: i8);
    fn draw_box_shadow(&mut self, rc: UiRect, radius: UiSize, offset: UiPoint, blur: i32, spread: i32, color: UiColor);
}

pub trait RenderText {
    fn measure_string(&mut self, text: &str, param: &MeasureStringParam<'_>) -> UiRect;
    fn draw_string(&mut self, text: &str, param: &DrawStringParam<'_>);

    fn measure_rich_text(&mut self, rc: UiRect, scroll: UiSize, runs: &[RichTextData]) -> Vec<Vec<UiRect>>;
    fn measure_rich_text2(&mut self, rc: UiRect, scroll: UiSize, runs: &[RichTextData]) -> RichTextMetrics;
    fn measure_rich_text3(
        &mut self,
        rc: UiRect,
        scroll: UiSize,
        runs: &[RichTextData],
    ) -> (RichTextMetrics, Option<RichTextCacheHandle>);
    fn draw_rich_text(&mut self, rc: UiRect, scroll: UiSize, runs: &[RichTextData], fade: u8) -> Vec<Vec<UiRect>>;

    fn create_draw_rich_text_cache(
        &mut self,
        rc: UiRect,
        scroll: UiSize,
        runs: &[RichTextData],
    ) -> Option<RichTextCacheHandle>;
    fn is_valid_draw_rich_text_cache(&self, rc: UiRect, runs: &[RichTextData], cache: &RichTextCacheHandle) -> bool;
    fn update_draw_rich_text_cache(
        &mut self,
        old: &mut RichTextCacheHandle,
        update: &RichTextCacheHandle,
        runs_new: &[RichTextData],
        edit: &RichTextEdit,
    ) -> bool;
    fn is_draw_rich_text_cache_equal(&self, a: &RichTextCacheHandle, b: &RichTextCacheHandle) -> bool;
    fn draw_rich_text_cache_data(
        &mut self,
        cache: &RichTextCacheHandle,
        rc: UiRect,
        scroll: UiSize,
        row_x_offsets: &[i32],
        fade: u8,
    ) -> Vec<Vec<UiRect>>;
}

pub trait RenderPresent {
    /// Run `draw` against a native-compatible copy of the pixels and commit its changes back.
    fn with_render_dc(&mut self, draw: &mut dyn FnMut(&mut [u32], u32, u32)) -> Result<()>;
    fn paint_and_swap_buffers(&mut self, paint: &mut dyn RenderPaint) -> Result<()>;
    fn set_window_round_rect_rgn(&mut self, rc: UiRect, rx: f32, ry: f32, redraw: bool) -> bool;
    fn set_window_rect_rgn(&mut self, rc: UiRect, redraw: bool) -> bool;
    fn clear_window_rgn(&mut self, redraw: bool);
}

/// The full drawing surface.
pub trait Render: RenderCanvas + RenderImages + RenderShapes + RenderText + RenderPresent {}

impl<T: RenderCanvas + RenderImages + RenderShapes + RenderText + RenderPresent> Render for T {}

/// Constructs the render objects of one backend.
pub trait RenderFactory {
    fn backend_type(&self) -> BackendType;
    fn create_font(&self) -> Box<dyn Font>;
    fn create_pen(&self, color: UiColor, width: f32) -> Box<dyn Pen>;
    fn create_brush(&self, color: UiColor) -> Box<dyn Brush>;
    fn create_path(&self) -> Box<dyn Path>;
    fn create_matrix(&self) -> Box<dyn Matrix>;
    fn create_bitmap(&self) -> Box<dyn Bitmap>;
    fn create_render(&self, window: Option<Box<dyn NativeWindow>>) -> Box<dyn Render>;
}

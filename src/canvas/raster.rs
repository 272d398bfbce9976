//! 位图导出
//!
//! 用 tiny-skia 把文档画到 RGBA 位图上：白色背景，元素按顺序绘制。
//! 不做字体排版，文字按字符画成色块。

use super::element::{
    Element, HexColor, IconElement, IconKind, ShapeElement, ShapeGeometry, ShapeKind, TextAlign,
    TextElement,
};
use crate::error::{MeetolioError, Result};
use base64ct::{Base64, Encoding};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// 渲染结果
pub struct RasterImage {
    pixmap: Pixmap,
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// 取某个像素的 RGBA（已去预乘）；越界返回 `None`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        // Pixmap::pixel 只检查线性下标，x 越界会落到下一行
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| MeetolioError::render(format!("png encoding failed: {e}")))
    }

    /// 用于下载链接的 `data:image/png;base64,...`
    pub fn to_data_url(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", Base64::encode_string(&png)))
    }
}

fn paint(color: HexColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    paint
}

/// 把 `elements` 画到 `width`×`height` 的画布上，再整体缩放 `scale` 倍
pub fn render(elements: &[Element], width: f32, height: f32, scale: f32) -> Result<RasterImage> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(MeetolioError::invalid_input(format!("invalid export scale: {scale}")));
    }
    let px_w = (width * scale).round() as u32;
    let px_h = (height * scale).round() as u32;
    let mut pixmap = Pixmap::new(px_w, px_h).ok_or_else(|| {
        MeetolioError::render(format!("cannot allocate {px_w}x{px_h} bitmap"))
    })?;
    pixmap.fill(Color::WHITE);

    let ts = Transform::from_scale(scale, scale);
    for element in elements {
        match element {
            Element::Text(text) => draw_text(&mut pixmap, text, ts),
            Element::Shape(shape) => draw_shape(&mut pixmap, shape, ts),
            Element::Icon(icon) => draw_icon(&mut pixmap, icon, ts),
        }
    }
    Ok(RasterImage { pixmap })
}

fn fill_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: HexColor, ts: Transform) {
    // 宽或高为 0 时 from_xywh 返回 None，什么也不画
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        pixmap.fill_rect(rect, &paint(color), ts, None);
    }
}

fn draw_shape(pixmap: &mut Pixmap, shape: &ShapeElement, ts: Transform) {
    let (x, y) = (shape.position.x, shape.position.y);
    let path = match &shape.geometry {
        ShapeGeometry::Rect { width, height } => {
            Rect::from_xywh(x, y, *width, *height).map(PathBuilder::from_rect)
        }
        ShapeGeometry::Circle { radius } => PathBuilder::from_circle(x, y, *radius),
        ShapeGeometry::Line { points } => {
            let mut pb = PathBuilder::new();
            let mut pairs = points.chunks_exact(2);
            if let Some(first) = pairs.next() {
                pb.move_to(x + first[0], y + first[1]);
                for p in pairs {
                    pb.line_to(x + p[0], y + p[1]);
                }
            }
            pb.finish()
        }
    };
    let Some(path) = path else {
        return;
    };

    // 折线不封闭，只描边
    if shape.geometry.kind() != ShapeKind::Line {
        pixmap.fill_path(&path, &paint(shape.fill), FillRule::Winding, ts, None);
    }
    if shape.stroke_width > 0.0 {
        let stroke = Stroke {
            width: shape.stroke_width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint(shape.stroke), &stroke, ts, None);
    }
}

fn draw_icon(pixmap: &mut Pixmap, icon: &IconElement, ts: Transform) {
    let (x, y) = (icon.position.x, icon.position.y);
    let s = icon.size;
    match icon.kind {
        IconKind::Phone => fill_rect(pixmap, x, y, s, s * 1.6, icon.color, ts),
        IconKind::Email => fill_rect(pixmap, x, y, s, s * 0.8, icon.color, ts),
        IconKind::Website => {
            if let Some(path) = PathBuilder::from_circle(x + s / 2.0, y + s / 2.0, s / 2.0) {
                pixmap.fill_path(&path, &paint(icon.color), FillRule::Winding, ts, None);
            }
        }
    }
}

/// 字符宽度：全角字符占满一个字号，其余占 0.6 个字号
fn advance(c: char, font_size: f32) -> f32 {
    if (c as u32) >= 0x2E80 {
        font_size
    } else {
        font_size * 0.6
    }
}

fn draw_text(pixmap: &mut Pixmap, text: &TextElement, ts: Transform) {
    let size = text.font_size;
    if size <= 0.0 {
        return;
    }
    let line_height = size * 1.2;

    for (row, line) in text.content.lines().enumerate() {
        let line_width: f32 = line.chars().map(|c| advance(c, size)).sum();
        let mut cx = match text.align {
            TextAlign::Left => text.position.x,
            TextAlign::Center => text.position.x - line_width / 2.0,
            TextAlign::Right => text.position.x - line_width,
        };
        let top = text.position.y + row as f32 * line_height + size * 0.15;

        for c in line.chars() {
            let w = advance(c, size);
            if !c.is_whitespace() {
                fill_rect(pixmap, cx + w * 0.1, top, w * 0.8, size * 0.7, text.color, ts);
            }
            cx += w;
        }
    }
}

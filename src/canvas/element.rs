//! 名片画布上的可绘制元素

use crate::error::MeetolioError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

// =========================================================
// 基础类型
// =========================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// `#rrggbb` 颜色，解析时也接受 `#rgb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const BLACK: HexColor = HexColor::rgb(0, 0, 0);
    pub const WHITE: HexColor = HexColor::rgb(255, 255, 255);
    pub const GRAY: HexColor = HexColor::rgb(0x66, 0x66, 0x66);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for HexColor {
    type Err = MeetolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MeetolioError::invalid_input(format!("invalid color: {s}"));
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        match hex.len() {
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            3 => {
                let (r, g, b) = (channel(0..1)?, channel(1..2)?, channel(2..3)?);
                Ok(Self::rgb(r * 17, g * 17, b * 17))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = MeetolioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> Self {
        c.to_string()
    }
}

impl Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// =========================================================
// 元素
// =========================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// 文本预设样式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    Heading,
    Subheading,
    #[default]
    Body,
}

impl TextStyle {
    /// (字号, 纵坐标, 默认文字)
    pub(crate) fn preset(&self) -> (f32, f32, &'static str) {
        match self {
            TextStyle::Heading => (24.0, 80.0, "見出し"),
            TextStyle::Subheading => (18.0, 110.0, "小見出し"),
            TextStyle::Body => (14.0, 140.0, "本文"),
        }
    }
}

/// 文本元素
///
/// `position.x` 是对齐锚点：居中时为中心，左对齐时为左边缘，右对齐时为右边缘。
/// `position.y` 是第一行的顶部。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: String,
    pub content: String,
    pub position: Point,
    pub font_size: f32,
    pub font_family: String,
    pub color: HexColor,
    pub width: f32,
    pub align: TextAlign,
    pub style: TextStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Circle,
    Line,
}

/// 形状的几何参数，坐标相对于元素的 `position`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeGeometry {
    /// `position` 为左上角
    Rect { width: f32, height: f32 },
    /// `position` 为圆心
    Circle { radius: f32 },
    /// 折线顶点 `[x0, y0, x1, y1, ...]`
    Line { points: Vec<f32> },
}

impl ShapeGeometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeGeometry::Rect { .. } => ShapeKind::Rect,
            ShapeGeometry::Circle { .. } => ShapeKind::Circle,
            ShapeGeometry::Line { .. } => ShapeKind::Line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    pub id: String,
    pub position: Point,
    pub geometry: ShapeGeometry,
    pub fill: HexColor,
    pub stroke: HexColor,
    pub stroke_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKind {
    Phone,
    Email,
    Website,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconElement {
    pub id: String,
    pub kind: IconKind,
    pub position: Point,
    pub size: f32,
    pub color: HexColor,
}

/// 画布元素；在文档中的顺序即绘制顺序，后面的在上层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Text(TextElement),
    Shape(ShapeElement),
    Icon(IconElement),
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Text(t) => &t.id,
            Element::Shape(s) => &s.id,
            Element::Icon(i) => &i.id,
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Element::Text(t) => t.position,
            Element::Shape(s) => s.position,
            Element::Icon(i) => i.position,
        }
    }

    fn position_mut(&mut self) -> &mut Point {
        match self {
            Element::Text(t) => &mut t.position,
            Element::Shape(s) => &mut s.position,
            Element::Icon(i) => &mut i.position,
        }
    }

    pub fn set_position(&mut self, position: Point) {
        *self.position_mut() = position;
    }

    /// 只改一个坐标轴（对齐时使用）
    pub fn set_x(&mut self, x: f32) {
        self.position_mut().x = x;
    }

    pub fn set_y(&mut self, y: f32) {
        self.position_mut().y = y;
    }

    /// 应用部分更新；与该元素类型无关的字段被忽略
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(position) = patch.position {
            self.set_position(position);
        }
        match self {
            Element::Text(t) => {
                if let Some(content) = &patch.content {
                    t.content = content.clone();
                }
                if let Some(size) = patch.font_size {
                    t.font_size = size;
                }
                if let Some(family) = &patch.font_family {
                    t.font_family = family.clone();
                }
                if let Some(color) = patch.color {
                    t.color = color;
                }
                if let Some(width) = patch.width {
                    t.width = width;
                }
                if let Some(align) = patch.align {
                    t.align = align;
                }
            }
            Element::Shape(s) => {
                if let Some(color) = patch.color {
                    s.fill = color;
                }
                if let Some(stroke) = patch.stroke {
                    s.stroke = stroke;
                }
                if let Some(w) = patch.stroke_width {
                    s.stroke_width = w;
                }
                match &mut s.geometry {
                    ShapeGeometry::Rect { width, height } => {
                        if let Some(w) = patch.width {
                            *width = w;
                        }
                        if let Some(h) = patch.height {
                            *height = h;
                        }
                    }
                    ShapeGeometry::Circle { radius } => {
                        if let Some(r) = patch.radius {
                            *radius = r;
                        }
                    }
                    ShapeGeometry::Line { points } => {
                        if let Some(p) = &patch.points {
                            *points = p.clone();
                        }
                    }
                }
            }
            Element::Icon(i) => {
                if let Some(color) = patch.color {
                    i.color = color;
                }
                if let Some(size) = patch.size {
                    i.size = size;
                }
            }
        }
    }
}

/// 元素的部分更新
///
/// `color` 对文本是文字颜色，对形状是填充色，对图标是图标颜色。
/// `width` 对文本是文本框宽度，对矩形是宽度。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Point>,
    pub content: Option<String>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub color: Option<HexColor>,
    pub stroke: Option<HexColor>,
    pub stroke_width: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub radius: Option<f32>,
    pub size: Option<f32>,
    pub points: Option<Vec<f32>>,
    pub align: Option<TextAlign>,
}

impl ElementPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            position: Some(Point::new(x, y)),
            ..Self::default()
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn font_size(size: f32) -> Self {
        Self {
            font_size: Some(size),
            ..Self::default()
        }
    }

    pub fn color(color: HexColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text() -> Element {
        Element::Text(TextElement {
            id: "t".into(),
            content: "hi".into(),
            position: Point::new(200.0, 80.0),
            font_size: 24.0,
            font_family: "Arial".into(),
            color: HexColor::BLACK,
            width: 400.0,
            align: TextAlign::Center,
            style: TextStyle::Heading,
        })
    }

    #[test]
    fn test_hex_color_parse() {
        assert_eq!("#ff8000".parse::<HexColor>().unwrap(), HexColor::rgb(255, 128, 0));
        assert_eq!("#FFF".parse::<HexColor>().unwrap(), HexColor::WHITE);
        assert!("ff8000".parse::<HexColor>().is_err());
        assert!("#12345".parse::<HexColor>().is_err());
        assert!("#gg0000".parse::<HexColor>().is_err());
        assert_eq!(HexColor::GRAY.to_string(), "#666666");
    }

    #[test]
    fn test_element_json_shape() {
        let rect = Element::Shape(ShapeElement {
            id: "rect-1".into(),
            position: Point::new(100.0, 100.0),
            geometry: ShapeGeometry::Rect {
                width: 100.0,
                height: 60.0,
            },
            fill: HexColor::BLACK,
            stroke: HexColor::BLACK,
            stroke_width: 2.0,
        });
        let value = serde_json::to_value(&rect).unwrap();
        assert_eq!(value["type"], json!("shape"));
        assert_eq!(value["geometry"]["kind"], json!("rect"));
        assert_eq!(value["fill"], json!("#000000"));
        assert_eq!(value["strokeWidth"], json!(2.0));

        let bad = json!({
            "type": "icon", "id": "i", "kind": "phone",
            "position": { "x": 0.0, "y": 0.0 }, "size": 24.0, "color": "red"
        });
        assert!(serde_json::from_value::<Element>(bad).is_err());
    }

    #[test]
    fn test_apply_patch_to_text() {
        let mut el = text();
        el.apply(&ElementPatch {
            font_size: Some(30.0),
            content: Some("hello".into()),
            radius: Some(5.0),
            ..ElementPatch::default()
        });
        let Element::Text(t) = el else {
            panic!("expected text");
        };
        assert_eq!(t.font_size, 30.0);
        assert_eq!(t.content, "hello");
        assert_eq!(t.position, Point::new(200.0, 80.0));
    }

    #[test]
    fn test_apply_patch_to_shapes() {
        let mut circle = Element::Shape(ShapeElement {
            id: "c".into(),
            position: Point::new(150.0, 150.0),
            geometry: ShapeGeometry::Circle { radius: 30.0 },
            fill: HexColor::BLACK,
            stroke: HexColor::BLACK,
            stroke_width: 2.0,
        });
        circle.apply(&ElementPatch {
            radius: Some(10.0),
            width: Some(99.0),
            color: Some(HexColor::WHITE),
            position: Some(Point::new(1.0, 2.0)),
            ..ElementPatch::default()
        });
        let Element::Shape(s) = &circle else {
            panic!("expected shape");
        };
        assert_eq!(s.geometry, ShapeGeometry::Circle { radius: 10.0 });
        assert_eq!(s.fill, HexColor::WHITE);
        assert_eq!(circle.position(), Point::new(1.0, 2.0));
    }
}

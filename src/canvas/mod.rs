//! 名片设计画布
//!
//! 名片有正反两面，每面是一个有序元素列表（文档）加上自己的撤销历史。
//! 每次修改都立即提交为一个历史快照，当前文档始终等于游标处的快照。

pub mod element;
pub mod history;
pub mod raster;

use crate::error::{MeetolioError, Result};
use history::{DEFAULT_HISTORY_LIMIT, History};
use meetolio_shared::Profile;
use raster::RasterImage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

pub use element::{
    Element, ElementPatch, HexColor, IconElement, IconKind, Point, ShapeElement, ShapeGeometry,
    ShapeKind, TextAlign, TextElement, TextStyle,
};

/// 舞台尺寸（逻辑像素，名片比例）
pub const STAGE_WIDTH: f32 = 400.0;
pub const STAGE_HEIGHT: f32 = 242.0;

const DEFAULT_FONT_FAMILY: &str = "Arial";

pub type Document = Vec<Element>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Back,
}

/// 对齐到舞台上的固定位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl Alignment {
    fn apply(self, element: &mut Element) {
        match self {
            Alignment::Left => element.set_x(50.0),
            Alignment::Center => element.set_x(200.0),
            Alignment::Right => element.set_x(350.0),
            Alignment::Top => element.set_y(50.0),
            Alignment::Middle => element.set_y(121.0),
            Alignment::Bottom => element.set_y(192.0),
        }
    }
}

/// 图层方向：Forward 向上一层，Backward 向下一层
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// 保存用的序列化形式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedDesign {
    pub front: Document,
    pub back: Document,
}

pub struct DesignCanvas {
    front: History<Document>,
    back: History<Document>,
    side: Side,
    selected: Option<String>,
    /// 新文本元素使用的字体
    font_family: String,
    /// 新元素使用的颜色
    color: HexColor,
    history_limit: usize,
}

impl Default for DesignCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl DesignCanvas {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self::from_documents(Vec::new(), Vec::new(), limit)
    }

    fn from_documents(front: Document, back: Document, limit: usize) -> Self {
        Self {
            front: History::new(front, limit),
            back: History::new(back, limit),
            side: Side::Front,
            selected: None,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            color: HexColor::BLACK,
            history_limit: limit,
        }
    }

    /// 用资料填充两面的初始文字
    ///
    /// 正面：公司、职位、姓名；背面：邮箱、电话、网站。字段为空时显示占位文字。
    pub fn from_profile(profile: &Profile) -> Self {
        fn or<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
            if value.trim().is_empty() { placeholder } else { value }
        }
        let company = or(&profile.company, "会社名");
        let occupation = or(&profile.occupation, "役職");
        let name = or(&profile.name, "氏名");
        let email = or(&profile.contact.email, "メールアドレス");
        let website = or(&profile.contact.website, "ウェブサイト");

        let front = vec![
            seed_text("company", company, 60.0, 18.0, HexColor::BLACK, TextStyle::Heading),
            seed_text("jobTitle", occupation, 90.0, 14.0, HexColor::GRAY, TextStyle::Subheading),
            seed_text("name", name, 120.0, 16.0, HexColor::BLACK, TextStyle::Body),
        ];
        let back = vec![
            seed_text("email", email, 80.0, 12.0, HexColor::BLACK, TextStyle::Body),
            seed_text("phone", "電話番号", 110.0, 12.0, HexColor::BLACK, TextStyle::Body),
            seed_text("website", website, 140.0, 12.0, HexColor::BLACK, TextStyle::Body),
        ];
        Self::from_documents(front, back, DEFAULT_HISTORY_LIMIT)
    }

    // =========================================================
    // 读取
    // =========================================================

    fn history(&self) -> &History<Document> {
        match self.side {
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }

    fn history_mut(&mut self) -> &mut History<Document> {
        match self.side {
            Side::Front => &mut self.front,
            Side::Back => &mut self.back,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// 当前面的文档
    pub fn elements(&self) -> &[Element] {
        self.history().current()
    }

    pub fn document(&self, side: Side) -> &[Element] {
        match side {
            Side::Front => self.front.current(),
            Side::Back => self.back.current(),
        }
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements().iter().find(|e| e.id() == id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn history_cursor(&self) -> usize {
        self.history().cursor()
    }

    pub fn history_len(&self) -> usize {
        self.history().len()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn can_undo(&self) -> bool {
        self.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history().can_redo()
    }

    // =========================================================
    // 选择与工具设置
    // =========================================================

    /// 选中元素；id 不在当前文档中时返回 false 且不改变选择
    pub fn select(&mut self, id: &str) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn switch_side(&mut self, side: Side) {
        if self.side != side {
            self.side = side;
            self.selected = None;
        }
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.font_family = family.into();
    }

    pub fn set_color(&mut self, color: HexColor) {
        self.color = color;
    }

    // =========================================================
    // 修改（每个操作提交一个历史快照）
    // =========================================================

    fn commit(&mut self, document: Document, op: &'static str) {
        let history = self.history_mut();
        history.push(document);
        debug!(op, cursor = history.cursor(), len = history.len(), "canvas commit");
    }

    fn add(&mut self, element: Element) -> String {
        let id = element.id().to_string();
        let mut document = self.elements().to_vec();
        document.push(element);
        self.commit(document, "add");
        self.selected = Some(id.clone());
        id
    }

    /// 按预设添加文本，返回新元素的 id 并选中它
    pub fn add_text(&mut self, style: TextStyle) -> String {
        let (font_size, y, content) = style.preset();
        self.add(Element::Text(TextElement {
            id: new_id("text"),
            content: content.to_string(),
            position: Point::new(200.0, y),
            font_size,
            font_family: self.font_family.clone(),
            color: self.color,
            width: 400.0,
            align: TextAlign::Center,
            style,
        }))
    }

    pub fn add_shape(&mut self, kind: ShapeKind) -> String {
        let (prefix, position, geometry, fill) = match kind {
            ShapeKind::Rect => (
                "rect",
                Point::new(100.0, 100.0),
                ShapeGeometry::Rect {
                    width: 100.0,
                    height: 60.0,
                },
                self.color,
            ),
            ShapeKind::Circle => (
                "circle",
                Point::new(150.0, 150.0),
                ShapeGeometry::Circle { radius: 30.0 },
                self.color,
            ),
            ShapeKind::Line => (
                "line",
                Point::new(100.0, 100.0),
                ShapeGeometry::Line {
                    points: vec![0.0, 0.0, 100.0, 0.0],
                },
                HexColor::BLACK,
            ),
        };
        self.add(Element::Shape(ShapeElement {
            id: new_id(prefix),
            position,
            geometry,
            fill,
            stroke: HexColor::BLACK,
            stroke_width: 2.0,
        }))
    }

    pub fn add_icon(&mut self, kind: IconKind) -> String {
        self.add(Element::Icon(IconElement {
            id: new_id("icon"),
            kind,
            position: Point::new(100.0, 100.0),
            size: 24.0,
            color: self.color,
        }))
    }

    /// 部分更新；id 不存在时文档不变，但仍提交一个快照
    pub fn update_element(&mut self, id: &str, patch: &ElementPatch) {
        let document = self
            .elements()
            .iter()
            .cloned()
            .map(|mut e| {
                if e.id() == id {
                    e.apply(patch);
                }
                e
            })
            .collect();
        self.commit(document, "update");
    }

    /// 拖动结束时提交新位置
    pub fn move_element(&mut self, id: &str, x: f32, y: f32) {
        self.update_element(id, &ElementPatch::position(x, y));
    }

    pub fn remove_element(&mut self, id: &str) {
        let document = self
            .elements()
            .iter()
            .filter(|e| e.id() != id)
            .cloned()
            .collect();
        self.commit(document, "remove");
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
    }

    /// 与相邻元素交换绘制顺序；已在边界时文档不变
    pub fn reorder(&mut self, id: &str, direction: Direction) {
        let mut document = self.elements().to_vec();
        if let Some(index) = document.iter().position(|e| e.id() == id) {
            match direction {
                Direction::Forward if index + 1 < document.len() => {
                    document.swap(index, index + 1)
                }
                Direction::Backward if index > 0 => document.swap(index, index - 1),
                _ => {}
            }
        }
        self.commit(document, "reorder");
    }

    /// 把元素对齐到固定位置；id 不存在时什么也不做
    pub fn align(&mut self, id: &str, alignment: Alignment) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        let document = self
            .elements()
            .iter()
            .cloned()
            .map(|mut e| {
                if e.id() == id {
                    alignment.apply(&mut e);
                }
                e
            })
            .collect();
        self.commit(document, "align");
        true
    }

    /// 撤销；选中的元素不再存在时清除选择
    pub fn undo(&mut self) -> bool {
        let moved = self.history_mut().undo().is_some();
        if moved {
            self.drop_stale_selection();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history_mut().redo().is_some();
        if moved {
            self.drop_stale_selection();
        }
        moved
    }

    fn drop_stale_selection(&mut self) {
        let gone = self
            .selected
            .as_deref()
            .is_some_and(|id| self.element(id).is_none());
        if gone {
            self.selected = None;
        }
    }

    // =========================================================
    // 导出与保存
    // =========================================================

    /// 把当前面渲染为位图，不改变状态
    pub fn export_raster(&self) -> Result<RasterImage> {
        self.export_raster_scaled(1.0)
    }

    /// 按倍率导出（高分屏下载用）
    pub fn export_raster_scaled(&self, scale: f32) -> Result<RasterImage> {
        raster::render(self.elements(), STAGE_WIDTH, STAGE_HEIGHT, scale)
    }

    pub fn to_saved(&self) -> SavedDesign {
        SavedDesign {
            front: self.front.current().clone(),
            back: self.back.current().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_saved())?)
    }

    /// 从保存的设计恢复；每面的文档成为历史第 0 个快照
    pub fn from_json(json: &str) -> Result<Self> {
        let saved: SavedDesign = serde_json::from_str(json)?;
        for (side, document) in [("front", &saved.front), ("back", &saved.back)] {
            let mut seen = HashSet::new();
            if let Some(dup) = document.iter().find(|e| !seen.insert(e.id())) {
                return Err(MeetolioError::invalid_input(format!(
                    "duplicate element id on {side}: {}",
                    dup.id()
                )));
            }
        }
        Ok(Self::from_documents(
            saved.front,
            saved.back,
            DEFAULT_HISTORY_LIMIT,
        ))
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

fn seed_text(
    id: &str,
    content: &str,
    y: f32,
    font_size: f32,
    color: HexColor,
    style: TextStyle,
) -> Element {
    Element::Text(TextElement {
        id: id.to_string(),
        content: content.to_string(),
        position: Point::new(200.0, y),
        font_size,
        font_family: DEFAULT_FONT_FAMILY.to_string(),
        color,
        width: 400.0,
        align: TextAlign::Center,
        style,
    })
}

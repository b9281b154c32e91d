//! 视觉属性
//!
//! 实体的样式数据：描边颜色、线宽、可选填充、不透明度、线型（虚线模式）。

use serde::{Deserialize, Serialize};

/// RGBA 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    /// 随层（实际颜色取自所属图层）
    #[serde(default)]
    pub by_layer: bool,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const GRAY: Color = Color::new(128, 128, 128);

    /// 随层颜色
    pub const BY_LAYER: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
        by_layer: true,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            a: 255,
            by_layer: false,
        }
    }

    pub const fn with_alpha(mut self, a: u8) -> Self {
        self.a = a;
        self
    }

    /// 从 0xRRGGBB 创建
    pub const fn from_hex(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    pub fn is_by_layer(&self) -> bool {
        self.by_layer
    }

    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BY_LAYER
    }
}

/// 线型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum LineType {
    /// 随层
    #[default]
    ByLayer,
    /// 实线
    Continuous,
    /// 虚线
    Dashed,
    /// 点线
    Dotted,
    /// 点划线
    DashDot,
    /// 自定义模式：交替的实/空段长度
    Custom(Vec<f64>),
}

impl LineType {
    /// 虚线模式（实/空段长度交替），实线返回空切片
    pub fn dash_pattern(&self) -> &[f64] {
        match self {
            LineType::ByLayer | LineType::Continuous => &[],
            LineType::Dashed => &[6.0, 3.0],
            LineType::Dotted => &[1.0, 2.0],
            LineType::DashDot => &[6.0, 2.0, 1.0, 2.0],
            LineType::Custom(pattern) => pattern,
        }
    }
}

/// 实体样式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    /// 描边颜色
    pub color: Color,
    /// 线宽，负值表示随层
    pub line_weight: f64,
    /// 填充颜色
    pub fill: Option<Color>,
    /// 不透明度 [0, 1]
    pub opacity: f64,
    /// 线型
    pub line_type: LineType,
}

impl Properties {
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_line_type(mut self, line_type: LineType) -> Self {
        self.line_type = line_type;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// 解析随层颜色
    pub fn effective_color(&self, layer_color: Color) -> Color {
        if self.color.is_by_layer() {
            layer_color
        } else {
            self.color
        }
    }

    /// 解析随层线宽
    pub fn effective_line_weight(&self, layer_weight: f64) -> f64 {
        if self.line_weight < 0.0 {
            layer_weight
        } else {
            self.line_weight
        }
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            color: Color::BY_LAYER,
            line_weight: -1.0,
            fill: None,
            opacity: 1.0,
            line_type: LineType::ByLayer,
        }
    }
}

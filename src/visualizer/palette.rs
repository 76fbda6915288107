use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_rgba_array(color: [u8; 4]) -> Self {
        Self::rgba(color[0], color[1], color[2], color[3])
    }

    pub fn is_opaque(self) -> bool {
        self.a == u8::MAX
    }
}

/// Visual role of a cell in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderCategory {
    Empty,
    Wall,
    Start,
    Goal,
    StartShadow,
    GoalShadow,
    Frontier,
    Visited,
    Path,
}

impl RenderCategory {
    pub const ALL: [RenderCategory; 9] = [
        RenderCategory::Empty,
        RenderCategory::Wall,
        RenderCategory::Start,
        RenderCategory::Goal,
        RenderCategory::StartShadow,
        RenderCategory::GoalShadow,
        RenderCategory::Frontier,
        RenderCategory::Visited,
        RenderCategory::Path,
    ];
}

/// Category to color table. Built once from settings and never mutated
/// while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub empty: Color,
    pub wall: Color,
    pub start: Color,
    pub goal: Color,
    pub start_shadow: Color,
    pub goal_shadow: Color,
    pub frontier: Color,
    pub visited: Color,
    pub path: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::BLACK,
            text: Color::WHITE,
            empty: Color::WHITE,
            wall: Color::BLACK,
            start: Color::rgba(0, 255, 0, 255),
            goal: Color::rgba(255, 0, 0, 255),
            start_shadow: Color::rgba(0, 255, 0, 125),
            goal_shadow: Color::rgba(255, 0, 0, 125),
            frontier: Color::rgba(0, 0, 255, 255),
            visited: Color::rgba(0, 255, 255, 255),
            path: Color::rgba(125, 125, 125, 255),
        }
    }
}

impl Palette {
    pub fn color(&self, category: RenderCategory) -> Color {
        match category {
            RenderCategory::Empty => self.empty,
            RenderCategory::Wall => self.wall,
            RenderCategory::Start => self.start,
            RenderCategory::Goal => self.goal,
            RenderCategory::StartShadow => self.start_shadow,
            RenderCategory::GoalShadow => self.goal_shadow,
            RenderCategory::Frontier => self.frontier,
            RenderCategory::Visited => self.visited,
            RenderCategory::Path => self.path,
        }
    }
}

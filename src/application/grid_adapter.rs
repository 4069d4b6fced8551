// Grid adapter - Responsive grid placement derived from a layout
use crate::domain::block::GridPosition;
use crate::domain::layout::DashboardLayout;
use crate::domain::template::MIN_BLOCK_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Lg,
    Md,
    Sm,
    Xs,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 4] = [Breakpoint::Lg, Breakpoint::Md, Breakpoint::Sm, Breakpoint::Xs];

    pub fn cols(&self) -> u32 {
        match self {
            Breakpoint::Lg => 12,
            Breakpoint::Md => 8,
            Breakpoint::Sm => 6,
            Breakpoint::Xs => 4,
        }
    }

    /// Smallest viewport width, in pixels, the breakpoint applies to.
    pub fn min_width_px(&self) -> u32 {
        match self {
            Breakpoint::Lg => 1200,
            Breakpoint::Md => 996,
            Breakpoint::Sm => 768,
            Breakpoint::Xs => 480,
        }
    }

    pub fn stacks_single_column(&self) -> bool {
        matches!(self, Breakpoint::Sm | Breakpoint::Xs)
    }

    /// Only the large breakpoint is the stored layout; the rest are derived.
    pub fn is_canonical(&self) -> bool {
        *self == Breakpoint::Lg
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Lg => "lg",
            Breakpoint::Md => "md",
            Breakpoint::Sm => "sm",
            Breakpoint::Xs => "xs",
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Breakpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Breakpoint::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| format!("unknown breakpoint `{}`", s))
    }
}

/// One entry of a grid-layout item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default = "default_min_w")]
    pub min_w: u32,
    #[serde(default = "default_min_h")]
    pub min_h: u32,
}

fn default_min_w() -> u32 {
    MIN_BLOCK_SIZE.w
}

fn default_min_h() -> u32 {
    MIN_BLOCK_SIZE.h
}

impl GridItem {
    pub fn new(id: impl Into<String>, position: GridPosition) -> Self {
        Self {
            i: id.into(),
            x: position.x,
            y: position.y,
            w: position.w,
            h: position.h,
            min_w: MIN_BLOCK_SIZE.w,
            min_h: MIN_BLOCK_SIZE.h,
        }
    }

    pub fn position(&self) -> GridPosition {
        GridPosition::new(self.x, self.y, self.w, self.h)
    }
}

/// Column count and viewport threshold the client needs to pick a breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointInfo {
    pub name: Breakpoint,
    pub cols: u32,
    pub min_width: u32,
}

impl From<Breakpoint> for BreakpointInfo {
    fn from(breakpoint: Breakpoint) -> Self {
        Self {
            name: breakpoint,
            cols: breakpoint.cols(),
            min_width: breakpoint.min_width_px(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsiveGrid {
    pub breakpoints: Vec<BreakpointInfo>,
    pub lg: Vec<GridItem>,
    pub md: Vec<GridItem>,
    pub sm: Vec<GridItem>,
    pub xs: Vec<GridItem>,
}

pub fn derive_items(layout: &DashboardLayout, breakpoint: Breakpoint) -> Vec<GridItem> {
    let cols = breakpoint.cols();

    if breakpoint.stacks_single_column() {
        let mut next_y = 0;
        return layout
            .blocks
            .iter()
            .map(|block| {
                let position = GridPosition::new(0, next_y, cols, block.position.h);
                next_y += block.position.h;
                GridItem::new(block.id(), position)
            })
            .collect();
    }

    layout
        .blocks
        .iter()
        .map(|block| {
            let p = block.position;
            let w = p.w.min(cols);
            GridItem::new(block.id(), GridPosition::new(p.x.min(cols - w), p.y, w, p.h))
        })
        .collect()
}

pub fn derive_responsive(layout: &DashboardLayout) -> ResponsiveGrid {
    ResponsiveGrid {
        breakpoints: Breakpoint::ALL.into_iter().map(BreakpointInfo::from).collect(),
        lg: derive_items(layout, Breakpoint::Lg),
        md: derive_items(layout, Breakpoint::Md),
        sm: derive_items(layout, Breakpoint::Sm),
        xs: derive_items(layout, Breakpoint::Xs),
    }
}

/// Layout-change events worth writing back into the editor. Non-canonical
/// breakpoints yield `None`.
pub fn writeback(breakpoint: Breakpoint, items: Vec<GridItem>) -> Option<Vec<GridItem>> {
    if breakpoint.is_canonical() {
        Some(items)
    } else {
        tracing::debug!(%breakpoint, "ignoring layout change from derived breakpoint");
        None
    }
}

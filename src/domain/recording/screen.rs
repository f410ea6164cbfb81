//! Monitors and the part of the X screen a session records

use std::fmt;

use thiserror::Error;

/// `screenIndex` value that records every monitor at once
pub const ALL_SCREENS: u32 = 0;

/// Rectangle in root window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Region {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Overlap with `bounds`, `None` when they do not touch
    pub fn clamp_to(&self, bounds: &Region) -> Option<Region> {
        let left = i32::from(self.x).max(i32::from(bounds.x));
        let top = i32::from(self.y).max(i32::from(bounds.y));
        let right = (i32::from(self.x) + i32::from(self.width))
            .min(i32::from(bounds.x) + i32::from(bounds.width));
        let bottom = (i32::from(self.y) + i32::from(self.height))
            .min(i32::from(bounds.y) + i32::from(bounds.height));
        if right <= left || bottom <= top {
            return None;
        }
        Some(Region {
            x: i16::try_from(left).ok()?,
            y: i16::try_from(top).ok()?,
            width: u16::try_from(right - left).ok()?,
            height: u16::try_from(bottom - top).ok()?,
        })
    }
}

/// One monitor, numbered from 1 in server order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub index: u32,
    pub name: String,
    pub region: Region,
    pub primary: bool,
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.region;
        write!(
            f,
            "Screen {}: {}x{} at ({},{})",
            self.index, r.width, r.height, r.x, r.y
        )?;
        if !self.name.is_empty() {
            write!(f, " [{}]", self.name)?;
        }
        if self.primary {
            write!(f, " (primary)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid screen index {index}. Available screens: 1-{available} (0 records all of them)")]
pub struct InvalidScreen {
    pub index: u32,
    pub available: usize,
}

/// Area to grab for `index`.
///
/// `0` is the whole root window. A monitor reaching past the root window is
/// cut to it.
pub fn select_region(monitors: &[Monitor], root: Region, index: u32) -> Result<Region, InvalidScreen> {
    if index == ALL_SCREENS {
        return Ok(root);
    }
    let invalid = || InvalidScreen {
        index,
        available: monitors.len(),
    };
    let monitor = monitors.iter().find(|m| m.index == index).ok_or_else(invalid)?;
    monitor.region.clamp_to(&root).ok_or_else(invalid)
}

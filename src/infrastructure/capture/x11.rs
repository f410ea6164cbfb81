//! X11 screen grabber

use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::{ConnectionExt as _, ImageFormat, ImageOrder, Window};
use x11rb::rust_connection::RustConnection;

use crate::application::ports::{CaptureError, Frame, FrameSource};
use crate::domain::recording::{select_region, Monitor, Region};

/// Connection to `$DISPLAY` and its default screen
struct X11Display {
    conn: RustConnection,
    screen_num: usize,
    root: Window,
    root_region: Region,
}

impl X11Display {
    fn open() -> Result<Self, CaptureError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| CaptureError::DisplayUnavailable(e.to_string()))?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| CaptureError::DisplayUnavailable(format!("no screen {}", screen_num)))?;
        let root = screen.root;
        let root_region = Region::new(0, 0, screen.width_in_pixels, screen.height_in_pixels);
        Ok(Self {
            conn,
            screen_num,
            root,
            root_region,
        })
    }

    /// Only 32 bits-per-pixel little-endian images are supported, which is
    /// what every 24/32-bit depth X server uses. The bytes are then BGRX.
    fn check_pixel_format(&self) -> Result<(), CaptureError> {
        let setup = self.conn.setup();
        let depth = setup.roots[self.screen_num].root_depth;
        let bits_per_pixel = setup
            .pixmap_formats
            .iter()
            .find(|format| format.depth == depth)
            .map(|format| format.bits_per_pixel);
        if bits_per_pixel != Some(32) || setup.image_byte_order != ImageOrder::LSB_FIRST {
            return Err(CaptureError::DisplayUnavailable(format!(
                "unsupported screen format: depth {}, {:?} bits per pixel",
                depth, bits_per_pixel
            )));
        }
        Ok(())
    }

    /// RandR monitors, or the root window as a single monitor without RandR
    fn monitors(&self) -> Vec<Monitor> {
        match self.randr_monitors() {
            Ok(monitors) if !monitors.is_empty() => monitors,
            Ok(_) => {
                debug!("RandR reports no monitors, using the root window");
                vec![self.root_monitor()]
            }
            Err(e) => {
                debug!("RandR unavailable ({}), using the root window", e);
                vec![self.root_monitor()]
            }
        }
    }

    fn randr_monitors(&self) -> Result<Vec<Monitor>, ReplyError> {
        let reply = self.conn.randr_get_monitors(self.root, true)?.reply()?;
        let mut monitors = Vec::with_capacity(reply.monitors.len());
        for (position, info) in reply.monitors.iter().enumerate() {
            let name = self
                .conn
                .get_atom_name(info.name)?
                .reply()
                .map(|atom| String::from_utf8_lossy(&atom.name).into_owned())
                .unwrap_or_default();
            monitors.push(Monitor {
                index: position as u32 + 1,
                name,
                region: Region::new(info.x, info.y, info.width, info.height),
                primary: info.primary,
            });
        }
        Ok(monitors)
    }

    fn root_monitor(&self) -> Monitor {
        Monitor {
            index: 1,
            name: String::new(),
            region: self.root_region,
            primary: true,
        }
    }
}

/// Monitors of `$DISPLAY`
pub fn list_monitors() -> Result<Vec<Monitor>, CaptureError> {
    Ok(X11Display::open()?.monitors())
}

/// Grabs one monitor, or the whole X11 screen, with `GetImage`
pub struct X11FrameSource {
    conn: RustConnection,
    root: Window,
    region: Region,
}

impl X11FrameSource {
    /// Connect to `$DISPLAY` and check that monitor `screen` exists
    pub fn connect(screen: u32) -> Result<Self, CaptureError> {
        let x11 = X11Display::open()?;
        x11.check_pixel_format()?;

        let monitors = x11.monitors();
        let region = select_region(&monitors, x11.root_region, screen)?;
        info!(
            "Capturing X11 screen {} area {}x{}+{}+{}",
            x11.screen_num, region.width, region.height, region.x, region.y
        );

        Ok(Self {
            conn: x11.conn,
            root: x11.root,
            region,
        })
    }
}

impl FrameSource for X11FrameSource {
    fn dimensions(&self) -> (u32, u32) {
        (u32::from(self.region.width), u32::from(self.region.height))
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        let Region { x, y, width, height } = self.region;
        let reply = self
            .conn
            .get_image(ImageFormat::Z_PIXMAP, self.root, x, y, width, height, !0)
            .map_err(|e| CaptureError::GrabFailed(e.to_string()))?
            .reply()
            .map_err(|e| CaptureError::GrabFailed(e.to_string()))?;

        let frame = Frame {
            width: u32::from(width),
            height: u32::from(height),
            data: reply.data,
        };
        if !frame.is_well_formed() {
            return Err(CaptureError::FrameSize {
                expected: Frame::expected_len(frame.width, frame.height),
                actual: frame.data.len(),
            });
        }
        Ok(frame)
    }
}

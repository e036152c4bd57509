//! EWMH plumbing
//!
//! Interned atoms, desktop-number properties and the client-message side
//! of window activation.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

/// `_NET_WM_DESKTOP` value meaning the window is visible on all desktops.
pub const ALL_DESKTOPS: i64 = 0xFFFF_FFFF;

/// Desktop number standing in for a failed or absent property read.
pub const UNKNOWN_DESKTOP: i64 = -1;

/// Holds all interned atoms used by the daemon
#[derive(Debug)]
pub struct Atoms {
    pub net_active_window: Atom,
    pub net_current_desktop: Atom,
    pub net_wm_desktop: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        // Helper to intern a single atom
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_current_desktop: intern("_NET_CURRENT_DESKTOP")?,
            net_wm_desktop: intern("_NET_WM_DESKTOP")?,
        })
    }

    /// Desktop a window sits on (`_NET_WM_DESKTOP`), or [`UNKNOWN_DESKTOP`]
    pub fn window_desktop<C: Connection>(&self, conn: &C, window: Window) -> i64 {
        read_cardinal(conn, window, self.net_wm_desktop)
    }

    /// The active desktop (`_NET_CURRENT_DESKTOP` on the root), or
    /// [`UNKNOWN_DESKTOP`]
    pub fn current_desktop<C: Connection>(&self, conn: &C, root: Window) -> i64 {
        read_cardinal(conn, root, self.net_current_desktop)
    }
}

/// Read a single CARDINAL property value; any failure folds into
/// [`UNKNOWN_DESKTOP`].
fn read_cardinal<C: Connection>(conn: &C, window: Window, property: Atom) -> i64 {
    let reply = match conn.get_property(false, window, property, AtomEnum::CARDINAL, 0, 1) {
        Ok(cookie) => match cookie.reply() {
            Ok(reply) => reply,
            Err(_) => return UNKNOWN_DESKTOP,
        },
        Err(_) => return UNKNOWN_DESKTOP,
    };

    reply
        .value32()
        .and_then(|mut values| values.next())
        .map(i64::from)
        .unwrap_or(UNKNOWN_DESKTOP)
}

/// Whether a window on `window_desktop` is visible while `current_desktop`
/// is the active one.
///
/// Unknown (`-1`) on either side never matches: a failed read skips
/// activation instead of stealing focus on a desktop the user cannot see.
pub fn visible_on_current(window_desktop: i64, current_desktop: i64) -> bool {
    if window_desktop == ALL_DESKTOPS {
        return true;
    }
    if window_desktop == UNKNOWN_DESKTOP || current_desktop == UNKNOWN_DESKTOP {
        return false;
    }
    window_desktop == current_desktop
}

/// Send a format-32 client message addressed to `window`, delivered to the
/// root window so the window manager picks it up.
pub fn send_client_message<C: Connection>(
    conn: &C,
    root: Window,
    window: Window,
    message_type: Atom,
    data: [u32; 5],
) -> Result<()> {
    let event = ClientMessageEvent::new(32, window, message_type, data);
    conn.send_event(
        false,
        root,
        EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
        &event,
    )?;
    conn.flush()?;
    Ok(())
}

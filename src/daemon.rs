//! Core daemon logic
//!
//! Owns the event loop: waits for structure notifications on the root
//! window, classifies freshly mapped windows and activates the ones that
//! belong to the target application.

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::classify::{self, ClassHint, WindowTree};
use crate::ewmh::{self, Atoms};
use crate::seen::SeenWindows;
use crate::xerror::{ErrorAction, ErrorPolicy};

/// WM_CLASS class name of the application whose windows get activated.
pub const TARGET_CLASS: &str = "Roxterm";

/// A window-system notification, reduced to what the daemon acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A window became viewable.
    Mapped(Window),
    /// A window ceased to exist.
    Destroyed(Window),
    /// Anything else.
    Other,
}

impl Notification {
    fn from_event(event: &Event) -> Self {
        match event {
            Event::MapNotify(e) => Self::Mapped(e.window),
            Event::DestroyNotify(e) => Self::Destroyed(e.window),
            _ => Self::Other,
        }
    }
}

/// The windowing-system surface the decision logic consumes.
///
/// Narrow by design so tests can drive the daemon with a scripted fake
/// instead of a live display connection.
pub trait WindowSystem: WindowTree {
    /// Desktop the window sits on, or [`ewmh::UNKNOWN_DESKTOP`].
    fn window_desktop(&self, window: Window) -> i64;

    /// The active desktop, or [`ewmh::UNKNOWN_DESKTOP`].
    fn current_desktop(&self) -> i64;

    /// Best-effort activation: EWMH message plus raise-and-map.
    fn activate(&self, window: Window);

    /// Subscribe to the window's destruction notification.
    fn watch_destroy(&self, window: Window);
}

/// Decision state: which windows were already activated.
pub struct Daemon {
    target_class: String,
    seen: SeenWindows,
}

impl Daemon {
    pub fn new(target_class: &str) -> Self {
        Self {
            target_class: target_class.to_owned(),
            seen: SeenWindows::new(),
        }
    }

    /// Dispatch one notification. Runs to completion before the caller
    /// fetches the next one.
    pub fn handle<S: WindowSystem>(&mut self, session: &S, notification: Notification) {
        match notification {
            Notification::Mapped(mapped) => self.on_mapped(session, mapped),
            Notification::Destroyed(window) => self.seen.forget(window),
            Notification::Other => {}
        }
    }

    fn on_mapped<S: WindowSystem>(&mut self, session: &S, mapped: Window) {
        let Some(target) = classify::find_target_window(session, mapped, &self.target_class)
        else {
            return;
        };
        if self.seen.contains(target) {
            return;
        }

        let current = session.current_desktop();
        let desktop = session.window_desktop(target);
        debug!("window {target:#x}: desktop {desktop}, current desktop {current}");
        if !ewmh::visible_on_current(desktop, current) {
            return;
        }

        self.seen.record(target);
        session.watch_destroy(target);
        info!("found {} window {target:#x}, activating", self.target_class);
        session.activate(target);
    }
}

/// Live [`WindowSystem`] backed by the X connection.
struct XSession<'a> {
    conn: &'a RustConnection,
    atoms: &'a Atoms,
    root: Window,
}

impl WindowTree for XSession<'_> {
    fn class_hint(&self, window: Window) -> Option<ClassHint> {
        let reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 256)
            .ok()?
            .reply()
            .ok()?;
        if reply.value.is_empty() {
            return None;
        }
        ClassHint::parse(&reply.value)
    }

    fn children(&self, window: Window) -> Vec<Window> {
        match self.conn.query_tree(window) {
            Ok(cookie) => match cookie.reply() {
                Ok(reply) => reply.children,
                Err(_) => Vec::new(),
            },
            Err(_) => Vec::new(),
        }
    }
}

impl WindowSystem for XSession<'_> {
    fn window_desktop(&self, window: Window) -> i64 {
        self.atoms.window_desktop(self.conn, window)
    }

    fn current_desktop(&self) -> i64 {
        self.atoms.current_desktop(self.conn, self.root)
    }

    fn activate(&self, window: Window) {
        // Two independent best-effort signals: the EWMH request to the
        // window manager, and a direct raise-and-map.
        if let Err(e) = ewmh::send_client_message(
            self.conn,
            self.root,
            window,
            self.atoms.net_active_window,
            [0; 5],
        ) {
            warn!("cannot send _NET_ACTIVE_WINDOW for window {window:#x}: {e}");
        }
        if let Err(e) = self.raise_and_map(window) {
            warn!("cannot raise window {window:#x}: {e}");
        }
    }

    fn watch_destroy(&self, window: Window) {
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY);
        if let Err(e) = self.conn.change_window_attributes(window, &aux) {
            debug!("cannot watch window {window:#x} for destruction: {e}");
        }
    }
}

impl XSession<'_> {
    fn raise_and_map(&self, window: Window) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        self.conn.map_window(window)?;
        self.conn.flush()?;
        Ok(())
    }
}

/// Connect to the X server, register for structure notifications on the
/// root window and process notifications forever.
pub fn run() -> Result<()> {
    let (conn, screen_num) = RustConnection::connect(None).context("cannot open X display")?;
    let root = conn.setup().roots[screen_num].root;
    info!("connected to X server, screen {screen_num}");

    let atoms = Atoms::new(&conn)?;
    let errors = ErrorPolicy::with_defaults();

    // Learn about newly mapped toplevels.
    conn.change_window_attributes(
        root,
        &ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_NOTIFY),
    )?
    .check()
    .context("cannot select SubstructureNotify on the root window")?;
    conn.flush()?;

    let session = XSession {
        conn: &conn,
        atoms: &atoms,
        root,
    };
    let mut daemon = Daemon::new(TARGET_CLASS);
    info!("watching for new {TARGET_CLASS} windows");

    loop {
        let event = conn.wait_for_event()?;

        if let Event::Error(error) = &event {
            match errors.decide(error) {
                ErrorAction::Ignore => {
                    debug!(
                        "ignoring {:?} error for resource {:#x}",
                        error.error_kind, error.bad_value
                    );
                    continue;
                }
                ErrorAction::Fatal => bail!("unhandled X11 error: {error:?}"),
            }
        }

        daemon.handle(&session, Notification::from_event(&event));
    }
}

use std::{collections::HashSet, sync::Arc};

use anyhow::Result;
use sysinfo::System;
use tracing::instrument;
use xcb::{
    x::{self, Atom, GrabServer, InternAtom, UngrabServer, Window, ATOM_ANY},
    Connection, Xid,
};

use super::{processes::running_process_names, SnapshotProvider};

fn get_active_window_atom(conn: &Connection) -> Result<Atom> {
    let reply = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name: b"_NET_ACTIVE_WINDOW",
    }))?;
    Ok(reply.atom())
}

fn get_net_wm_name_atom(conn: &Connection) -> Result<Atom> {
    let reply = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name: b"_NET_WM_NAME",
    }))?;
    Ok(reply.atom())
}

fn get_active_window(
    conn: &Connection,
    root: &Window,
    active_window_atom: Atom,
) -> Result<Option<Window>> {
    let result = conn.wait_for_reply(conn.send_request(&x::GetProperty {
        delete: false,
        window: *root,
        property: active_window_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    // The property holds the none window when nothing has focus yet.
    Ok(result
        .value::<Window>()
        .first()
        .copied()
        .filter(|window| window.resource_id() != 0))
}

fn get_name(conn: &Connection, window: Window, wm_name_atom: Atom) -> Result<String> {
    let wm_name = conn.wait_for_reply(conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: wm_name_atom,
        r#type: x::ATOM_ANY,
        long_offset: 0,
        long_length: 1024,
    }))?;
    Ok(String::from_utf8_lossy(wm_name.value()).into_owned())
}

pub struct X11SnapshotProvider {
    connection: Connection,
    preferred_screen: i32,
    active_window_atom: Atom,
    window_name_atom: Atom,
    system: System,
}

impl X11SnapshotProvider {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = xcb::Connection::connect(None)?;
        let active_window_atom = get_active_window_atom(&connection)?;
        let window_name_atom = get_net_wm_name_atom(&connection)?;
        Ok(Self {
            connection,
            preferred_screen,
            active_window_atom,
            window_name_atom,
            system: System::new(),
        })
    }

    #[instrument(skip(self))]
    fn get_title_inner(&self) -> Result<Option<Arc<str>>> {
        let setup = self.connection.get_setup();

        // Currently the application only supports 1 x11 screen.
        let root = setup
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .unwrap()
            .root();

        let Some(active_window) =
            get_active_window(&self.connection, &root, self.active_window_atom)?
        else {
            return Ok(None);
        };
        let title = get_name(&self.connection, active_window, self.window_name_atom)?;
        if title.is_empty() {
            return Ok(None);
        }
        Ok(Some(title.into()))
    }
}

impl SnapshotProvider for X11SnapshotProvider {
    #[instrument(skip(self))]
    fn process_names(&mut self) -> Result<HashSet<Arc<str>>> {
        Ok(running_process_names(&mut self.system))
    }

    #[instrument(skip(self))]
    fn active_window_title(&mut self) -> Result<Option<Arc<str>>> {
        assert!(self.preferred_screen >= 0);

        let _ = self.connection.send_request(&GrabServer {});

        let result = self.get_title_inner();
        let _ = self.connection.send_request(&UngrabServer {});
        result
    }
}

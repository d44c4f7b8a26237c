/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use sg_types::auth::Username;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ServerTaskStage {
    Created,
    Preparing,
    Connecting,
    Connected,
    Replying,
    Relaying,
    Finished,
}

impl ServerTaskStage {
    pub(crate) fn brief(&self) -> &'static str {
        match self {
            ServerTaskStage::Created => "Created",
            ServerTaskStage::Preparing => "Preparing",
            ServerTaskStage::Connecting => "Connecting",
            ServerTaskStage::Connected => "Connected",
            ServerTaskStage::Replying => "Replying",
            ServerTaskStage::Relaying => "Relaying",
            ServerTaskStage::Finished => "Finished",
        }
    }
}

/// server task notes is bounded to a single client connection,
/// and there is only one task on each connection.
pub(crate) struct ServerTaskNotes {
    client_addr: SocketAddr,
    server_addr: SocketAddr,
    pub(crate) stage: ServerTaskStage,
    pub(crate) start_at: DateTime<Utc>,
    create_ins: Instant,
    pub(crate) id: Uuid,
    user: Option<Username>,
}

impl ServerTaskNotes {
    pub(crate) fn new(client_addr: SocketAddr, server_addr: SocketAddr) -> Self {
        ServerTaskNotes {
            client_addr,
            server_addr,
            stage: ServerTaskStage::Created,
            start_at: Utc::now(),
            create_ins: Instant::now(),
            id: Uuid::new_v4(),
            user: None,
        }
    }

    #[inline]
    pub(crate) fn client_addr(&self) -> SocketAddr {
        self.client_addr
    }

    #[inline]
    pub(crate) fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub(crate) fn set_user(&mut self, user: Username) {
        self.user = Some(user);
    }

    pub(crate) fn raw_user_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.as_original())
    }

    #[inline]
    pub(crate) fn time_elapsed(&self) -> Duration {
        self.create_ins.elapsed()
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use slog::{Record, Serializer, Value};
use uuid::Uuid;

use sg_types::net::{ProxyEndpoint, UpstreamAddr};

pub(crate) struct LtUuid<'a>(pub(crate) &'a Uuid);

impl Value for LtUuid<'_> {
    fn serialize(
        &self,
        _record: &Record,
        key: slog::Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result {
        serializer.emit_arguments(key, &format_args!("{}", self.0.simple()))
    }
}

pub(crate) struct LtDateTime<'a>(pub(crate) &'a DateTime<Utc>);

impl Value for LtDateTime<'_> {
    fn serialize(
        &self,
        _record: &Record,
        key: slog::Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result {
        let s = self.0.to_rfc3339_opts(SecondsFormat::Micros, true);
        serializer.emit_str(key, &s)
    }
}

pub(crate) struct LtDuration(pub(crate) Duration);

impl Value for LtDuration {
    fn serialize(
        &self,
        _record: &Record,
        key: slog::Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result {
        if self.0.is_zero() {
            serializer.emit_none(key)
        } else {
            serializer.emit_arguments(key, &format_args!("{:.3?}", self.0))
        }
    }
}

pub(crate) struct LtUpstreamAddr<'a>(pub(crate) &'a UpstreamAddr);

impl Value for LtUpstreamAddr<'_> {
    fn serialize(
        &self,
        _record: &Record,
        key: slog::Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result {
        serializer.emit_arguments(key, &format_args!("{}", self.0))
    }
}

/// Only the address and the username, the password is never logged.
pub(crate) struct LtProxyEndpoint<'a>(pub(crate) &'a ProxyEndpoint);

impl Value for LtProxyEndpoint<'_> {
    fn serialize(
        &self,
        _record: &Record,
        key: slog::Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result {
        serializer.emit_arguments(key, &format_args!("{}", self.0))
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use slog::{Logger, slog_info, slog_o};

use sg_stdlog::AsyncLogConfig;
use sg_types::net::{ProxyEndpoint, UpstreamAddr};

use super::types::{LtDateTime, LtDuration, LtProxyEndpoint, LtUpstreamAddr, LtUuid};
use crate::serve::{ServerTaskError, ServerTaskNotes};

const TASK_LOG_THREAD_NAME: &str = "log-task";

/// The task log is written to stdout, separated from the process log.
pub(crate) fn get_logger() -> Logger {
    let async_conf = AsyncLogConfig::with_name(TASK_LOG_THREAD_NAME);
    let drain = sg_stdlog::new_async_logger(&async_conf, false, true);
    let drain = slog::IgnoreResult::new(drain);
    let common_values = slog_o!(
        "log_type" => super::LOG_TYPE_TASK,
        "pid" => std::process::id(),
    );
    Logger::root(drain, common_values)
}

pub(crate) struct TaskLogForHttpProxy<'a> {
    pub(crate) logger: &'a Logger,
    pub(crate) task_notes: &'a ServerTaskNotes,
    pub(crate) task_type: &'static str,
    pub(crate) upstream: Option<&'a UpstreamAddr>,
    pub(crate) proxy: Option<&'a ProxyEndpoint>,
    pub(crate) proxy_bound: Option<&'a UpstreamAddr>,
    pub(crate) clt_to_ups_bytes: u64,
    pub(crate) ups_to_clt_bytes: u64,
}

impl TaskLogForHttpProxy<'_> {
    pub(crate) fn log(&self, e: &ServerTaskError) {
        slog_info!(self.logger, "{}", e;
            "task_type" => self.task_type,
            "task_id" => LtUuid(&self.task_notes.id),
            "stage" => self.task_notes.stage.brief(),
            "start_at" => LtDateTime(&self.task_notes.start_at),
            "user" => self.task_notes.raw_user_name(),
            "server_addr" => self.task_notes.server_addr(),
            "client_addr" => self.task_notes.client_addr(),
            "upstream" => self.upstream.map(LtUpstreamAddr),
            "proxy" => self.proxy.map(LtProxyEndpoint),
            "proxy_bound_addr" => self.proxy_bound.map(LtUpstreamAddr),
            "total_time" => LtDuration(self.task_notes.time_elapsed()),
            "c_to_u_bytes" => self.clt_to_ups_bytes,
            "u_to_c_bytes" => self.ups_to_clt_bytes,
            "reason" => e.brief(),
        )
    }
}

//! Endpoint paths consumed by the stores, relative to the client's base URL

use std::fmt::Display;

pub const FLOWS: &str = "/flows";
pub const PUBLIC_FLOWS: &str = "/flows/public";
pub const EXECUTIONS: &str = "/executions";
pub const EXECUTION_STATS: &str = "/executions/stats";

pub fn flow(id: impl Display) -> String {
    format!("/flows/{}", id)
}

pub fn flow_clone(id: impl Display) -> String {
    format!("/flows/{}/clone", id)
}

pub fn flow_stats(id: impl Display) -> String {
    format!("/flows/{}/stats", id)
}

pub fn flow_inputs(id: impl Display) -> String {
    format!("/flows/{}/inputs", id)
}

pub fn flow_execute(id: impl Display) -> String {
    format!("/flows/{}/execute", id)
}

pub fn execution_response(id: impl Display) -> String {
    format!("/executions/{}/response", id)
}

pub fn execution_cancel(id: impl Display) -> String {
    format!("/executions/{}/cancel", id)
}

pub fn execution_reexecute(id: impl Display) -> String {
    format!("/executions/{}/reexecute", id)
}

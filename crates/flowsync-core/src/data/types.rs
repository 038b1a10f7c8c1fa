//! Basic types shared by the stores

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use flowsync_interfaces::QueryParams;

/// Pagination metadata returned alongside a listed page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, alias = "pageSize", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filter and pagination parameters for execution listings.
///
/// Parameters are forwarded to the transport exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionQuery {
    params: QueryParams,
}

impl ExecutionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flow_id(self, flow_id: impl fmt::Display) -> Self {
        self.param("flowId", flow_id)
    }

    pub fn status(self, status: impl fmt::Display) -> Self {
        self.param("status", status)
    }

    pub fn page(self, page: u64) -> Self {
        self.param("page", page)
    }

    pub fn limit(self, limit: u64) -> Self {
        self.param("limit", limit)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }
}

impl From<QueryParams> for ExecutionQuery {
    fn from(params: QueryParams) -> Self {
        Self { params }
    }
}

/// Every remote operation a store performs.
///
/// Each carries the user-facing message shown when nothing more specific
/// can be extracted from a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListFlows,
    GetFlow,
    CreateFlow,
    UpdateFlow,
    DeleteFlow,
    CloneFlow,
    FlowStats,
    FlowInputs,
    ExecuteFlow,
    PublicFlows,
    ListExecutions,
    GetExecution,
    CancelExecution,
    ReexecuteFlow,
    ExecutionStats,
}

impl Operation {
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::ListFlows => "Erro ao buscar fluxos",
            Operation::GetFlow => "Erro ao buscar fluxo",
            Operation::CreateFlow => "Erro ao criar fluxo",
            Operation::UpdateFlow => "Erro ao atualizar fluxo",
            Operation::DeleteFlow => "Erro ao deletar fluxo",
            Operation::CloneFlow => "Erro ao clonar fluxo",
            Operation::FlowStats | Operation::ExecutionStats => "Erro ao buscar estatísticas",
            Operation::FlowInputs => "Erro ao buscar inputs do fluxo",
            Operation::ExecuteFlow => "Erro ao executar fluxo",
            Operation::PublicFlows => "Erro ao buscar fluxos públicos",
            Operation::ListExecutions => "Erro ao buscar execuções",
            Operation::GetExecution => "Erro ao buscar execução",
            Operation::CancelExecution => "Erro ao cancelar execução",
            Operation::ReexecuteFlow => "Erro ao reexecutar fluxo",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListFlows => "list_flows",
            Operation::GetFlow => "get_flow",
            Operation::CreateFlow => "create_flow",
            Operation::UpdateFlow => "update_flow",
            Operation::DeleteFlow => "delete_flow",
            Operation::CloneFlow => "clone_flow",
            Operation::FlowStats => "get_flow_stats",
            Operation::FlowInputs => "get_flow_inputs",
            Operation::ExecuteFlow => "execute_flow",
            Operation::PublicFlows => "get_public_flows",
            Operation::ListExecutions => "list_executions",
            Operation::GetExecution => "get_execution",
            Operation::CancelExecution => "cancel_execution",
            Operation::ReexecuteFlow => "reexecute_flow",
            Operation::ExecutionStats => "get_execution_stats",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_accepts_page_size_alias() {
        let pagination: Pagination =
            serde_json::from_value(json!({"total": 42, "page": 2, "pageSize": 10, "hasMore": true})).unwrap();

        assert_eq!(pagination.total, Some(42));
        assert_eq!(pagination.limit, Some(10));
        assert_eq!(pagination.extra.get("hasMore"), Some(&json!(true)));
    }

    #[test]
    fn test_query_builder_keeps_params_verbatim() {
        let query = ExecutionQuery::new().flow_id("f1").status("failed").page(3).param("sort", "-createdAt");

        let params: Vec<(&str, &str)> = query.params().iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            params,
            vec![("flowId", "f1"), ("page", "3"), ("sort", "-createdAt"), ("status", "failed")]
        );
    }

    #[test]
    fn test_stats_operations_share_fallback() {
        assert_eq!(Operation::FlowStats.fallback_message(), Operation::ExecutionStats.fallback_message());
        assert_ne!(Operation::GetFlow.fallback_message(), Operation::ListFlows.fallback_message());
    }
}

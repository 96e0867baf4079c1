//! Saving, loading and running workflows.
//!
//! A draft is created on first save and updated afterwards. When an update
//! fails, the workflow is created anew once and the new id is adopted, so a
//! stale or deleted record never blocks the user from saving.
//!
//! Running always saves first and then executes the id that save returned.

use crate::api::WorkflowApi;
use crate::error::ClientError;
use crate::status::BrokerStatus;
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use trading_maven_core::{ExecutionId, WorkflowId};
use trading_maven_workflow::{ExecutionConsole, NodeCatalog, Workflow, WorkflowRecord};

/// Save and execute sequencing on top of a [`WorkflowApi`].
pub struct WorkflowPersistence<A: ?Sized> {
    api: Arc<A>,
}

impl<A: ?Sized> Clone for WorkflowPersistence<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<A> WorkflowPersistence<A>
where
    A: WorkflowApi + ?Sized,
{
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Saves the workflow and returns its backend id.
    ///
    /// # Errors
    ///
    /// Returns an error if create fails, or if both the update and the
    /// fallback create fail. An unauthenticated update is not retried. The
    /// workflow's id is unchanged on error.
    #[instrument(skip_all, fields(workflow = %workflow.name))]
    pub async fn save(
        &self,
        workflow: &mut Workflow,
        console: &mut ExecutionConsole,
    ) -> Result<WorkflowId, Report<ClientError>> {
        let payload = workflow.to_payload();

        let saved = match workflow.server_id() {
            None => self.api.create_workflow(&payload).await,
            Some(id) => match self.api.update_workflow(id, &payload).await {
                Ok(record) => Ok(record),
                // A create would fail the same way without a session
                Err(e) if *e.current_context() == ClientError::NotAuthenticated => Err(e),
                Err(e) => {
                    warn!(workflow_id = %id, error = %e, "update failed, creating instead");
                    console.warn(format!(
                        "Could not update workflow {id} ({}), saving as a new workflow",
                        e.current_context()
                    ));
                    self.api.create_workflow(&payload).await
                }
            },
        };

        let record: WorkflowRecord = match saved {
            Ok(record) => record,
            Err(e) => {
                console.error(format!("Save failed: {}", e.current_context()));
                return Err(e);
            }
        };

        workflow.adopt_server_id(record.id);
        console.success(format!(
            "Workflow saved (id {}, {} nodes, {} connections)",
            record.id,
            payload.nodes.len(),
            payload.connections.len()
        ));
        Ok(record.id)
    }

    /// Saves the workflow, then starts an execution of it.
    ///
    /// Nothing is sent when the broker is disconnected.
    ///
    /// # Errors
    ///
    /// Returns `BrokerDisconnected` without any network call, or the error of
    /// the failing save or execute step.
    #[instrument(skip_all, fields(workflow = %workflow.name, test_mode = test_mode))]
    pub async fn execute(
        &self,
        workflow: &mut Workflow,
        console: &mut ExecutionConsole,
        broker: &BrokerStatus,
        test_mode: bool,
    ) -> Result<ExecutionId, Report<ClientError>> {
        if !broker.is_connected() {
            console.error("Connect an MT5 account before running a workflow");
            return Err(ClientError::BrokerDisconnected.into());
        }

        let workflow_id = self.save(workflow, console).await?;

        let response = match self.api.execute_workflow(workflow_id, test_mode).await {
            Ok(response) => response,
            Err(e) => {
                console.error(format!("Execution failed: {}", e.current_context()));
                return Err(e);
            }
        };

        info!(
            workflow_id = %workflow_id,
            execution_id = %response.execution_id,
            "execution started"
        );
        let started = format!(
            "Execution {} started for workflow {workflow_id}",
            response.execution_id
        );
        match &response.status {
            Some(status) => console.success(format!("{started} ({status})")),
            None => console.success(started),
        }
        Ok(response.execution_id)
    }

    /// Loads a saved workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot produce the workflow.
    #[instrument(skip(self, catalog), fields(workflow_id = %id))]
    pub async fn load(
        &self,
        catalog: &NodeCatalog,
        id: WorkflowId,
    ) -> Result<Workflow, Report<ClientError>> {
        let record = self.api.get_workflow(id).await?;
        Ok(Workflow::from_record(catalog, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExecuteResponse, MtAccount};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use trading_maven_workflow::{
        ConsoleLevel, NodeTypesResponse, ParamValue, Position, WorkflowEditor, WorkflowPayload,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create,
        Update(WorkflowId),
        Execute(WorkflowId, bool),
        Get(WorkflowId),
    }

    struct MockApi {
        calls: Mutex<Vec<Call>>,
        payloads: Mutex<Vec<WorkflowPayload>>,
        next_id: AtomicI64,
        fail_update: AtomicBool,
        fail_create: AtomicBool,
        fail_execute: AtomicBool,
        signed_out: AtomicBool,
    }

    impl MockApi {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                payloads: Mutex::new(Vec::new()),
                next_id: AtomicI64::new(1),
                fail_update: AtomicBool::new(false),
                fail_create: AtomicBool::new(false),
                fail_execute: AtomicBool::new(false),
                signed_out: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().expect("lock").clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().expect("lock").push(call);
        }

        fn saved(&self, id: WorkflowId, payload: &WorkflowPayload) -> WorkflowRecord {
            self.payloads.lock().expect("lock").push(payload.clone());
            WorkflowRecord {
                id,
                name: payload.name.clone(),
                description: payload.description.clone(),
                nodes: payload.nodes.clone(),
                connections: payload.connections.clone(),
                trigger_type: Some("manual".to_string()),
                is_active: Some(true),
            }
        }
    }

    #[async_trait]
    impl WorkflowApi for MockApi {
        async fn fetch_node_types(&self) -> Result<NodeTypesResponse, Report<ClientError>> {
            Err(ClientError::Transport {
                details: "offline".to_string(),
            }
            .into())
        }

        async fn get_workflow(&self, id: WorkflowId) -> Result<WorkflowRecord, Report<ClientError>> {
            self.record(Call::Get(id));
            let payloads = self.payloads.lock().expect("lock");
            let last = payloads.last().cloned().ok_or(ClientError::Backend {
                status: 404,
                detail: "Workflow not found".to_string(),
            })?;
            drop(payloads);
            Ok(self.saved(id, &last))
        }

        async fn create_workflow(
            &self,
            payload: &WorkflowPayload,
        ) -> Result<WorkflowRecord, Report<ClientError>> {
            self.record(Call::Create);
            if self.signed_out.load(Ordering::SeqCst) {
                return Err(ClientError::NotAuthenticated.into());
            }
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(ClientError::Backend {
                    status: 500,
                    detail: "Failed to create workflow".to_string(),
                }
                .into());
            }
            let id = WorkflowId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            Ok(self.saved(id, payload))
        }

        async fn update_workflow(
            &self,
            id: WorkflowId,
            payload: &WorkflowPayload,
        ) -> Result<WorkflowRecord, Report<ClientError>> {
            self.record(Call::Update(id));
            if self.signed_out.load(Ordering::SeqCst) {
                return Err(ClientError::NotAuthenticated.into());
            }
            if self.fail_update.load(Ordering::SeqCst) {
                return Err(ClientError::Backend {
                    status: 404,
                    detail: "Workflow not found".to_string(),
                }
                .into());
            }
            Ok(self.saved(id, payload))
        }

        async fn execute_workflow(
            &self,
            id: WorkflowId,
            test_mode: bool,
        ) -> Result<ExecuteResponse, Report<ClientError>> {
            self.record(Call::Execute(id, test_mode));
            if self.fail_execute.load(Ordering::SeqCst) {
                return Err(ClientError::Backend {
                    status: 500,
                    detail: "Execution failed: engine offline".to_string(),
                }
                .into());
            }
            Ok(ExecuteResponse {
                execution_id: ExecutionId::new(id.get() * 10),
                status: Some("running".to_string()),
                message: None,
            })
        }

        async fn list_mt5_accounts(&self) -> Result<Vec<MtAccount>, Report<ClientError>> {
            Ok(Vec::new())
        }
    }

    fn setup() -> (Arc<MockApi>, WorkflowPersistence<MockApi>) {
        let api = Arc::new(MockApi::new());
        (api.clone(), WorkflowPersistence::new(api))
    }

    fn last_level(console: &ExecutionConsole) -> Option<ConsoleLevel> {
        console.last().map(|e| e.level)
    }

    #[tokio::test]
    async fn first_save_creates_and_adopts_id() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("draft");
        let mut console = ExecutionConsole::new();

        let id = persistence.save(&mut workflow, &mut console).await.expect("save");

        assert_eq!(workflow.server_id(), Some(id));
        assert_eq!(api.calls(), vec![Call::Create]);
        assert_eq!(last_level(&console), Some(ConsoleLevel::Success));

        let again = persistence.save(&mut workflow, &mut console).await.expect("save");
        assert_eq!(again, id);
        assert_eq!(api.calls(), vec![Call::Create, Call::Update(id)]);
    }

    #[tokio::test]
    async fn stale_id_falls_back_to_one_create() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("stale");
        workflow.adopt_server_id(WorkflowId::new(999));
        let mut console = ExecutionConsole::new();
        api.fail_update.store(true, Ordering::SeqCst);

        let id = persistence.save(&mut workflow, &mut console).await.expect("save");

        assert_ne!(id, WorkflowId::new(999));
        assert_eq!(workflow.server_id(), Some(id));
        assert_eq!(api.calls(), vec![Call::Update(WorkflowId::new(999)), Call::Create]);

        let levels: Vec<ConsoleLevel> = console.entries().map(|e| e.level).collect();
        assert_eq!(levels, vec![ConsoleLevel::Warn, ConsoleLevel::Success]);
    }

    #[tokio::test]
    async fn failed_fallback_keeps_old_id() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("stale");
        workflow.adopt_server_id(WorkflowId::new(5));
        let mut console = ExecutionConsole::new();
        api.fail_update.store(true, Ordering::SeqCst);
        api.fail_create.store(true, Ordering::SeqCst);

        let err = persistence.save(&mut workflow, &mut console).await.unwrap_err();

        assert!(matches!(err.current_context(), ClientError::Backend { status: 500, .. }));
        assert_eq!(workflow.server_id(), Some(WorkflowId::new(5)));
        assert_eq!(api.calls().len(), 2);
        assert_eq!(last_level(&console), Some(ConsoleLevel::Error));
    }

    #[tokio::test]
    async fn unauthenticated_update_is_not_retried_as_create() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("signed out");
        workflow.adopt_server_id(WorkflowId::new(8));
        let mut console = ExecutionConsole::new();
        api.signed_out.store(true, Ordering::SeqCst);

        let err = persistence.save(&mut workflow, &mut console).await.unwrap_err();

        assert_eq!(err.current_context(), &ClientError::NotAuthenticated);
        assert_eq!(api.calls(), vec![Call::Update(WorkflowId::new(8))]);
        assert_eq!(workflow.server_id(), Some(WorkflowId::new(8)));
        let levels: Vec<ConsoleLevel> = console.entries().map(|e| e.level).collect();
        assert_eq!(levels, vec![ConsoleLevel::Error]);
    }

    #[tokio::test]
    async fn disconnected_broker_makes_no_calls() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("offline");
        let mut console = ExecutionConsole::new();

        let err = persistence
            .execute(&mut workflow, &mut console, &BrokerStatus::fixed(false), false)
            .await
            .unwrap_err();

        assert_eq!(err.current_context(), &ClientError::BrokerDisconnected);
        assert!(api.calls().is_empty());
        assert!(workflow.is_draft());
        assert_eq!(last_level(&console), Some(ConsoleLevel::Error));
    }

    #[tokio::test]
    async fn execute_saves_first_then_runs_saved_id() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("run");
        let mut console = ExecutionConsole::new();

        let execution = persistence
            .execute(&mut workflow, &mut console, &BrokerStatus::fixed(true), true)
            .await
            .expect("execute");

        let saved = workflow.server_id().expect("saved");
        assert_eq!(api.calls(), vec![Call::Create, Call::Execute(saved, true)]);
        assert_eq!(execution, ExecutionId::new(saved.get() * 10));
    }

    #[tokio::test]
    async fn execute_after_fallback_runs_new_id() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("run");
        workflow.adopt_server_id(WorkflowId::new(77));
        let mut console = ExecutionConsole::new();
        api.fail_update.store(true, Ordering::SeqCst);

        persistence
            .execute(&mut workflow, &mut console, &BrokerStatus::fixed(true), false)
            .await
            .expect("execute");

        let new_id = workflow.server_id().expect("saved");
        assert_ne!(new_id, WorkflowId::new(77));
        assert_eq!(
            api.calls(),
            vec![
                Call::Update(WorkflowId::new(77)),
                Call::Create,
                Call::Execute(new_id, false)
            ]
        );
    }

    #[tokio::test]
    async fn failed_execute_reports_error() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("run");
        let mut console = ExecutionConsole::new();
        api.fail_execute.store(true, Ordering::SeqCst);

        let err = persistence
            .execute(&mut workflow, &mut console, &BrokerStatus::fixed(true), false)
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &ClientError::Backend {
                status: 500,
                detail: "Execution failed: engine offline".to_string()
            }
        );
        let last = console.last().expect("entry");
        assert_eq!(last.level, ConsoleLevel::Error);
        assert!(last.message.contains("engine offline"));
    }

    #[tokio::test]
    async fn failed_save_skips_execute() {
        let (api, persistence) = setup();
        let mut workflow = Workflow::new("run");
        let mut console = ExecutionConsole::new();
        api.fail_create.store(true, Ordering::SeqCst);

        assert!(
            persistence
                .execute(&mut workflow, &mut console, &BrokerStatus::fixed(true), false)
                .await
                .is_err()
        );
        assert_eq!(api.calls(), vec![Call::Create]);
    }

    #[tokio::test]
    async fn quick_buy_bot() {
        let (api, persistence) = setup();
        let mut editor = WorkflowEditor::new(NodeCatalog::fallback(), Workflow::new("Quick BUY Bot"));

        let trigger = editor.drop_node("ManualTrigger", Position::new(180.0, 130.0));
        let order = editor.drop_node("MarketOrder", Position::new(480.0, 130.0));
        editor.connect_handles(&trigger, &order).expect("connect");
        editor.click_node(&order).expect("select");
        editor.edit_selected_config("symbol", "EURUSD").expect("symbol");
        editor.edit_selected_config("order_type", "BUY").expect("order_type");
        editor.edit_selected_config("volume", "0.01").expect("volume");

        let (workflow, console) = editor.split_mut();
        let created = persistence.save(workflow, console).await.expect("save");
        let execution = persistence
            .execute(workflow, console, &BrokerStatus::fixed(true), false)
            .await
            .expect("execute");

        assert_eq!(
            api.calls(),
            vec![
                Call::Create,
                Call::Update(created),
                Call::Execute(created, false)
            ]
        );
        assert_eq!(execution, ExecutionId::new(created.get() * 10));
        assert_eq!(last_level(editor.console()), Some(ConsoleLevel::Success));

        let payloads = api.payloads.lock().expect("lock");
        let sent = payloads.last().expect("payload");
        assert_eq!(sent.nodes.len(), 2);
        assert_eq!(sent.connections.len(), 1);
        let order_node = sent
            .nodes
            .iter()
            .find(|n| n.type_id == "MarketOrder")
            .expect("order");
        assert_eq!(order_node.data["symbol"], "EURUSD");
        assert_eq!(order_node.data["order_type"], "BUY");
        assert_eq!(order_node.data["volume"], "0.01");
    }

    #[tokio::test]
    async fn load_rebuilds_saved_workflow() {
        let (_api, persistence) = setup();
        let catalog = NodeCatalog::fallback();
        let mut workflow = Workflow::new("roundtrip");
        let a = workflow
            .graph
            .add_node(&catalog, "ManualTrigger", Position::default(), "Manual Trigger");
        let b = workflow
            .graph
            .add_node(&catalog, "MarketOrder", Position::new(10.0, 0.0), "Market Order");
        workflow.graph.connect(&a, &b).expect("connect");
        workflow
            .graph
            .update_node_config(&catalog, &b, "volume", ParamValue::Number(0.2))
            .expect("volume");
        let mut console = ExecutionConsole::new();
        let id = persistence.save(&mut workflow, &mut console).await.expect("save");

        let loaded = persistence.load(&catalog, id).await.expect("load");

        assert_eq!(loaded.server_id(), Some(id));
        assert_eq!(loaded.graph.node_count(), 2);
        assert_eq!(loaded.graph.edge_count(), 1);
        assert_eq!(
            loaded.graph.get_node(&b).and_then(|n| n.config.get("volume")),
            Some(&ParamValue::Number(0.2))
        );
    }
}

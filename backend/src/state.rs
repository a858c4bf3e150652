use crate::gateway::ContractGateway;
use crate::notice::NoticeBoard;
use crate::pipeline::ClaimPipeline;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ClaimPipeline>,
    pub gateway: Arc<ContractGateway>,
    pub notices: Arc<NoticeBoard>,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<ClaimPipeline>,
        gateway: Arc<ContractGateway>,
        notices: Arc<NoticeBoard>,
        api_key: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            pipeline,
            gateway,
            notices,
            api_key: api_key.into(),
        }
    }
}

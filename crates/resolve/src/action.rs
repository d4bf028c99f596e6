use crate::resolver::Resolver;
use async_trait::async_trait;
use modsmith_core::Result;
use modsmith_task::{Action, Execution, Task};
use std::sync::Arc;
use tracing::Level;

/// Task action running the resolution loop
pub struct ResolveMissingModules {
    resolver: Arc<Resolver>,
}

impl ResolveMissingModules {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }

    pub fn task(resolver: Arc<Resolver>) -> Task {
        Task::leaf("Resolve missing modules", Self::new(resolver))
    }
}

#[async_trait]
impl Action for ResolveMissingModules {
    async fn execute(&self, execution: &mut Execution) -> Result<()> {
        let resolution = self.resolver.resolve().await?;
        for module in &resolution.fetched {
            execution.print(
                Level::INFO,
                format!("{} <- {}", module.module, module.uri),
            );
        }
        execution.print(
            Level::INFO,
            format!(
                "{} module(s) declared, {} fetched in {} round(s)",
                resolution.declared.len(),
                resolution.fetched.len(),
                resolution.rounds
            ),
        );
        Ok(())
    }
}

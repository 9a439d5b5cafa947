use crate::actions::ActionRunner;
use crate::assembler::ResultAssembler;
use crate::browser::BrowserSession;
use crate::core::config::ExtractionConfig;
use crate::core::{BrowserTrait, Config, PageSession};
use crate::errors::{ControlError, Result};
use crate::runtime::VariableStore;
use crate::types::{ControlRequest, Output};
use tracing::{info, info_span, warn, Instrument};

/// Drives a whole request: launch a session, run the actions, extract, tear down.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `request` on a fresh session of `browser`.
    ///
    /// The request timeout covers launch, actions and extraction. When it expires the pending
    /// operation is dropped, the session is closed and `Timeout` is returned without partial
    /// results.
    pub async fn run<B: BrowserTrait>(
        &self,
        browser: B,
        request: &ControlRequest,
    ) -> Result<Output> {
        request.validate()?;

        let run_id = uuid::Uuid::new_v4();
        let span = info_span!("run", %run_id);

        async move {
            let timeout = request.timeout(&self.config.session);
            let deadline = tokio::time::Instant::now()
                .checked_add(timeout)
                .ok_or_else(|| {
                    ControlError::InvalidRequest(format!(
                        "timeoutSeconds {} is out of range",
                        timeout.as_secs()
                    ))
                })?;
            let options = request.extraction_options(&self.config.extraction);

            info!(
                actions = request.actions.len(),
                selectors = request.selectors.len(),
                timeout_secs = timeout.as_secs(),
                "starting run"
            );

            let mut session = tokio::time::timeout_at(
                deadline,
                BrowserSession::new(browser, self.config.clone()),
            )
            .await
            .map_err(|_| ControlError::Timeout(timeout.as_secs()))??;

            let outcome =
                tokio::time::timeout_at(deadline, Self::drive(&session, request, options)).await;

            let closed = session.close().await;

            match outcome {
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "run timed out");
                    Err(ControlError::Timeout(timeout.as_secs()))
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "run failed");
                    Err(e)
                }
                Ok(Ok(output)) => {
                    closed?;
                    info!("run finished");
                    Ok(output)
                }
            }
        }
        .instrument(span)
        .await
    }

    #[cfg(feature = "chrome")]
    pub async fn run_chrome(&self, request: &ControlRequest) -> Result<Output> {
        self.run(crate::browser::ChromeBrowser::new(), request).await
    }

    async fn drive<S: PageSession + ?Sized>(
        session: &S,
        request: &ControlRequest,
        options: ExtractionConfig,
    ) -> Result<Output> {
        let mut store = VariableStore::new();
        ActionRunner::run(session, &request.actions, &mut store).await?;
        ResultAssembler::new(options)
            .assemble(session, &request.selectors, store)
            .await
    }
}

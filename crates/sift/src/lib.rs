//! 🧺 sift: streaming mappers and reducers for a map/reduce harness.
//!
//! Each process plays one [`Role`]. Mappers read stdin, keep the records worth
//! keeping, and write `key \t value` lines to stdout. Reducers read what the
//! mappers wrote and upsert it into a remote attribute store, retrying with a
//! linear backoff and giving up on a record (loudly) rather than on the run.

pub mod app_config;
pub mod backends;
pub mod credentials;
pub mod diagnostics;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod retry;
pub mod roles;
pub mod store;
pub mod transforms;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::app_config::{AppConfig, OutputConfig};
use crate::backends::{AttributeStoreSink, ItemLayout, LineSink, SinkBackend, SourceBackend};
use crate::diagnostics::DiagnosticsChannel;
use crate::pipeline::Pipeline;
use crate::retry::RetryPolicy;
use crate::store::StoreBackend;
use crate::transforms::{ExtractorBackend, Projector};

pub use crate::report::RunReport;
pub use crate::roles::{MapRole, ReduceRole, Role};

/// 🚀 Wire up the pipeline for `role` from config and run it to exhaustion.
///
/// Diagnostics go to stderr. Errors returned from here are fatal: unreadable input,
/// unwritable output, or a store that would not hand over its domain.
pub async fn run(app_config: AppConfig, role: Role) -> Result<RunReport> {
    debug!("🔧 {role} with {app_config:#?}");

    let extractor = ExtractorBackend::from_role(role, &app_config.mapper)?;
    let projector = Projector::new(app_config.mapper.escape_mode);
    let sink = build_sink(&app_config, role).await?;
    // -- sink first: a reducer whose store is down should fail before touching stdin
    let source = SourceBackend::from_config(&app_config.input, role.read_mode()).await?;

    Pipeline::new(
        role,
        source,
        extractor,
        projector,
        sink,
        DiagnosticsChannel::stderr(),
    )
    .run()
    .await
    .with_context(|| format!("💀 The {role} run did not make it to the end of its input"))
}

async fn build_sink(app_config: &AppConfig, role: Role) -> Result<SinkBackend> {
    let layout = match role {
        Role::Map(_) => {
            return Ok(match &app_config.output {
                OutputConfig::Stdout => SinkBackend::Stdout(LineSink::stdout()),
                OutputConfig::File(file_config) => {
                    SinkBackend::File(LineSink::create(&file_config.file_name).await?)
                }
            });
        }
        Role::Reduce(ReduceRole::Counts) => ItemLayout::CountWithPlaceholder {
            placeholder: app_config.store.placeholder_name.clone(),
        },
        Role::Reduce(ReduceRole::Names) => ItemLayout::NameById,
    };

    let Some(backend_config) = &app_config.store.backend else {
        bail!(
            "💀 {role} needs somewhere to write, and [store.backend] is empty. \
             Configure an Http endpoint, or InMemory for a dry run."
        );
    };
    let store = StoreBackend::from_config(backend_config)?;
    let sink = AttributeStoreSink::new(
        store,
        app_config.store.domain.as_str(),
        layout,
        RetryPolicy::from(&app_config.retry),
    )
    .await?;
    Ok(SinkBackend::AttributeStore(sink))
}
